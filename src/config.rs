//! Configuration for the HastaIO bridge.
//!
//! Loaded from a TOML file. All validation happens in
//! [`AppConfig::validate`] before any socket is bound: a bad smoothing
//! factor or a dangling track reference fails session construction outright
//! instead of being clamped or ignored.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::mapping::MappingConfig;
use crate::types::{TrackMode, Vec3};

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Session-wide smoothing default
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Listening ports, one ingest loop each
    #[serde(default, rename = "listener")]
    pub listeners: Vec<ListenerConfig>,
    /// Tracked entities
    #[serde(default, rename = "track")]
    pub tracks: Vec<TrackConfig>,
}

/// Session-wide smoothing default, overridable per track
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmoothingConfig {
    /// Per-tick interpolation weight in [0, 1]; 1 snaps instantly
    #[serde(default = "default_smoothing")]
    pub factor: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            factor: default_smoothing(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// One listening port and the track points its datagrams feed
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenerConfig {
    /// UDP port to bind (wildcard address, any source accepted)
    pub port: u16,
    /// Payload arity expected on this port
    pub mode: TrackMode,
    /// Destination track ids in payload order: in dual mode the first
    /// `|`-segment always feeds the first id listed here
    pub tracks: Vec<String>,
}

/// One tracked entity and its calibration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackConfig {
    /// Stable label (e.g. "left", "right")
    pub id: String,
    /// Coordinate mapping applied to every raw triple
    #[serde(flatten)]
    pub mapping: MappingConfig,
    /// Starting placement; seeds current and target so the first packet
    /// smooths from here instead of jumping
    #[serde(default)]
    pub initial: Vec3,
    /// Optional per-track smoothing override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoothing: Option<f32>,
}

fn default_smoothing() -> f32 {
    0.5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("serialization failed: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Default configuration for a dual-hand tracker on one port
    ///
    /// Suitable for testing and development. Production deployments should
    /// use a proper TOML configuration file.
    pub fn dual_hand_defaults() -> Self {
        Self {
            smoothing: SmoothingConfig::default(),
            logging: LoggingConfig::default(),
            listeners: vec![ListenerConfig {
                port: 5005,
                mode: TrackMode::Dual,
                tracks: vec!["left".to_string(), "right".to_string()],
            }],
            tracks: vec![
                TrackConfig {
                    id: "left".to_string(),
                    mapping: MappingConfig {
                        scale: 10.0,
                        ..Default::default()
                    },
                    initial: Vec3::new(-0.5, 1.0, 0.0),
                    smoothing: None,
                },
                TrackConfig {
                    id: "right".to_string(),
                    mapping: MappingConfig {
                        scale: 10.0,
                        ..Default::default()
                    },
                    initial: Vec3::new(0.5, 1.0, 0.0),
                    smoothing: None,
                },
            ],
        }
    }

    /// Effective smoothing factor for one track
    pub fn smoothing_for(&self, track: &TrackConfig) -> f32 {
        track.smoothing.unwrap_or(self.smoothing.factor)
    }

    /// Check the whole configuration, before any socket is bound.
    ///
    /// Fails fast on the first problem found; nothing is ever silently
    /// clamped or defaulted away.
    pub fn validate(&self) -> Result<()> {
        validate_factor(self.smoothing.factor, "smoothing.factor")?;

        if self.listeners.is_empty() {
            return Err(Error::Config("no [[listener]] configured".to_string()));
        }

        for track in &self.tracks {
            if let Some(factor) = track.smoothing {
                validate_factor(factor, &format!("track {:?} smoothing", track.id))?;
            }
        }

        let mut seen_ids = Vec::new();
        for track in &self.tracks {
            if seen_ids.contains(&track.id.as_str()) {
                return Err(Error::Config(format!(
                    "track id {:?} defined more than once",
                    track.id
                )));
            }
            seen_ids.push(track.id.as_str());
        }

        let mut fed_ids: Vec<&str> = Vec::new();
        for listener in &self.listeners {
            if listener.port == 0 {
                return Err(Error::Config(
                    "listener port must be in 1..=65535".to_string(),
                ));
            }

            let expected = listener.mode.point_count();
            if listener.tracks.len() != expected {
                return Err(Error::Config(format!(
                    "listener on port {} is {:?} mode and needs {} track id(s), got {}",
                    listener.port,
                    listener.mode,
                    expected,
                    listener.tracks.len()
                )));
            }

            for id in &listener.tracks {
                if !seen_ids.contains(&id.as_str()) {
                    return Err(Error::Config(format!(
                        "listener on port {} references undefined track {:?}",
                        listener.port, id
                    )));
                }
                // One writer per target: a track may be fed by one port only
                if fed_ids.contains(&id.as_str()) {
                    return Err(Error::Config(format!(
                        "track {:?} is fed by more than one listener",
                        id
                    )));
                }
                fed_ids.push(id.as_str());
            }
        }

        Ok(())
    }
}

fn validate_factor(factor: f32, what: &str) -> Result<()> {
    if !(0.0..=1.0).contains(&factor) {
        return Err(Error::Config(format!(
            "{} must be in [0, 1], got {}",
            what, factor
        )));
    }
    Ok(())
}
