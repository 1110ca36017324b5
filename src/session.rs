//! Session orchestration: track points plus their ingest loops.
//!
//! A [`Session`] owns everything with a lifetime: the shared track points
//! and one [`UdpIngestLoop`] per configured port. The consumer drives it
//! from its own loop, once per tick:
//!
//! ```no_run
//! use hasta_io::{AppConfig, Session};
//!
//! let mut session = Session::new(&AppConfig::dual_hand_defaults())?;
//! loop {
//!     session.advance_all();
//!     let left = session.position_of("left");
//!     // hand `left` to the scene graph / physics step
//!     # break;
//! }
//! session.shutdown();
//! # Ok::<(), hasta_io::Error>(())
//! ```

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::ingest::{IngestStats, UdpIngestLoop};
use crate::track::TrackPoint;
use crate::types::Vec3;

/// A running tracking session.
pub struct Session {
    points: Vec<Arc<TrackPoint>>,
    loops: Vec<UdpIngestLoop>,
}

impl Session {
    /// Validate `config`, seed the track points, and bind every listener.
    ///
    /// Configuration errors surface before any socket is bound. A bind
    /// failure fails construction; loops bound earlier in the same call are
    /// torn down on the way out.
    pub fn new(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let points: Vec<Arc<TrackPoint>> = config
            .tracks
            .iter()
            .map(|track| {
                Arc::new(TrackPoint::new(
                    track.id.clone(),
                    track.mapping.clone(),
                    config.smoothing_for(track),
                    track.initial,
                ))
            })
            .collect();

        let mut loops = Vec::with_capacity(config.listeners.len());
        for listener in &config.listeners {
            // Validation guarantees every referenced id resolves
            let destinations: Vec<Arc<TrackPoint>> = listener
                .tracks
                .iter()
                .filter_map(|id| points.iter().find(|p| p.id() == id.as_str()))
                .cloned()
                .collect();

            loops.push(UdpIngestLoop::spawn(
                listener.port,
                listener.mode,
                destinations,
            )?);
        }

        for track in &config.tracks {
            if !config
                .listeners
                .iter()
                .any(|l| l.tracks.iter().any(|id| id == &track.id))
            {
                log::warn!(
                    "track {:?} is not fed by any listener and will hold its initial placement",
                    track.id
                );
            }
        }

        Ok(Self { points, loops })
    }

    /// Run one smoothing step for every track point.
    ///
    /// Called once per consumer tick. Never blocks and performs no I/O.
    pub fn advance_all(&self) {
        for point in &self.points {
            point.advance();
        }
    }

    /// Current (smoothed) position of a track point, or `None` for an
    /// unknown id. Stable within a tick once `advance_all` has run.
    pub fn position_of(&self, track_id: &str) -> Option<Vec3> {
        self.points
            .iter()
            .find(|p| p.id() == track_id)
            .map(|p| p.position())
    }

    /// Ids of all track points, in configuration order.
    pub fn track_ids(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.id()).collect()
    }

    /// Ingest counters per listening port.
    pub fn stats(&self) -> Vec<(u16, Arc<IngestStats>)> {
        self.loops.iter().map(|l| (l.port(), l.stats())).collect()
    }

    /// True while every ingest loop is alive and usable.
    pub fn is_healthy(&self) -> bool {
        self.loops.iter().all(|l| l.is_listening())
    }

    /// Tear down all ingest loops. Idempotent; after the call no receiver
    /// thread is running and every bound port is released.
    pub fn shutdown(&mut self) {
        for ingest in &mut self.loops {
            ingest.shutdown();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}
