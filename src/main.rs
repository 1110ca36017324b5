//! HastaIO - UDP tracking bridge daemon
//!
//! Binds the configured listening ports, then runs a fixed-rate consumer
//! loop standing in for the rendering/physics tick: every iteration
//! advances the smoothing filters and periodically logs each track's
//! position and the ingest counters.

use std::env;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use hasta_io::{AppConfig, Error, Result, Session};

/// Consumer tick interval (~60 Hz, a typical frame rate)
const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// How often to log positions and ingest counters
const STATS_INTERVAL: Duration = Duration::from_secs(5);

/// Parse config path from command line arguments.
///
/// Supports:
/// - `hasta-io <path>` (positional)
/// - `hasta-io --config <path>` (flag-based)
/// - `hasta-io -c <path>` (short flag)
///
/// Defaults to `hastaio.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    "hastaio.toml".to_string()
}

fn main() -> Result<()> {
    let config_path = parse_config_path();

    let config = if Path::new(&config_path).exists() {
        AppConfig::from_file(&config_path)?
    } else {
        AppConfig::dual_hand_defaults()
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.clone()),
    )
    .init();

    log::info!("HastaIO v{} starting...", env!("CARGO_PKG_VERSION"));
    if Path::new(&config_path).exists() {
        log::info!("Using config: {}", config_path);
    } else {
        log::info!(
            "Config {} not found, using built-in dual-hand defaults",
            config_path
        );
    }

    let mut session = Session::new(&config)?;
    log::info!(
        "Tracking {} point(s) on {} port(s)",
        session.track_ids().len(),
        session.stats().len()
    );

    // Set up shutdown signal handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);

    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Config(format!("error setting Ctrl-C handler: {}", e)))?;

    log::info!("HastaIO running. Press Ctrl-C to stop.");

    // Consumer tick loop - stands in for the per-frame rendering loop
    let mut last_stats = Instant::now();

    while running.load(Ordering::Relaxed) {
        session.advance_all();

        if last_stats.elapsed() >= STATS_INTERVAL {
            log_status(&session);
            last_stats = Instant::now();
        }

        if !session.is_healthy() {
            log::error!("An ingest loop stopped unexpectedly, shutting down");
            break;
        }

        std::thread::sleep(TICK_INTERVAL);
    }

    log::info!("Shutting down...");
    session.shutdown();
    log::info!("HastaIO stopped");
    Ok(())
}

/// Log each track's current position and the per-port ingest counters.
fn log_status(session: &Session) {
    for id in session.track_ids() {
        if let Some(pos) = session.position_of(id) {
            log::info!("{}: ({:.3}, {:.3}, {:.3})", id, pos.x, pos.y, pos.z);
        }
    }
    for (port, stats) in session.stats() {
        log::info!(
            "port {}: datagrams={} decode_errors={} receive_errors={}",
            port,
            stats.datagrams(),
            stats.decode_errors(),
            stats.receive_errors()
        );
    }
}
