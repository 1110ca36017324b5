//! UDP ingest loop: one bound socket, one background thread.
//!
//! The loop blocks on the socket (with a short read timeout so the shutdown
//! flag is observed in bounded time), decodes each datagram, maps the
//! triples through each destination track's calibration, and publishes the
//! results as new target positions.
//!
//! # Error policy
//!
//! Malformed datagrams and transient receive failures never cross the loop
//! boundary: the datagram is dropped, the failure is counted and logged, and
//! the loop keeps going. Only a socket that keeps failing is treated as
//! unusable, which stops the loop and raises the failed flag.
//!
//! # Shutdown
//!
//! Cooperative: clear the running flag, poke the socket awake with an empty
//! datagram, join the thread. Safe to call from any thread, idempotent, and
//! bounded by the socket read timeout even if the wakeup datagram is lost.

use std::net::{Ipv4Addr, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::codec;
use crate::error::{Error, Result};
use crate::track::TrackPoint;
use crate::types::TrackMode;

/// Largest accepted datagram. Valid payloads are a few dozen bytes of text;
/// anything near this size is garbage but must not break the receive call.
const MAX_DATAGRAM_SIZE: usize = 2048;

/// Socket read timeout. Bounds how long shutdown can take when the wakeup
/// datagram is lost, and how often an idle loop rechecks the running flag.
const READ_TIMEOUT: Duration = Duration::from_millis(250);

/// Consecutive receive failures after which the socket is declared unusable.
const MAX_CONSECUTIVE_RECEIVE_ERRORS: u32 = 8;

/// Counters updated by the ingest thread, read by anyone.
#[derive(Debug, Default)]
pub struct IngestStats {
    datagrams: AtomicU64,
    decode_errors: AtomicU64,
    receive_errors: AtomicU64,
}

impl IngestStats {
    /// Datagrams received (well-formed or not).
    pub fn datagrams(&self) -> u64 {
        self.datagrams.load(Ordering::Relaxed)
    }

    /// Datagrams dropped because their payload failed to decode.
    pub fn decode_errors(&self) -> u64 {
        self.decode_errors.load(Ordering::Relaxed)
    }

    /// Socket-level receive failures (excluding read timeouts).
    pub fn receive_errors(&self) -> u64 {
        self.receive_errors.load(Ordering::Relaxed)
    }
}

/// Handle to one listening port and its background receive thread.
///
/// State machine: `Stopped -> Listening -> Stopped` (terminal). Construction
/// via [`UdpIngestLoop::spawn`] performs the bind and the transition to
/// `Listening`; [`UdpIngestLoop::shutdown`] (or drop) is the only way back.
pub struct UdpIngestLoop {
    port: u16,
    running: Arc<AtomicBool>,
    failed: Arc<AtomicBool>,
    stats: Arc<IngestStats>,
    handle: Option<JoinHandle<()>>,
}

impl UdpIngestLoop {
    /// Bind `port` on the wildcard address and start the receive thread.
    ///
    /// `points` are the destinations for decoded triples, in payload order:
    /// dual mode routes segment 0 to `points[0]` and segment 1 to
    /// `points[1]`, by position only. The caller must supply exactly as many
    /// points as the mode decodes.
    pub fn spawn(port: u16, mode: TrackMode, points: Vec<Arc<TrackPoint>>) -> Result<Self> {
        if points.len() != mode.point_count() {
            return Err(Error::Config(format!(
                "listener on port {} needs {} track point(s), got {}",
                port,
                mode.point_count(),
                points.len()
            )));
        }

        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))
            .map_err(|source| Error::Bind { port, source })?;
        socket.set_read_timeout(Some(READ_TIMEOUT))?;

        let running = Arc::new(AtomicBool::new(true));
        let failed = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(IngestStats::default());

        let thread_running = Arc::clone(&running);
        let thread_failed = Arc::clone(&failed);
        let thread_stats = Arc::clone(&stats);

        let handle = std::thread::Builder::new()
            .name(format!("udp-ingest-{}", port))
            .spawn(move || {
                receive_loop(
                    socket,
                    port,
                    mode,
                    points,
                    thread_running,
                    thread_failed,
                    thread_stats,
                );
            })?;

        log::info!("UDP ingest listening on port {} ({:?} mode)", port, mode);

        Ok(Self {
            port,
            running,
            failed,
            stats,
            handle: Some(handle),
        })
    }

    /// Listening port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Ingest counters for this port.
    pub fn stats(&self) -> Arc<IngestStats> {
        Arc::clone(&self.stats)
    }

    /// True while the receive thread is alive and the socket is usable.
    pub fn is_listening(&self) -> bool {
        self.running.load(Ordering::Relaxed)
            && !self.failed.load(Ordering::Relaxed)
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// True if the loop stopped because its socket became unusable.
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Relaxed)
    }

    /// Stop the receive thread and release the socket.
    ///
    /// Idempotent: a second call, or a call after the loop already stopped,
    /// returns immediately. Never blocks longer than the socket read
    /// timeout plus the time to drain one datagram.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::Relaxed);

        let Some(handle) = self.handle.take() else {
            return;
        };

        // Poke the blocking receive awake; if this fails the read timeout
        // still bounds the join
        if let Ok(waker) = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)) {
            let _ = waker.send_to(&[], (Ipv4Addr::LOCALHOST, self.port));
        }

        if handle.join().is_err() {
            log::error!("UDP ingest thread for port {} panicked", self.port);
        }
    }
}

impl Drop for UdpIngestLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Receive cycle run on the ingest thread.
fn receive_loop(
    socket: UdpSocket,
    port: u16,
    mode: TrackMode,
    points: Vec<Arc<TrackPoint>>,
    running: Arc<AtomicBool>,
    failed: Arc<AtomicBool>,
    stats: Arc<IngestStats>,
) {
    let mut buf = [0u8; MAX_DATAGRAM_SIZE];
    let mut consecutive_errors = 0u32;

    while running.load(Ordering::Relaxed) {
        match socket.recv_from(&mut buf) {
            Ok((len, _source)) => {
                consecutive_errors = 0;

                // A wakeup datagram lands here during shutdown
                if !running.load(Ordering::Relaxed) {
                    break;
                }

                stats.datagrams.fetch_add(1, Ordering::Relaxed);

                match codec::decode(&buf[..len], mode) {
                    Ok(triples) => {
                        for (point, raw) in points.iter().zip(triples) {
                            point.publish_raw(raw);
                            log::trace!(
                                "port {}: {} target <- ({}, {}, {})",
                                port,
                                point.id(),
                                raw.x,
                                raw.y,
                                raw.z
                            );
                        }
                    }
                    Err(e) => {
                        stats.decode_errors.fetch_add(1, Ordering::Relaxed);
                        log::warn!("port {}: dropping malformed datagram: {}", port, e);
                    }
                }
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                // Idle; loop around and recheck the running flag
            }
            Err(e) => {
                stats.receive_errors.fetch_add(1, Ordering::Relaxed);
                consecutive_errors += 1;
                log::error!("port {}: receive failed: {}", port, Error::Receive(e));

                if consecutive_errors >= MAX_CONSECUTIVE_RECEIVE_ERRORS {
                    log::error!(
                        "port {}: socket unusable after {} consecutive failures, stopping",
                        port,
                        consecutive_errors
                    );
                    failed.store(true, Ordering::Relaxed);
                    break;
                }

                // Back off so a persistently failing socket cannot spin hot
                std::thread::sleep(Duration::from_millis(10));
            }
        }
    }

    log::info!("UDP ingest on port {} stopped", port);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MappingConfig;
    use crate::types::Vec3;

    fn test_point(id: &str) -> Arc<TrackPoint> {
        Arc::new(TrackPoint::new(
            id,
            MappingConfig::default(),
            1.0,
            Vec3::ZERO,
        ))
    }

    #[test]
    fn test_spawn_rejects_point_count_mismatch() {
        let result = UdpIngestLoop::spawn(40961, TrackMode::Dual, vec![test_point("only")]);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_bind_conflict_reports_port() {
        let holder = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 40962)).unwrap();
        let result = UdpIngestLoop::spawn(40962, TrackMode::Single, vec![test_point("left")]);
        match result {
            Err(Error::Bind { port, .. }) => assert_eq!(port, 40962),
            other => panic!("expected bind error, got {:?}", other.map(|l| l.port())),
        }
        drop(holder);
    }

    #[test]
    fn test_shutdown_is_idempotent_and_releases_port() {
        let mut ingest =
            UdpIngestLoop::spawn(40963, TrackMode::Single, vec![test_point("left")]).unwrap();
        assert!(ingest.is_listening());

        ingest.shutdown();
        ingest.shutdown();
        assert!(!ingest.is_listening());

        // Port must be immediately rebindable once the loop has stopped
        UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 40963)).unwrap();
    }
}
