//! HastaIO - UDP ingest bridge for real-time 3D hand tracking
//!
//! This library receives position updates from an external tracking device
//! over UDP, maps them from the tracker's coordinate space into the target
//! world space, and exposes temporally smoothed positions that a rendering
//! or physics loop samples once per tick.
//!
//! ## Pipeline
//!
//! ```text
//! datagram -> codec -> raw triple(s) -> mapping -> TrackPoint.target
//!                                 (ingest thread)
//! TrackPoint.current -> lerp toward target      (consumer tick)
//! ```
//!
//! One background thread per listening port; the consumer drives
//! [`Session::advance_all`] from its own loop and reads positions with
//! [`Session::position_of`].

pub mod codec;
pub mod config;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod mapping;
pub mod session;
pub mod track;
pub mod types;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{DecodeError, Error, Result};
pub use mapping::MappingConfig;
pub use session::Session;
pub use track::TrackPoint;
pub use types::{TrackMode, Vec3};
