//! Track point state shared between the ingest loop and the consumer tick.
//!
//! Each [`TrackPoint`] has exactly one writer per field: the owning ingest
//! loop writes `target`, the consumer tick path writes `current`. Both
//! vectors sit behind their own [`parking_lot::Mutex`] so a reader can never
//! observe a half-replaced vector; every critical section covers a single
//! read or write of the whole value.

use parking_lot::Mutex;

use crate::filter;
use crate::mapping::MappingConfig;
use crate::types::Vec3;

/// One independently tracked 3D position (e.g. one hand).
///
/// Created at session start with current and target seeded to the entity's
/// starting placement, so the first received packet smooths from there
/// instead of jumping.
pub struct TrackPoint {
    id: String,
    mapping: MappingConfig,
    smoothing: f32,
    /// Last mapped wire value. Written only by the owning ingest loop.
    target: Mutex<Vec3>,
    /// Last smoothed value. Written only by the consumer tick path.
    current: Mutex<Vec3>,
}

impl TrackPoint {
    /// Create a track point with both vectors seeded to `initial`.
    ///
    /// `smoothing` must already be validated to [0, 1] by the caller.
    pub fn new(id: impl Into<String>, mapping: MappingConfig, smoothing: f32, initial: Vec3) -> Self {
        Self {
            id: id.into(),
            mapping,
            smoothing,
            target: Mutex::new(initial),
            current: Mutex::new(initial),
        }
    }

    /// Stable label of this track point (e.g. `"left"`).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Per-tick interpolation weight toward the target.
    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    /// Map a raw wire triple and publish it as the new target.
    ///
    /// Called only by the owning ingest loop.
    pub fn publish_raw(&self, raw: Vec3) {
        let mapped = self.mapping.map(raw);
        *self.target.lock() = mapped;
    }

    /// Run one smoothing step: move `current` toward `target`.
    ///
    /// Called only by the consumer tick path. The target is copied out under
    /// its own lock before `current` is touched, so neither lock is held
    /// across the other.
    pub fn advance(&self) -> Vec3 {
        let target = *self.target.lock();
        let mut current = self.current.lock();
        *current = filter::advance(*current, target, self.smoothing);
        *current
    }

    /// Read the current (smoothed) position.
    pub fn position(&self) -> Vec3 {
        *self.current.lock()
    }

    /// Read the target (last mapped) position.
    pub fn target(&self) -> Vec3 {
        *self.target.lock()
    }
}

impl std::fmt::Debug for TrackPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackPoint")
            .field("id", &self.id)
            .field("smoothing", &self.smoothing)
            .field("target", &self.target())
            .field("current", &self.position())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_at_initial_placement() {
        let initial = Vec3::new(0.0, 1.0, -2.0);
        let point = TrackPoint::new("left", MappingConfig::default(), 0.5, initial);
        assert_eq!(point.position(), initial);
        assert_eq!(point.target(), initial);

        // No packet yet: advancing holds position, no jump
        assert_eq!(point.advance(), initial);
    }

    #[test]
    fn test_publish_applies_mapping() {
        let mapping = MappingConfig {
            scale: 2.0,
            offset: Vec3::new(5.0, 0.0, 0.0),
            ..Default::default()
        };
        let point = TrackPoint::new("right", mapping, 1.0, Vec3::ZERO);

        point.publish_raw(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(point.target(), Vec3::new(7.0, 0.0, 0.0));

        // Current is untouched until the consumer ticks
        assert_eq!(point.position(), Vec3::ZERO);
        assert_eq!(point.advance(), Vec3::new(7.0, 0.0, 0.0));
    }

    #[test]
    fn test_advance_moves_fractionally() {
        let point = TrackPoint::new("left", MappingConfig::default(), 0.5, Vec3::ZERO);
        point.publish_raw(Vec3::new(4.0, 0.0, 0.0));

        assert_eq!(point.advance(), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(point.advance(), Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(point.position(), Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_concurrent_publish_and_advance() {
        use std::sync::Arc;

        let point = Arc::new(TrackPoint::new(
            "left",
            MappingConfig::default(),
            0.5,
            Vec3::ZERO,
        ));

        let writer = {
            let point = Arc::clone(&point);
            std::thread::spawn(move || {
                for i in 0..1000 {
                    let v = i as f32;
                    point.publish_raw(Vec3::new(v, v, v));
                }
            })
        };

        // Reader ticks concurrently; every observed vector must have all
        // three components equal (a torn read would break this)
        for _ in 0..1000 {
            let target = point.target();
            assert_eq!(target.x, target.y);
            assert_eq!(target.y, target.z);
            point.advance();
        }

        writer.join().unwrap();
    }
}
