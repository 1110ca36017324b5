//! Temporal smoothing of track positions.
//!
//! A one-pole exponential filter: each consumer tick moves the current
//! position a fixed fraction of the remaining distance toward the target.
//! The filter has no notion of elapsed time between ticks, so its effective
//! time constant depends on the tick rate. This is an accepted limitation of
//! the design, not a defect: the consumer is expected to tick at a roughly
//! fixed rate (e.g. once per rendered frame).

use crate::types::Vec3;

/// Advance `current` one smoothing step toward `target`.
///
/// `factor` is the per-tick interpolation weight in [0, 1]: 1 snaps
/// instantly to the target, values near 0 apply heavy temporal averaging.
/// Factors outside [0, 1] are a configuration error and are rejected at
/// session construction time; this function does not clamp.
#[inline]
pub fn advance(current: Vec3, target: Vec3, factor: f32) -> Vec3 {
    Vec3::new(
        current.x + (target.x - current.x) * factor,
        current.y + (target.y - current.y) * factor,
        current.z + (target.z - current.z) * factor,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_factor_one_snaps_to_target() {
        let current = Vec3::new(-10.0, 3.0, 0.5);
        let target = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(advance(current, target, 1.0), target);
    }

    #[test]
    fn test_factor_zero_holds_current() {
        let current = Vec3::new(-10.0, 3.0, 0.5);
        let target = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(advance(current, target, 0.0), current);
    }

    #[test]
    fn test_half_factor_converges_monotonically() {
        let target = Vec3::new(8.0, -4.0, 2.0);
        let mut current = Vec3::ZERO;
        let mut last_distance = current.distance(&target);

        // 16 steps keeps every increment well above f32 rounding at this
        // magnitude, so the distance must strictly decrease each tick
        for _ in 0..16 {
            current = advance(current, target, 0.5);
            let distance = current.distance(&target);
            assert!(distance < last_distance);
            last_distance = distance;
        }

        // Arbitrarily close, but never the target itself
        assert!(current != target);
        assert_relative_eq!(current.x, target.x, epsilon = 1e-3);
        assert_relative_eq!(current.y, target.y, epsilon = 1e-3);
        assert_relative_eq!(current.z, target.z, epsilon = 1e-3);
    }

    #[test]
    fn test_single_step_is_halfway() {
        let stepped = advance(Vec3::ZERO, Vec3::new(2.0, 2.0, 2.0), 0.5);
        assert_eq!(stepped, Vec3::new(1.0, 1.0, 1.0));
    }
}
