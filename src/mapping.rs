//! Coordinate mapping from tracking space into target space.

use serde::{Deserialize, Serialize};

use crate::types::Vec3;

/// Per-track calibration applied to every raw triple.
///
/// Immutable for the lifetime of a track point. The transform order is
/// flip, then scale, then offset: the sign inversion applies to the raw
/// reading, and the offset is in target-space units so it must never be
/// scaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Uniform multiplier applied to all three axes
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Added after scaling, in target-space units
    #[serde(default)]
    pub offset: Vec3,
    /// Invert the X axis before scaling
    #[serde(default)]
    pub flip_x: bool,
    /// Invert the Y axis before scaling
    #[serde(default)]
    pub flip_y: bool,
    /// Invert the Z axis before scaling
    #[serde(default)]
    pub flip_z: bool,
}

fn default_scale() -> f32 {
    1.0
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            offset: Vec3::ZERO,
            flip_x: false,
            flip_y: false,
            flip_z: false,
        }
    }
}

impl MappingConfig {
    /// Map a raw triple into target space. Pure and total.
    #[inline]
    pub fn map(&self, raw: Vec3) -> Vec3 {
        let x = if self.flip_x { -raw.x } else { raw.x };
        let y = if self.flip_y { -raw.y } else { raw.y };
        let z = if self.flip_z { -raw.z } else { raw.z };

        Vec3::new(
            x * self.scale + self.offset.x,
            y * self.scale + self.offset.y,
            z * self.scale + self.offset.z,
        )
    }
}
