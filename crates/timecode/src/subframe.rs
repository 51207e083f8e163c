//! Sub-frame positions as a rational fraction of one frame.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A position within a single frame, as `value / resolution` of a frame.
///
/// Comparisons cross-multiply, so subframes at different resolutions compare
/// by the fraction they represent, not by their raw fields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "SubframeParts", into = "SubframeParts")]
pub struct Subframe {
    value: u16,
    resolution: u16,
}

#[derive(Serialize, Deserialize)]
struct SubframeParts {
    value: u16,
    resolution: u16,
}

impl From<SubframeParts> for Subframe {
    fn from(parts: SubframeParts) -> Self {
        Self::new(parts.value as i32, parts.resolution as i32)
    }
}

impl From<Subframe> for SubframeParts {
    fn from(sub: Subframe) -> Self {
        Self {
            value: sub.value,
            resolution: sub.resolution,
        }
    }
}

impl Subframe {
    /// Resolution used when none is given. Divides evenly for common
    /// delivery rates (2, 4, 5, 8, 10, 16, 20, 40).
    pub const DEFAULT_RESOLUTION: u16 = 80;

    /// The finest representable resolution.
    pub const MAX_RESOLUTION: u16 = u16::MAX;

    /// Create a subframe, clamping the resolution to [1, 65535] and the
    /// value to [0, resolution - 1].
    pub fn new(value: i32, resolution: i32) -> Self {
        let resolution = resolution.clamp(1, Self::MAX_RESOLUTION as i32) as u16;
        let value = value.clamp(0, resolution as i32 - 1) as u16;
        Self { value, resolution }
    }

    /// Convert a fraction in [0, 1) to a subframe at the given resolution.
    pub fn from_f64(fraction: f64, resolution: i32) -> Self {
        let resolution = resolution.clamp(1, Self::MAX_RESOLUTION as i32) as u16;
        let value = (fraction * resolution as f64)
            .round()
            .clamp(0.0, resolution as f64 - 1.0) as u16;
        Self { value, resolution }
    }

    pub fn from_f32(fraction: f32, resolution: i32) -> Self {
        Self::from_f64(fraction as f64, resolution)
    }

    /// The midpoint of a frame at the given resolution.
    pub fn mid(resolution: i32) -> Self {
        Self::from_f64(0.5, resolution)
    }

    pub const fn value(&self) -> u16 {
        self.value
    }

    pub const fn resolution(&self) -> u16 {
        self.resolution
    }

    pub fn as_f64(&self) -> f64 {
        self.value as f64 / self.resolution as f64
    }

    pub fn as_f32(&self) -> f32 {
        self.as_f64() as f32
    }
}

impl Default for Subframe {
    fn default() -> Self {
        Self {
            value: 0,
            resolution: Self::DEFAULT_RESOLUTION,
        }
    }
}

impl PartialEq for Subframe {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Subframe {}

impl PartialOrd for Subframe {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Subframe {
    fn cmp(&self, other: &Self) -> Ordering {
        let a = self.value as u32 * other.resolution as u32;
        let b = other.value as u32 * self.resolution as u32;
        a.cmp(&b)
    }
}

impl fmt::Display for Subframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.value, self.resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_clamps() {
        let cases = [
            ((0, 80), (0, 80)),
            ((10, 80), (10, 80)),
            ((99, 100), (99, 100)),
            ((5000, 65535), (5000, 65535)),
            ((10, -10), (0, 1)),
            ((10, 0), (0, 1)),
            ((10, 1), (0, 1)),
            ((-100, 10), (0, 10)),
            ((10, 10), (9, 10)),
            ((100, 10), (9, 10)),
            ((i32::MAX, i32::MAX), (65534, 65535)),
        ];
        for ((value, resolution), (want_value, want_resolution)) in cases {
            let sub = Subframe::new(value, resolution);
            assert_eq!(sub.value(), want_value, "value for ({value}, {resolution})");
            assert_eq!(sub.resolution(), want_resolution);
        }
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(Subframe::from_f64(0.5, 80).value(), 40);
        assert_eq!(Subframe::from_f64(0.71, 100).value(), 71);
        assert_eq!(Subframe::from_f64(0.5, 65535).value(), 32768);
        assert_eq!(Subframe::from_f64(-10.0, 10).value(), 0);
        assert_eq!(Subframe::from_f64(1.0, 10).value(), 9);
        assert_eq!(Subframe::from_f64(10.0, i32::MAX).value(), 65534);
        assert_eq!(Subframe::from_f64(10.0, i32::MAX).resolution(), 65535);
        assert_eq!(Subframe::from_f64(0.1, 0).resolution(), 1);
    }

    #[test]
    fn test_from_f32_precision() {
        assert_eq!(Subframe::from_f32(0.71, 100).value(), 71);
        assert_eq!(Subframe::from_f32(0.5, 65535).value(), 32768);
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(Subframe::new(40, 80).as_f64(), 0.5);
        assert_eq!(Subframe::new(1, 1).as_f64(), 0.0);
        assert!((Subframe::new(65, 100).as_f64() - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_cross_resolution_comparison() {
        assert_eq!(Subframe::new(15, 20), Subframe::new(60, 80));
        assert_eq!(Subframe::new(20, 80), Subframe::new(15, 60));
        assert_ne!(Subframe::new(20, 80), Subframe::new(20, 60));
        assert!(Subframe::new(5, 20) < Subframe::new(75, 80));
        assert!(Subframe::new(15, 20) > Subframe::new(13, 80));
        assert!(Subframe::new(3, 35) < Subframe::new(9, 80));
        assert_eq!(Subframe::new(0, 1), Subframe::default());
    }

    #[test]
    fn test_mid() {
        assert_eq!(Subframe::mid(500).value(), 250);
        assert_eq!(Subframe::mid(80), Subframe::new(40, 80));
    }
}
