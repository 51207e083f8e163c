//! Frame rate as a reduced rational number.
//!
//! NTSC rates (29.97, 59.94, ...) are not representable as integers, so a
//! rate is numerator/denominator with the fraction kept reduced. The
//! drop-frame flag is stored raw and only reported for NTSC rates, which
//! keeps `reciprocal` an involution.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::TimeError;

/// A frame rate expressed as a rational number of frames per second.
///
/// A zero denominator is the invalid sentinel: all invalid rates compare
/// equal to each other and order below every valid rate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "RateParts", into = "RateParts")]
pub struct FrameRate {
    numerator: u32,
    denominator: u32,
    is_drop_frame: bool,
}

/// Raw wire form; deserialized rates get reduced on the way in.
#[derive(Serialize, Deserialize)]
struct RateParts {
    numerator: u32,
    denominator: u32,
    #[serde(default)]
    is_drop_frame: bool,
}

impl From<RateParts> for FrameRate {
    fn from(parts: RateParts) -> Self {
        Self::reduced(parts.numerator, parts.denominator, parts.is_drop_frame)
    }
}

impl From<FrameRate> for RateParts {
    fn from(rate: FrameRate) -> Self {
        Self {
            numerator: rate.numerator,
            denominator: rate.denominator,
            is_drop_frame: rate.is_drop_frame,
        }
    }
}

impl FrameRate {
    pub const FPS_23_976: Self = Self::raw(24000, 1001, false);
    pub const FPS_23_976_DF: Self = Self::raw(24000, 1001, true);
    pub const FPS_24: Self = Self::raw(24, 1, false);
    pub const FPS_25: Self = Self::raw(25, 1, false);
    pub const FPS_29_97: Self = Self::raw(30000, 1001, false);
    pub const FPS_29_97_DF: Self = Self::raw(30000, 1001, true);
    pub const FPS_30: Self = Self::raw(30, 1, false);
    pub const FPS_50: Self = Self::raw(50, 1, false);
    pub const FPS_59_94: Self = Self::raw(60000, 1001, false);
    pub const FPS_59_94_DF: Self = Self::raw(60000, 1001, true);
    pub const FPS_60: Self = Self::raw(60, 1, false);

    const fn raw(numerator: u32, denominator: u32, is_drop_frame: bool) -> Self {
        Self {
            numerator,
            denominator,
            is_drop_frame,
        }
    }

    /// Create a rate from a rational fraction, reducing it.
    ///
    /// # Errors
    /// Negative components are rejected with [`TimeError::InvalidRate`].
    pub fn new(numerator: i32, denominator: i32, is_drop_frame: bool) -> Result<Self, TimeError> {
        if numerator < 0 || denominator < 0 {
            return Err(TimeError::InvalidRate {
                numerator,
                denominator,
            });
        }
        Ok(Self::reduced(
            numerator as u32,
            denominator as u32,
            is_drop_frame,
        ))
    }

    /// Create an integer rate (denominator 1, non-drop).
    pub const fn from_fps(fps: u32) -> Self {
        Self::raw(fps, 1, false)
    }

    fn reduced(numerator: u32, denominator: u32, is_drop_frame: bool) -> Self {
        if denominator == 0 {
            return Self::raw(numerator, 0, is_drop_frame);
        }
        let g = gcd(numerator as u64, denominator as u64);
        Self::raw(
            (numerator as u64 / g) as u32,
            (denominator as u64 / g) as u32,
            is_drop_frame,
        )
    }

    fn normalized(numerator: u64, denominator: u64, is_drop_frame: bool) -> Self {
        if denominator == 0 {
            return Self::raw(clamp_u32(numerator), 0, is_drop_frame);
        }
        let g = gcd(numerator, denominator);
        Self::raw(
            clamp_u32(numerator / g),
            clamp_u32(denominator / g),
            is_drop_frame,
        )
    }

    /// True iff the reduced fraction is an NTSC rate: denominator 1001 and
    /// numerator a positive multiple of 1000.
    pub fn is_ntsc(numerator: i32, denominator: i32) -> bool {
        if numerator <= 0 || denominator <= 0 {
            return false;
        }
        let g = gcd(numerator as u64, denominator as u64);
        let (num, den) = (numerator as u64 / g, denominator as u64 / g);
        den == 1001 && num % 1000 == 0
    }

    pub const fn numerator(&self) -> u32 {
        self.numerator
    }

    pub const fn denominator(&self) -> u32 {
        self.denominator
    }

    /// True when the rate represents a real fraction (nonzero denominator).
    pub const fn is_valid(&self) -> bool {
        self.denominator != 0
    }

    /// The drop-frame flag, masked to NTSC rates.
    pub fn is_drop_frame(&self) -> bool {
        self.is_drop_frame && Self::is_ntsc(self.numerator as i32, self.denominator as i32)
    }

    /// The rate with numerator and denominator swapped.
    pub const fn reciprocal(&self) -> Self {
        Self::raw(self.denominator, self.numerator, self.is_drop_frame)
    }

    /// Duration of a single frame in seconds. Infinite for a 0 fps rate.
    pub fn frame_interval(&self) -> f64 {
        if self.numerator == 0 {
            return f64::INFINITY;
        }
        self.denominator as f64 / self.numerator as f64
    }

    /// The rate in frames per second; 0.0 for invalid rates.
    pub fn as_f64(&self) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }
        self.numerator as f64 / self.denominator as f64
    }

    pub fn as_f32(&self) -> f32 {
        self.as_f64() as f32
    }

    /// True when `other` is an integer multiple of this rate.
    pub fn is_multiple_of(&self, other: &Self) -> bool {
        if !self.is_valid() || !other.is_valid() {
            return false;
        }
        let times = other.numerator as u64 * self.denominator as u64;
        let base = self.numerator as u64 * other.denominator as u64;
        base != 0 && times % base == 0
    }

    /// True when this rate divides `other` evenly.
    pub fn is_factor_of(&self, other: &Self) -> bool {
        other.is_multiple_of(self)
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::raw(0, 0, false)
    }
}

impl PartialEq for FrameRate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrameRate {}

impl PartialOrd for FrameRate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrameRate {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_valid(), other.is_valid()) {
            (false, false) => Ordering::Equal,
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            (true, true) => {
                let a = self.numerator as u64 * other.denominator as u64;
                let b = other.numerator as u64 * self.denominator as u64;
                a.cmp(&b)
                    .then_with(|| self.is_drop_frame().cmp(&other.is_drop_frame()))
            }
        }
    }
}

impl std::ops::Mul for FrameRate {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::normalized(
            self.numerator as u64 * rhs.numerator as u64,
            self.denominator as u64 * rhs.denominator as u64,
            self.is_drop_frame || rhs.is_drop_frame,
        )
    }
}

impl std::ops::Div for FrameRate {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self::normalized(
            self.numerator as u64 * rhs.denominator as u64,
            self.denominator as u64 * rhs.numerator as u64,
            self.is_drop_frame || rhs.is_drop_frame,
        )
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return write!(f, "invalid");
        }
        if self.denominator == 1 {
            write!(f, "{} fps", self.numerator)?;
        } else {
            write!(f, "{:.2} fps", self.as_f64())?;
        }
        if self.is_drop_frame() {
            write!(f, " DF")?;
        }
        Ok(())
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

fn clamp_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
