//! Frame-accurate time values.
//!
//! A [`FrameTime`] is an i32 frame count plus a [`Subframe`]. Arithmetic and
//! rate remapping are exact, carried out on i128 tick counts; only the final
//! subframe is rounded, at the operand resolution. Results outside the i32
//! frame range are [`TimeError::Overflow`], never wrapped.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{FrameRate, Subframe, TimeError, Timecode};

/// A time in frames, relative to an arbitrary origin.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct FrameTime {
    frame_number: i32,
    subframe: Subframe,
}

impl FrameTime {
    /// A whole-frame time.
    pub fn new(frame_number: i32) -> Self {
        Self {
            frame_number,
            subframe: Subframe::default(),
        }
    }

    pub fn with_subframe(frame_number: i32, subframe: Subframe) -> Self {
        Self {
            frame_number,
            subframe,
        }
    }

    /// Convert a fractional frame count, saturating at the i32 range.
    pub fn from_frames(frames: f64) -> Self {
        Self::from_frames_at(frames, Subframe::DEFAULT_RESOLUTION as i32)
    }

    /// Like [`from_frames`](Self::from_frames) with an explicit subframe
    /// resolution.
    pub fn from_frames_at(frames: f64, resolution: i32) -> Self {
        if frames.is_nan() {
            return Self::with_subframe(0, Subframe::new(0, resolution));
        }
        let floor = frames.floor();
        if floor < i32::MIN as f64 {
            return Self::with_subframe(i32::MIN, Subframe::new(0, resolution));
        }
        if floor > i32::MAX as f64 {
            // Largest representable value at this resolution.
            return Self::with_subframe(i32::MAX, Subframe::new(i32::MAX, resolution));
        }
        Self::with_subframe(floor as i32, Subframe::from_f64(frames - floor, resolution))
    }

    /// Convert seconds at the given rate. Invalid and 0 fps rates give the
    /// zero time.
    pub fn from_seconds(rate: &FrameRate, seconds: f64) -> Self {
        if !rate.is_valid() || rate.numerator() == 0 {
            return Self::default();
        }
        Self::from_frames(seconds * rate.numerator() as f64 / rate.denominator() as f64)
    }

    /// The time in seconds at the given rate; 0.0 for invalid or 0 fps rates.
    pub fn to_seconds(&self, rate: &FrameRate) -> f64 {
        if !rate.is_valid() || rate.numerator() == 0 {
            return 0.0;
        }
        (self.frame_number as f64 + self.subframe.as_f64()) * rate.denominator() as f64
            / rate.numerator() as f64
    }

    /// The largest seconds value representable at the given rate.
    pub fn max_representable_seconds(rate: &FrameRate) -> f64 {
        let max = Self::with_subframe(
            i32::MAX,
            Subframe::new(i32::MAX, Subframe::MAX_RESOLUTION as i32),
        );
        max.to_seconds(rate)
    }

    pub const fn frame_number(&self) -> i32 {
        self.frame_number
    }

    pub const fn subframe(&self) -> Subframe {
        self.subframe
    }

    /// The start of the frame this time falls in.
    pub fn floor(self) -> Self {
        Self::with_subframe(
            self.frame_number,
            Subframe::new(0, self.subframe.resolution() as i32),
        )
    }

    /// The next whole frame, saturating at i32::MAX.
    pub fn ceil(self) -> Self {
        if self.subframe.value() == 0 {
            return self;
        }
        Self::with_subframe(
            self.frame_number.saturating_add(1),
            Subframe::new(0, self.subframe.resolution() as i32),
        )
    }

    /// The nearest whole frame; exact midpoints floor.
    pub fn round(self) -> Self {
        let half_or_less =
            self.subframe.value() as u32 * 2 <= self.subframe.resolution() as u32;
        if half_or_less {
            self.floor()
        } else {
            self.ceil()
        }
    }

    /// Exact sum. The result keeps the finer of the two resolutions.
    pub fn try_add(self, rhs: Self) -> Result<Self, TimeError> {
        self.combine(rhs, 1)
    }

    /// Exact difference. The result keeps the finer of the two resolutions.
    pub fn try_sub(self, rhs: Self) -> Result<Self, TimeError> {
        self.combine(rhs, -1)
    }

    fn combine(self, rhs: Self, sign: i128) -> Result<Self, TimeError> {
        let ar = self.subframe.resolution() as i128;
        let br = rhs.subframe.resolution() as i128;
        let den = ar * br;
        let lhs_ticks = self.frame_number as i128 * ar + self.subframe.value() as i128;
        let rhs_ticks = rhs.frame_number as i128 * br + rhs.subframe.value() as i128;
        let n = lhs_ticks * br + sign * rhs_ticks * ar;
        Self::from_ticks(n, den, ar.max(br))
    }

    /// Express this time, measured at `from`, in frames at `to`.
    ///
    /// The conversion is exact up to one rounding of the subframe at the
    /// input resolution. Invalid and 0 fps rates give the zero time.
    pub fn remap(self, from: &FrameRate, to: &FrameRate) -> Result<Self, TimeError> {
        if !from.is_valid() || !to.is_valid() || from.numerator() == 0 || to.numerator() == 0 {
            return Ok(Self::default());
        }
        if from.numerator() == to.numerator() && from.denominator() == to.denominator() {
            return Ok(self);
        }
        let res = self.subframe.resolution() as i128;
        let ticks = self.frame_number as i128 * res + self.subframe.value() as i128;
        let n = ticks * to.numerator() as i128 * from.denominator() as i128;
        let den = res * to.denominator() as i128 * from.numerator() as i128;
        Self::from_ticks(n, den, res)
    }

    /// Rebuild a frame time from `n / den` frames, rounding the subframe to
    /// `res`. `den` and `res` must be positive.
    fn from_ticks(n: i128, den: i128, res: i128) -> Result<Self, TimeError> {
        let mut frame = n.div_euclid(den);
        let rem = n.rem_euclid(den);
        let mut value = (rem * res * 2 + den) / (den * 2);
        if value == res {
            frame += 1;
            value = 0;
        }
        let frame = i32::try_from(frame).map_err(|_| TimeError::Overflow)?;
        Ok(Self::with_subframe(
            frame,
            Subframe::new(value as i32, res as i32),
        ))
    }
}

impl std::ops::Add for FrameTime {
    type Output = Self;

    /// Panics on overflow, like `std::time::Duration`. Use
    /// [`try_add`](Self::try_add) to handle overflow.
    fn add(self, rhs: Self) -> Self {
        match self.try_add(rhs) {
            Ok(sum) => sum,
            Err(_) => panic!("overflow when adding frame times"),
        }
    }
}

impl std::ops::Sub for FrameTime {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        match self.try_sub(rhs) {
            Ok(diff) => diff,
            Err(_) => panic!("overflow when subtracting frame times"),
        }
    }
}

impl fmt::Display for FrameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subframe.value() == 0 {
            write!(f, "{}", self.frame_number)
        } else {
            write!(f, "{} {}", self.frame_number, self.subframe)
        }
    }
}

/// A [`FrameTime`] together with the [`FrameRate`] it is measured at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameTimeWithRate {
    rate: FrameRate,
    time: FrameTime,
}

impl FrameTimeWithRate {
    pub fn new(rate: FrameRate, time: FrameTime) -> Self {
        Self { rate, time }
    }

    pub fn from_seconds(rate: FrameRate, seconds: f64) -> Self {
        Self {
            rate,
            time: FrameTime::from_seconds(&rate, seconds),
        }
    }

    pub const fn rate(&self) -> FrameRate {
        self.rate
    }

    pub const fn time(&self) -> FrameTime {
        self.time
    }

    pub fn to_seconds(&self) -> f64 {
        self.time.to_seconds(&self.rate)
    }

    pub fn to_timecode(&self) -> Timecode {
        Timecode::from_frame_time(&self.rate, self.time)
    }

    /// The same instant expressed at another rate.
    pub fn remap(&self, rate: &FrameRate) -> Result<Self, TimeError> {
        Ok(Self {
            rate: *rate,
            time: self.time.remap(&self.rate, rate)?,
        })
    }

    /// Sum; the right operand is remapped into this value's rate first.
    pub fn try_add(&self, rhs: &Self) -> Result<Self, TimeError> {
        let rhs_time = rhs.time.remap(&rhs.rate, &self.rate)?;
        Ok(Self {
            rate: self.rate,
            time: self.time.try_add(rhs_time)?,
        })
    }

    pub fn try_sub(&self, rhs: &Self) -> Result<Self, TimeError> {
        let rhs_time = rhs.time.remap(&rhs.rate, &self.rate)?;
        Ok(Self {
            rate: self.rate,
            time: self.time.try_sub(rhs_time)?,
        })
    }
}

impl fmt::Display for FrameTimeWithRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.time, self.rate)
    }
}
