//! SMPTE-style timecode display values.
//!
//! A timecode is the human-facing hours/minutes/seconds/frames split of a
//! [`FrameTime`]. For drop-frame rates the frame count and the display
//! digits differ: two display frames per nominal 30 fps are skipped every
//! minute except every tenth, keeping the display within one frame of wall
//! clock time over a day. Conversions here apply that adjustment exactly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{FrameRate, FrameTime, Subframe};

/// A frame time split into display components at some rate.
///
/// Negative times carry their sign on each nonzero component; the subframe
/// is always a positive fraction of the frame.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Timecode {
    hours: i32,
    minutes: i32,
    seconds: i32,
    frames: i32,
    subframe: Subframe,
    is_drop_frame: bool,
}

impl Timecode {
    /// Split a frame time into display components at the given rate.
    ///
    /// Times wrap into one 24 hour day. Invalid and 0 fps rates give the
    /// zero timecode.
    pub fn from_frame_time(rate: &FrameRate, time: FrameTime) -> Self {
        let Some(fps) = nominal_fps(rate) else {
            return Self::default();
        };
        let is_drop_frame = rate.is_drop_frame();

        let raw = time.frame_number() as i64;
        let negative = raw < 0;
        let mut n = raw.abs();
        if is_drop_frame {
            n = to_display_count(n, fps);
        }
        n %= fps * 86_400;

        let frames = n % fps;
        let total_seconds = n / fps;
        let seconds = total_seconds % 60;
        let total_minutes = total_seconds / 60;
        let minutes = total_minutes % 60;
        let hours = total_minutes / 60;

        let sign = if negative { -1 } else { 1 };
        Self {
            hours: (sign * hours) as i32,
            minutes: (sign * minutes) as i32,
            seconds: (sign * seconds) as i32,
            frames: (sign * frames) as i32,
            subframe: time.subframe(),
            is_drop_frame,
        }
    }

    /// Build a timecode from display digits.
    ///
    /// When `is_drop_frame` is set and the rate is drop-frame, the digits
    /// are taken as already being display values: they are normalized into
    /// one day but otherwise preserved, even for slots a drop-frame display
    /// never shows. Otherwise the digits are a plain frame count at the
    /// nominal rate.
    pub fn from_hmsf(
        rate: &FrameRate,
        hours: i32,
        minutes: i32,
        seconds: i32,
        frames: i32,
        subframe: Subframe,
        is_drop_frame: bool,
    ) -> Self {
        let Some(fps) = nominal_fps(rate) else {
            return Self::default();
        };

        if is_drop_frame && rate.is_drop_frame() {
            let raw = component_count(hours, minutes, seconds, frames, fps);
            let negative = raw < 0;
            let mut n = raw.abs() % (fps * 86_400);

            let f = n % fps;
            n /= fps;
            let s = n % 60;
            n /= 60;
            let m = n % 60;
            let h = n / 60;

            let sign = if negative { -1 } else { 1 };
            return Self {
                hours: (sign * h) as i32,
                minutes: (sign * m) as i32,
                seconds: (sign * s) as i32,
                frames: (sign * f) as i32,
                subframe,
                is_drop_frame: true,
            };
        }

        let n = component_count(hours, minutes, seconds, frames, fps);
        let n = n.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        Self::from_frame_time(rate, FrameTime::with_subframe(n, subframe))
    }

    pub fn from_seconds(rate: &FrameRate, seconds: f64) -> Self {
        Self::from_frame_time(rate, FrameTime::from_seconds(rate, seconds))
    }

    /// The frame count this timecode displays at the given rate.
    pub fn to_frame_time(&self, rate: &FrameRate) -> FrameTime {
        let Some(fps) = nominal_fps(rate) else {
            return FrameTime::default();
        };

        let negative = self.hours < 0 || self.minutes < 0 || self.seconds < 0 || self.frames < 0;
        let (h, m, s, f) = (
            (self.hours as i64).abs(),
            (self.minutes as i64).abs(),
            (self.seconds as i64).abs(),
            (self.frames as i64).abs(),
        );
        let total_minutes = h * 60 + m;
        let mut n = (total_minutes * 60 + s) * fps + f;
        if self.is_drop_frame && rate.is_drop_frame() {
            let drop = dropped_per_minute(fps);
            n -= drop * (total_minutes - total_minutes / 10);
        }
        if negative {
            n = -n;
        }
        let n = n.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        FrameTime::with_subframe(n, self.subframe)
    }

    pub fn to_seconds(&self, rate: &FrameRate) -> f64 {
        self.to_frame_time(rate).to_seconds(rate)
    }

    pub const fn hours(&self) -> i32 {
        self.hours
    }

    pub const fn minutes(&self) -> i32 {
        self.minutes
    }

    pub const fn seconds(&self) -> i32 {
        self.seconds
    }

    pub const fn frames(&self) -> i32 {
        self.frames
    }

    pub const fn subframe(&self) -> Subframe {
        self.subframe
    }

    pub const fn is_drop_frame(&self) -> bool {
        self.is_drop_frame
    }

    /// This timecode at the start of its frame.
    pub fn floor(&self) -> Self {
        Self {
            subframe: Subframe::new(0, self.subframe.resolution() as i32),
            ..*self
        }
    }

    /// This timecode at the middle of its frame.
    pub fn center(&self) -> Self {
        Self {
            subframe: Subframe::mid(self.subframe.resolution() as i32),
            ..*self
        }
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let negative = self.hours < 0 || self.minutes < 0 || self.seconds < 0 || self.frames < 0;
        if negative {
            write!(f, "-")?;
        }
        let sep = if self.is_drop_frame { ';' } else { ':' };
        write!(
            f,
            "{:02}:{:02}:{:02}{}{:02}",
            self.hours.abs(),
            self.minutes.abs(),
            self.seconds.abs(),
            sep,
            self.frames.abs()
        )
    }
}

/// Whole frames per second used for display, `None` for unusable rates.
fn nominal_fps(rate: &FrameRate) -> Option<i64> {
    if !rate.is_valid() || rate.numerator() == 0 {
        return None;
    }
    let num = rate.numerator() as i64;
    let den = rate.denominator() as i64;
    Some((num + den - 1) / den)
}

/// Display frames skipped per minute at the nominal rate (2 at 30 fps).
fn dropped_per_minute(fps: i64) -> i64 {
    (fps as f64 / 15.0).round() as i64
}

/// Convert a true frame count into the drop-frame display count.
fn to_display_count(n: i64, fps: i64) -> i64 {
    let drop = dropped_per_minute(fps);
    let frames_per_minute = fps * 60 - drop;
    let frames_per_ten_minutes = 10 * frames_per_minute + drop;

    let d = n / frames_per_ten_minutes;
    let m = n % frames_per_ten_minutes;
    // The first `drop` frames of each ten minute block belong to the
    // undropped minute.
    let adjustment = if m < drop {
        0
    } else {
        drop * ((m - drop) / frames_per_minute)
    };
    n + drop * 9 * d + adjustment
}

fn component_count(hours: i32, minutes: i32, seconds: i32, frames: i32, fps: i64) -> i64 {
    ((hours as i64 * 60 + minutes as i64) * 60 + seconds as i64) * fps + frames as i64
}
