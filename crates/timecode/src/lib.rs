//! # Timecode
//!
//! Rational time value types for frame-accurate synchronization.
//!
//! All arithmetic is exact: times are frame counts plus a rational subframe,
//! rates are reduced integer fractions. Floating point only appears at the
//! conversion boundary (seconds in and out), never in comparisons or
//! accumulation, so repeated arithmetic cannot drift.

mod error;
mod frame_rate;
mod frame_time;
mod subframe;
mod timecode;

pub use crate::timecode::Timecode;
pub use error::TimeError;
pub use frame_rate::FrameRate;
pub use frame_time::{FrameTime, FrameTimeWithRate};
pub use subframe::Subframe;
