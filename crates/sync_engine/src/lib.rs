//! # Sync Engine
//!
//! Frame-accurate alignment of timed data streams against a timecode clock.
//!
//! The engine is tick-driven and single-threaded: the owner calls
//! [`Synchronizer::update`] once per output frame. Each tick reads the
//! clock, subtracts the global delay, remaps the target into every source's
//! rate and asks the source to present its nearest sample. The delay itself
//! is found by [`DelayCalibrator`], a resumable step function advanced by
//! the same ticks.

mod calibrator;
mod error;
mod ring;
pub mod sim;
mod synchronizer;
mod timed_buffer;

pub use calibrator::{CalibrationResult, CalibrationStep, DelayCalibrator, SyncCalibrator};
pub use error::BufferError;
pub use ring::CircularBuffer;
pub use synchronizer::Synchronizer;
pub use timed_buffer::{Interpolator, TimedDataBuffer};
