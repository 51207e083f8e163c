//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and
//! traits. All business crates can only depend on this crate (and the
//! `timecode` value types), reverse dependencies are prohibited.
//!
//! ## Time model
//! - All timestamps are rational [`timecode::FrameTime`] values paired with
//!   the [`timecode::FrameRate`] they are measured at
//! - Sources buffer samples in their own rate; the synchronizer remaps into
//!   each source's rate when presenting

mod blueprint;
mod error;
mod registry;
mod source_id;
mod status;
mod timecode_source;
mod timed_data_source;

pub use blueprint::*;
pub use error::*;
pub use registry::{SourceRegistry, TimecodeSourceRegistry, TimedDataSourceRegistry};
pub use source_id::SourceId;
pub use status::{CalibrationStatus, TimedSampleStatus};
pub use timecode_source::TimecodeSource;
pub use timed_data_source::TimedDataSource;
