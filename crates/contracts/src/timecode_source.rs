//! Timecode source trait.

use timecode::{FrameRate, FrameTimeWithRate};

use crate::SourceId;

/// A clock that produces the session's current timecode.
///
/// Exactly one timecode source drives a synchronizer; every presentation
/// target is derived from its `current_time`.
///
/// # Contract
/// - `id` is fixed at construction and unique within a registry
/// - `current_time` returns `None` while the source has no signal (not yet
///   started, lost genlock, ...); the synchronizer treats that tick as
///   unsynchronized
/// - the returned time is expressed at `frame_rate`
pub trait TimecodeSource {
    /// Stable identifier of this source.
    fn id(&self) -> &SourceId;

    /// Human-readable name for logs and summaries.
    fn friendly_name(&self) -> &str;

    /// The rate this source counts frames at.
    fn frame_rate(&self) -> FrameRate;

    /// The current time, or `None` when the source has no signal.
    fn current_time(&self) -> Option<FrameTimeWithRate>;
}
