//! Timed data source trait.

use timecode::{FrameRate, FrameTime, FrameTimeWithRate};

use crate::{SourceId, TimedSampleStatus};

/// A stream of timestamped samples that can be presented at a target time.
///
/// Implementations buffer recent samples and, on `present_at`, surface the
/// sample nearest the target. Delivery latency is absorbed by the
/// synchronizer's global delay plus each source's buffer, sized during
/// calibration.
///
/// # Contract
/// - `id` is fixed at construction and unique within a registry
/// - `present_at` receives a target already adjusted for the synchronizer's
///   delay and this source's offset; the source remaps it into its own rate
/// - `buffer_size` is a request: implementations clamp it to their
///   `min_buffer_size`/`max_buffer_size` bounds
/// - `set_synchronizer` records which synchronizer controls this source; a
///   source belongs to at most one synchronizer at a time
pub trait TimedDataSource {
    /// Stable identifier of this source.
    fn id(&self) -> &SourceId;

    /// Human-readable name for logs and summaries.
    fn friendly_name(&self) -> &str;

    /// The rate the source's samples are timestamped at.
    fn frame_rate(&self) -> FrameRate;

    /// Current sample buffer capacity, in frames.
    fn buffer_size(&self) -> usize;

    /// Request a new buffer capacity.
    fn set_buffer_size(&mut self, size: usize);

    /// Smallest buffer capacity the source supports, if bounded.
    fn min_buffer_size(&self) -> Option<usize> {
        None
    }

    /// Largest buffer capacity the source supports, if bounded.
    fn max_buffer_size(&self) -> Option<usize> {
        None
    }

    /// Constant timestamp offset applied when presenting, in the source's
    /// own rate.
    fn offset(&self) -> FrameTime {
        FrameTime::default()
    }

    /// True when a synchronizer presented this source on the last tick.
    fn is_synchronized(&self) -> bool;

    fn set_is_synchronized(&mut self, synchronized: bool);

    /// Id of the synchronizer controlling this source, if any.
    fn synchronizer(&self) -> Option<&SourceId>;

    fn set_synchronizer(&mut self, synchronizer: Option<SourceId>);

    /// Present the sample nearest the target time.
    fn present_at(&mut self, target: &FrameTimeWithRate) -> TimedSampleStatus;

    /// Timestamps of the oldest and newest buffered samples, in the
    /// source's own rate.
    fn time_range(&self) -> Option<(FrameTime, FrameTime)>;
}
