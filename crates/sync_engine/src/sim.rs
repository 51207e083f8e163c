//! Simulated clocks and sources.
//!
//! These drive the demo pipeline and the engine's own tests: a manually
//! advanced clock and a data source that generates one sample per tick,
//! delivered after a configurable latency plus random jitter.

use std::collections::VecDeque;

use contracts::{SourceConfig, SourceId, TimecodeSource, TimedDataSource, TimedSampleStatus};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use timecode::{FrameRate, FrameTime, FrameTimeWithRate};

use crate::TimedDataBuffer;

/// A timecode source advanced by hand.
#[derive(Debug, Clone)]
pub struct ManualClock {
    id: SourceId,
    name: String,
    rate: FrameRate,
    time: Option<FrameTime>,
}

impl ManualClock {
    /// A clock starting at frame zero.
    pub fn new(id: SourceId, rate: FrameRate) -> Self {
        let name = id.to_string();
        Self {
            id,
            name,
            rate,
            time: Some(FrameTime::new(0)),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the time directly; `None` simulates signal loss.
    pub fn set_time(&mut self, time: Option<FrameTime>) {
        self.time = time;
    }

    /// Advance by whole frames. Overflow drops the signal.
    pub fn advance_frames(&mut self, frames: i32) {
        self.time = self
            .time
            .and_then(|t| t.try_add(FrameTime::new(frames)).ok());
    }
}

impl TimecodeSource for ManualClock {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn friendly_name(&self) -> &str {
        &self.name
    }

    fn frame_rate(&self) -> FrameRate {
        self.rate
    }

    fn current_time(&self) -> Option<FrameTimeWithRate> {
        self.time.map(|t| FrameTimeWithRate::new(self.rate, t))
    }
}

/// A timed-data source fed by a simulated delivery pipe.
///
/// Each [`ingest`](Self::ingest) call generates one sample stamped with the
/// current time (shifted by the source's offset) and queues it for delivery
/// `latency_frames` plus up to `jitter_frames` clock frames later. Samples
/// whose delivery time has passed land in the buffer; jitter can reorder
/// them, which the buffer absorbs by sorted insertion.
pub struct SimulatedSource {
    id: SourceId,
    name: String,
    rate: FrameRate,
    latency_frames: u32,
    jitter_frames: u32,
    offset: FrameTime,
    min_buffer_size: Option<usize>,
    max_buffer_size: Option<usize>,
    buffer: TimedDataBuffer<FrameTime>,
    /// Samples in flight: (clock time they arrive, sample timestamp).
    pending: VecDeque<(FrameTime, FrameTime)>,
    synchronizer: Option<SourceId>,
    synchronized: bool,
    rng: SmallRng,
}

impl SimulatedSource {
    pub fn from_config(config: &SourceConfig, seed: u64) -> Self {
        let name = if config.name.is_empty() {
            config.id.to_string()
        } else {
            config.name.clone()
        };
        Self {
            id: config.id.clone(),
            name,
            rate: config.rate,
            latency_frames: config.latency_frames,
            jitter_frames: config.jitter_frames,
            offset: FrameTime::new(config.offset_frames),
            min_buffer_size: config.min_buffer_size,
            max_buffer_size: config.max_buffer_size,
            buffer: TimedDataBuffer::new(config.rate, config.buffer_size),
            pending: VecDeque::new(),
            synchronizer: None,
            synchronized: false,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Generate this tick's sample and deliver everything that is due.
    pub fn ingest(&mut self, now: &FrameTimeWithRate) {
        let Ok(local_now) = now.time().remap(&now.rate(), &self.rate) else {
            return;
        };
        let Ok(stamp) = local_now.try_sub(self.offset) else {
            return;
        };

        let jitter = if self.jitter_frames > 0 {
            self.rng.random_range(0..=self.jitter_frames)
        } else {
            0
        };
        let lag = i32::try_from(self.latency_frames.saturating_add(jitter)).unwrap_or(i32::MAX);
        if let Ok(due) = now.time().try_add(FrameTime::new(lag)) {
            self.pending.push_back((due, stamp));
        }

        let now_time = now.time();
        let mut in_flight = VecDeque::with_capacity(self.pending.len());
        for (due, stamp) in self.pending.drain(..) {
            if due <= now_time {
                self.buffer.add_at(stamp, stamp);
            } else {
                in_flight.push_back((due, stamp));
            }
        }
        self.pending = in_flight;
    }

    /// Samples queued but not yet delivered.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

impl TimedDataSource for SimulatedSource {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn friendly_name(&self) -> &str {
        &self.name
    }

    fn frame_rate(&self) -> FrameRate {
        self.rate
    }

    fn buffer_size(&self) -> usize {
        self.buffer.capacity()
    }

    fn set_buffer_size(&mut self, size: usize) {
        let mut size = size;
        if let Some(max) = self.max_buffer_size {
            size = size.min(max);
        }
        if let Some(min) = self.min_buffer_size {
            size = size.max(min);
        }
        self.buffer.set_capacity(size);
    }

    fn min_buffer_size(&self) -> Option<usize> {
        self.min_buffer_size
    }

    fn max_buffer_size(&self) -> Option<usize> {
        self.max_buffer_size
    }

    fn offset(&self) -> FrameTime {
        self.offset
    }

    fn is_synchronized(&self) -> bool {
        self.synchronized
    }

    fn set_is_synchronized(&mut self, synchronized: bool) {
        self.synchronized = synchronized;
    }

    fn synchronizer(&self) -> Option<&SourceId> {
        self.synchronizer.as_ref()
    }

    fn set_synchronizer(&mut self, synchronizer: Option<SourceId>) {
        self.synchronizer = synchronizer;
    }

    fn present_at(&mut self, target: &FrameTimeWithRate) -> TimedSampleStatus {
        let Ok(local) = target.time().remap(&target.rate(), &self.rate) else {
            return TimedSampleStatus::DataMissing;
        };
        let (status, _) = self.buffer.try_get_sample(local);
        status
    }

    fn time_range(&self) -> Option<(FrameTime, FrameTime)> {
        self.buffer.time_range()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(id: &str, latency: u32, jitter: u32) -> SourceConfig {
        SourceConfig {
            id: id.into(),
            name: String::new(),
            rate: FrameRate::FPS_30,
            latency_frames: latency,
            jitter_frames: jitter,
            buffer_size: 8,
            min_buffer_size: None,
            max_buffer_size: None,
            offset_frames: 0,
        }
    }

    fn tick(clock: &mut ManualClock, source: &mut SimulatedSource) -> FrameTimeWithRate {
        clock.advance_frames(1);
        let now = clock.current_time().unwrap();
        source.ingest(&now);
        now
    }

    #[test]
    fn test_clock_advances_and_loses_signal() {
        let mut clock = ManualClock::new("clock".into(), FrameRate::FPS_30);
        assert_eq!(clock.current_time().unwrap().time(), FrameTime::new(0));
        clock.advance_frames(5);
        assert_eq!(clock.current_time().unwrap().time(), FrameTime::new(5));

        clock.set_time(None);
        assert!(clock.current_time().is_none());
    }

    #[test]
    fn test_samples_arrive_after_latency() {
        let mut clock = ManualClock::new("clock".into(), FrameRate::FPS_30);
        let mut source = SimulatedSource::from_config(&config("cam", 3, 0), 1);

        for _ in 0..3 {
            tick(&mut clock, &mut source);
            assert_eq!(source.time_range(), None);
        }
        assert_eq!(source.in_flight(), 3);

        // Tick 4 delivers the sample generated on tick 1.
        tick(&mut clock, &mut source);
        let (oldest, newest) = source.time_range().unwrap();
        assert_eq!(oldest, FrameTime::new(1));
        assert_eq!(newest, FrameTime::new(1));

        tick(&mut clock, &mut source);
        assert_eq!(source.time_range().unwrap().1, FrameTime::new(2));
    }

    #[test]
    fn test_zero_latency_is_live() {
        let mut clock = ManualClock::new("clock".into(), FrameRate::FPS_30);
        let mut source = SimulatedSource::from_config(&config("cam", 0, 0), 1);

        let now = tick(&mut clock, &mut source);
        assert_eq!(source.time_range().unwrap().1, now.time());
    }

    #[test]
    fn test_jitter_is_bounded() {
        let mut clock = ManualClock::new("clock".into(), FrameRate::FPS_30);
        let mut source = SimulatedSource::from_config(&config("cam", 2, 3), 42);

        for n in 1..=100 {
            tick(&mut clock, &mut source);
            if let Some((_, newest)) = source.time_range() {
                // Delivered samples are at least latency_frames old.
                assert!(newest.frame_number() <= n - 2);
            }
        }
        // With jitter up to 3, everything generated 5+ frames ago arrived.
        let (_, newest) = source.time_range().unwrap();
        assert!(newest.frame_number() >= 95);
    }

    #[test]
    fn test_offset_shifts_sample_stamps() {
        let mut clock = ManualClock::new("clock".into(), FrameRate::FPS_30);
        let mut cfg = config("cam", 0, 0);
        cfg.offset_frames = 10;
        let mut source = SimulatedSource::from_config(&cfg, 1);

        tick(&mut clock, &mut source);
        assert_eq!(source.time_range().unwrap().1, FrameTime::new(-9));
        assert_eq!(source.offset(), FrameTime::new(10));
    }

    #[test]
    fn test_source_remaps_target_into_own_rate() {
        let mut clock = ManualClock::new("clock".into(), FrameRate::from_fps(60));
        let mut cfg = config("cam", 0, 0);
        cfg.rate = FrameRate::FPS_30;
        let mut source = SimulatedSource::from_config(&cfg, 1);

        for _ in 0..10 {
            tick(&mut clock, &mut source);
        }
        // Clock frame 10 at 60 fps is frame 5 at 30 fps.
        let target = FrameTimeWithRate::new(FrameRate::from_fps(60), FrameTime::new(10));
        assert_eq!(source.present_at(&target), TimedSampleStatus::Ok);
    }

    #[test]
    fn test_buffer_size_respects_bounds() {
        let mut cfg = config("cam", 0, 0);
        cfg.min_buffer_size = Some(2);
        cfg.max_buffer_size = Some(4);
        let mut source = SimulatedSource::from_config(&cfg, 1);

        source.set_buffer_size(100);
        assert_eq!(source.buffer_size(), 4);
        source.set_buffer_size(1);
        assert_eq!(source.buffer_size(), 2);
    }
}
