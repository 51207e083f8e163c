//! Delay calibration.
//!
//! Calibration watches how far each source's newest sample trails the clock
//! and picks the smallest global delay that keeps every source presentable.
//! It runs as a step function so the owner can advance it from the same
//! tick loop that drives presentation.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use contracts::{CalibrationConfig, CalibrationStatus, SourceId, TimedDataSource};
use metrics::histogram;
use serde::Serialize;
use timecode::{FrameTime, FrameTimeWithRate};
use tracing::debug;

/// Outcome of a finished calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalibrationResult {
    pub status: CalibrationStatus,
    /// Presentation delay to apply, in clock frames.
    pub delay: FrameTime,
}

/// One advance of a calibrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStep {
    InProgress,
    Done(CalibrationResult),
}

/// A resumable calibration advanced once per synchronizer tick.
pub trait SyncCalibrator {
    fn step(
        &mut self,
        now: &FrameTimeWithRate,
        sources: &[Rc<RefCell<dyn TimedDataSource>>],
    ) -> CalibrationStep;
}

#[derive(Default)]
struct SourceObservation {
    /// Worst observed latency, in clock frames.
    max_latency: FrameTime,
    samples: u32,
}

/// Measures per-source delivery latency and converges on the max.
///
/// Each step records, for every source with buffered samples, how far the
/// newest sample trails the clock. The delay estimate is the ceiling of the
/// worst latency among sources observed at least `required_good_samples`
/// times. Buffers are grown (never shrunk) to hold the delay plus a safety
/// margin, clamped to the source's own bounds.
///
/// The calibration finishes when every source has been observed at least
/// `required_good_samples` times and the estimate stopped growing, or
/// unconditionally at `max_steps`. It always finishes `Completed`.
pub struct DelayCalibrator {
    config: CalibrationConfig,
    steps: u32,
    delay: FrameTime,
    observations: HashMap<SourceId, SourceObservation>,
}

impl DelayCalibrator {
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            steps: 0,
            delay: FrameTime::default(),
            observations: HashMap::new(),
        }
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn delay(&self) -> FrameTime {
        self.delay
    }

    fn observe(&mut self, now: &FrameTimeWithRate, source: &dyn TimedDataSource) -> bool {
        let Some((_, newest)) = source.time_range() else {
            // Nothing buffered yet, keep waiting for this source.
            return false;
        };
        let clock_rate = now.rate();
        // Undo the source offset, then express the newest sample on the
        // clock's timeline.
        let newest_on_clock = newest
            .try_add(source.offset())
            .and_then(|t| t.remap(&source.frame_rate(), &clock_rate));
        let latency = newest_on_clock.and_then(|t| now.time().try_sub(t));
        let Ok(latency) = latency else {
            return false;
        };

        histogram!(
            "livesync_calibration_latency_frames",
            "source_id" => source.id().to_string()
        )
        .record(latency.frame_number() as f64 + latency.subframe().as_f64());

        let observation = self.observations.entry(source.id().clone()).or_default();
        if latency > observation.max_latency {
            observation.max_latency = latency;
        }
        observation.samples += 1;
        observation.samples >= self.config.required_good_samples
    }

    fn size_buffer(&self, source: &mut dyn TimedDataSource) {
        let required =
            self.delay.frame_number().max(0) as usize + self.config.buffer_margin_frames as usize;
        let mut target = required;
        if let Some(max) = source.max_buffer_size() {
            target = target.min(max);
        }
        if let Some(min) = source.min_buffer_size() {
            target = target.max(min);
        }
        // Grow only; shrinking a live buffer would discard usable samples.
        if target > source.buffer_size() {
            source.set_buffer_size(target);
        }
    }
}

impl SyncCalibrator for DelayCalibrator {
    fn step(
        &mut self,
        now: &FrameTimeWithRate,
        sources: &[Rc<RefCell<dyn TimedDataSource>>],
    ) -> CalibrationStep {
        self.steps += 1;

        if sources.is_empty() {
            return CalibrationStep::Done(CalibrationResult {
                status: CalibrationStatus::Completed,
                delay: self.delay,
            });
        }

        let mut all_reliable = true;
        for source in sources {
            let source = source.borrow();
            if !self.observe(now, &*source) {
                all_reliable = false;
            }
        }

        // Only reliably observed sources drive the estimate; a source seen
        // a handful of times may not have shown its worst latency yet.
        let mut estimate = FrameTime::default();
        for observation in self.observations.values() {
            if observation.samples >= self.config.required_good_samples
                && observation.max_latency > estimate
            {
                estimate = observation.max_latency;
            }
        }
        let estimate = estimate.ceil();
        let grew = estimate > self.delay;
        if grew {
            debug!(steps = self.steps, delay = %estimate, "delay estimate grew");
        }
        self.delay = estimate;

        for source in sources {
            self.size_buffer(&mut *source.borrow_mut());
        }

        if (all_reliable && !grew) || self.steps >= self.config.max_steps {
            CalibrationStep::Done(CalibrationResult {
                status: CalibrationStatus::Completed,
                delay: self.delay,
            })
        } else {
            CalibrationStep::InProgress
        }
    }
}

impl Default for DelayCalibrator {
    fn default() -> Self {
        Self::new(CalibrationConfig::default())
    }
}
