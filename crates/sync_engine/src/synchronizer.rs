//! The synchronizer: one clock, many timed-data sources.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use contracts::{
    CalibrationConfig, CalibrationStatus, SourceId, TimecodeSource, TimedDataSource,
    TimedSampleStatus,
};
use metrics::{counter, gauge};
use timecode::{FrameRate, FrameTime, FrameTimeWithRate, TimeError};
use tracing::{info, instrument, trace};

use crate::{CalibrationStep, DelayCalibrator, SyncCalibrator};

struct SourceEntry {
    source: Weak<RefCell<dyn TimedDataSource>>,
    status: TimedSampleStatus,
}

/// Presents a group of timed-data sources against a single timecode source.
///
/// Each [`update`](Self::update) reads the clock, subtracts the global
/// delay, remaps the target into every source's rate, subtracts the
/// source's offset and asks it to present. Sources are held weakly so a
/// dropped source never keeps presenting; it reports `DataMissing` until
/// removed.
pub struct Synchronizer {
    id: SourceId,
    delay: FrameTime,
    timecode_source: Option<Rc<RefCell<dyn TimecodeSource>>>,
    sources: Vec<SourceEntry>,
    calibration_status: CalibrationStatus,
    calibrator: Option<Box<dyn SyncCalibrator>>,
}

impl Synchronizer {
    pub fn new(id: impl Into<SourceId>) -> Self {
        Self {
            id: id.into(),
            delay: FrameTime::default(),
            timecode_source: None,
            sources: Vec::new(),
            calibration_status: CalibrationStatus::Idle,
            calibrator: None,
        }
    }

    pub fn id(&self) -> &SourceId {
        &self.id
    }

    pub fn timecode_source(&self) -> Option<&Rc<RefCell<dyn TimecodeSource>>> {
        self.timecode_source.as_ref()
    }

    pub fn set_timecode_source(&mut self, source: Option<Rc<RefCell<dyn TimecodeSource>>>) {
        self.timecode_source = source;
    }

    /// Global presentation delay, in clock frames.
    pub fn delay(&self) -> FrameTime {
        self.delay
    }

    pub fn set_delay(&mut self, delay: FrameTime) {
        self.delay = delay;
    }

    /// The clock's current time, if a clock is set and has signal.
    pub fn current_time(&self) -> Option<FrameTimeWithRate> {
        self.timecode_source
            .as_ref()
            .and_then(|source| source.borrow().current_time())
    }

    /// The time sources are currently presented at: the clock time minus
    /// the delay.
    pub fn presentation_time(&self) -> Option<FrameTimeWithRate> {
        let now = self.current_time()?;
        let time = now.time().try_sub(self.delay).ok()?;
        Some(FrameTimeWithRate::new(now.rate(), time))
    }

    /// Attach a data source. Returns false when it is already attached.
    /// The source's synchronizer back-reference is set to this id.
    pub fn add_data_source(&mut self, source: &Rc<RefCell<dyn TimedDataSource>>) -> bool {
        let already_attached = self.sources.iter().any(|entry| {
            entry
                .source
                .upgrade()
                .is_some_and(|existing| Rc::ptr_eq(&existing, source))
        });
        if already_attached {
            return false;
        }
        source.borrow_mut().set_synchronizer(Some(self.id.clone()));
        self.sources.push(SourceEntry {
            source: Rc::downgrade(source),
            status: TimedSampleStatus::DataMissing,
        });
        true
    }

    pub fn remove_data_source(&mut self, source: &Rc<RefCell<dyn TimedDataSource>>) {
        let index = self.sources.iter().position(|entry| {
            entry
                .source
                .upgrade()
                .is_some_and(|existing| Rc::ptr_eq(&existing, source))
        });
        if let Some(index) = index {
            self.remove_data_source_at(index);
        }
    }

    /// Detach the source at `index`; out-of-range indices are ignored.
    pub fn remove_data_source_at(&mut self, index: usize) {
        if index >= self.sources.len() {
            return;
        }
        let entry = self.sources.remove(index);
        if let Some(source) = entry.source.upgrade() {
            let mut source = source.borrow_mut();
            source.set_synchronizer(None);
            source.set_is_synchronized(false);
        }
    }

    /// Number of attached slots, dead sources included.
    pub fn data_source_count(&self) -> usize {
        self.sources.len()
    }

    /// The source at `index`, or `None` when out of range or dropped.
    pub fn get_data_source(&self, index: usize) -> Option<Rc<RefCell<dyn TimedDataSource>>> {
        self.sources.get(index).and_then(|entry| entry.source.upgrade())
    }

    /// The last presentation status of the source at `index`.
    pub fn current_status(&self, index: usize) -> Option<TimedSampleStatus> {
        self.sources.get(index).map(|entry| entry.status)
    }

    pub fn statuses(&self) -> impl Iterator<Item = TimedSampleStatus> + '_ {
        self.sources.iter().map(|entry| entry.status)
    }

    pub fn calibration_status(&self) -> CalibrationStatus {
        self.calibration_status
    }

    /// Begin calibrating with the default delay calibrator. Returns false
    /// when a calibration is already in progress.
    pub fn start_calibration(&mut self, config: CalibrationConfig) -> bool {
        self.start_calibration_with(Box::new(DelayCalibrator::new(config)))
    }

    pub fn start_calibration_with(&mut self, calibrator: Box<dyn SyncCalibrator>) -> bool {
        if self.calibration_status == CalibrationStatus::InProgress {
            return false;
        }
        self.calibrator = Some(calibrator);
        self.calibration_status = CalibrationStatus::InProgress;
        true
    }

    /// Abandon an in-progress calibration, keeping the current delay.
    pub fn stop_calibration(&mut self) {
        if self.calibrator.take().is_some() {
            self.calibration_status = CalibrationStatus::Idle;
        }
    }

    /// Run one synchronization tick.
    #[instrument(skip(self), fields(synchronizer = %self.id))]
    pub fn update(&mut self) {
        let Some(now) = self.current_time() else {
            // No clock signal: nothing can be presented this tick.
            for entry in &mut self.sources {
                entry.status = TimedSampleStatus::DataMissing;
                if let Some(source) = entry.source.upgrade() {
                    source.borrow_mut().set_is_synchronized(false);
                }
            }
            return;
        };

        self.step_calibration(&now);

        let clock_rate = now.rate();
        let base = now.time().try_sub(self.delay);
        for entry in &mut self.sources {
            let Some(source) = entry.source.upgrade() else {
                entry.status = TimedSampleStatus::DataMissing;
                continue;
            };
            let mut source = source.borrow_mut();
            let status = match presentation_target(base, &clock_rate, &*source) {
                Some(target) => source.present_at(&target),
                None => TimedSampleStatus::DataMissing,
            };
            source.set_is_synchronized(true);
            entry.status = status;

            trace!(source = %source.id(), status = status.as_str(), "presented");
            counter!(
                "livesync_present_total",
                "source_id" => source.id().to_string(),
                "status" => status.as_str()
            )
            .increment(1);
        }

        gauge!("livesync_delay_frames")
            .set(self.delay.frame_number() as f64 + self.delay.subframe().as_f64());
    }

    fn step_calibration(&mut self, now: &FrameTimeWithRate) {
        let Some(mut calibrator) = self.calibrator.take() else {
            return;
        };
        let live: Vec<Rc<RefCell<dyn TimedDataSource>>> = self
            .sources
            .iter()
            .filter_map(|entry| entry.source.upgrade())
            .collect();
        match calibrator.step(now, &live) {
            CalibrationStep::InProgress => {
                self.calibrator = Some(calibrator);
            }
            CalibrationStep::Done(result) => {
                self.delay = result.delay;
                self.calibration_status = result.status;
                info!(delay = %self.delay, "calibration finished");
            }
        }
    }
}

/// The time `base` (clock rate, delay already removed) expressed in the
/// source's rate with its offset removed. `None` when any step overflows.
fn presentation_target(
    base: Result<FrameTime, TimeError>,
    clock_rate: &FrameRate,
    source: &dyn TimedDataSource,
) -> Option<FrameTimeWithRate> {
    let base = base.ok()?;
    let rate = source.frame_rate();
    let local = base.remap(clock_rate, &rate).ok()?;
    let target = local.try_sub(source.offset()).ok()?;
    Some(FrameTimeWithRate::new(rate, target))
}
