//! Session metric collection.
//!
//! The synchronizer emits its own per-source presentation counters; the
//! helpers here cover what the driving loop knows instead (tick timing,
//! buffer depths, calibration outcome) plus an in-memory aggregator for the
//! end-of-run summary.

use std::collections::{BTreeMap, HashMap};

use contracts::TimedSampleStatus;
use metrics::{counter, gauge, histogram};
use serde::Serialize;

/// Record how long one synchronization tick took
pub fn record_tick_duration_ms(duration_ms: f64) {
    histogram!("livesync_tick_duration_ms").record(duration_ms);
}

/// Record the clock position, in seconds
pub fn record_clock_seconds(seconds: f64) {
    gauge!("livesync_clock_seconds").set(seconds);
}

/// Record a source's current buffer capacity
pub fn record_buffer_size(source_id: &str, size: usize) {
    gauge!(
        "livesync_buffer_size_frames",
        "source_id" => source_id.to_string()
    )
    .set(size as f64);
}

/// Record a finished calibration
pub fn record_calibration_result(steps: u32, delay_frames: f64) {
    counter!("livesync_calibrations_total").increment(1);
    gauge!("livesync_calibration_steps").set(steps as f64);
    gauge!("livesync_calibrated_delay_frames").set(delay_frames);
}

/// Per-source presentation status counts
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SourceSummary {
    pub ok: u64,
    pub behind: u64,
    pub ahead: u64,
    pub data_missing: u64,
}

impl SourceSummary {
    pub fn record(&mut self, status: TimedSampleStatus) {
        match status {
            TimedSampleStatus::Ok => self.ok += 1,
            TimedSampleStatus::Behind => self.behind += 1,
            TimedSampleStatus::Ahead => self.ahead += 1,
            TimedSampleStatus::DataMissing => self.data_missing += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.ok + self.behind + self.ahead + self.data_missing
    }

    /// Percentage of ticks that presented a sample
    pub fn ok_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.ok as f64 / total as f64 * 100.0
        }
    }
}

/// Session metrics aggregator
///
/// Aggregates in memory so a summary can be printed at the end of a run.
#[derive(Debug, Clone, Default)]
pub struct SessionMetricsAggregator {
    /// Total synchronization ticks
    pub total_ticks: u64,

    /// Per-source status counts
    pub source_counts: HashMap<String, SourceSummary>,

    /// Presentation delay over the run, in frames
    pub delay_stats: RunningStats,

    /// Tick duration statistics, in milliseconds
    pub tick_stats: RunningStats,
}

impl SessionMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one tick's outcome for every source
    pub fn record_tick<'a>(
        &mut self,
        statuses: impl IntoIterator<Item = (&'a str, TimedSampleStatus)>,
        delay_frames: f64,
    ) {
        self.total_ticks += 1;
        self.delay_stats.push(delay_frames);
        for (source_id, status) in statuses {
            self.source_counts
                .entry(source_id.to_string())
                .or_default()
                .record(status);
        }
    }

    pub fn record_tick_duration_ms(&mut self, duration_ms: f64) {
        self.tick_stats.push(duration_ms);
    }

    /// Produce the end-of-run summary
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_ticks: self.total_ticks,
            delay_frames: StatsSummary::from(&self.delay_stats),
            tick_duration_ms: StatsSummary::from(&self.tick_stats),
            sources: self
                .source_counts
                .iter()
                .map(|(id, counts)| (id.clone(), *counts))
                .collect(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSummary {
    pub total_ticks: u64,
    pub delay_frames: StatsSummary,
    pub tick_duration_ms: StatsSummary,
    pub sources: BTreeMap<String, SourceSummary>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Session Summary ===")?;
        writeln!(f, "Total ticks: {}", self.total_ticks)?;
        writeln!(f, "Delay (frames): {}", self.delay_frames)?;
        writeln!(f, "Tick duration (ms): {}", self.tick_duration_ms)?;

        if !self.sources.is_empty() {
            writeln!(f, "Sources:")?;
            for (source, counts) in &self.sources {
                writeln!(
                    f,
                    "  {}: ok={} ({:.2}%), behind={}, ahead={}, missing={}",
                    source,
                    counts.ok,
                    counts.ok_rate(),
                    counts.behind,
                    counts.ahead,
                    counts.data_missing
                )?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
