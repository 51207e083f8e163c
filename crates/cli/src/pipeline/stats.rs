//! Session statistics.

use std::time::Duration;

use observability::SessionMetricsAggregator;

/// Statistics from a session run
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Presentation ticks executed
    pub ticks: u64,

    /// Ticks spent calibrating before presentation started
    pub calibration_ticks: u64,

    /// Final presentation delay, in clock frames
    pub delay_frames: f64,

    /// Total duration of the run
    pub duration: Duration,

    /// Number of configured sources
    pub active_sources: usize,

    /// In-memory metric aggregation
    pub metrics: SessionMetricsAggregator,
}

impl SessionStats {
    /// Ticks per second over the whole run
    pub fn ticks_per_second(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            (self.ticks + self.calibration_ticks) as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Session Statistics ===\n");
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Presentation ticks: {}", self.ticks);
        println!("Calibration ticks: {}", self.calibration_ticks);
        println!("Delay: {:.2} frames", self.delay_frames);
        println!("Active sources: {}", self.active_sources);
        println!("Throughput: {:.2} ticks/s", self.ticks_per_second());

        print!("\n{}", self.metrics.summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_per_second() {
        let stats = SessionStats {
            ticks: 90,
            calibration_ticks: 10,
            duration: Duration::from_secs(2),
            ..Default::default()
        };
        assert!((stats.ticks_per_second() - 50.0).abs() < 1e-9);

        assert_eq!(SessionStats::default().ticks_per_second(), 0.0);
    }
}
