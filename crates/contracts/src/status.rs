//! Result statuses reported by sources and the calibration state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of presenting a timed-data source at a target time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimedSampleStatus {
    /// A sample for the target time was presented.
    Ok,
    /// The target time is newer than the newest buffered sample; the data
    /// has not arrived yet.
    Behind,
    /// The target time is older than the oldest buffered sample; the data
    /// has already been evicted.
    Ahead,
    /// The source has no samples at all.
    #[default]
    DataMissing,
}

impl TimedSampleStatus {
    /// Stable label used for metrics and logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Behind => "behind",
            Self::Ahead => "ahead",
            Self::DataMissing => "data_missing",
        }
    }
}

impl fmt::Display for TimedSampleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a synchronizer's calibration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationStatus {
    /// No calibration has run yet.
    #[default]
    Idle,
    /// A calibration is advancing one step per synchronizer update.
    InProgress,
    /// The last calibration ran to completion.
    Completed,
}

impl CalibrationStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for CalibrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_labels() {
        assert_eq!(
            serde_json::to_string(&TimedSampleStatus::DataMissing).unwrap(),
            "\"data_missing\""
        );
        assert_eq!(
            serde_json::from_str::<CalibrationStatus>("\"in_progress\"").unwrap(),
            CalibrationStatus::InProgress
        );
    }

    #[test]
    fn test_default_status_is_missing() {
        assert_eq!(TimedSampleStatus::default(), TimedSampleStatus::DataMissing);
        assert_eq!(CalibrationStatus::default(), CalibrationStatus::Idle);
    }
}
