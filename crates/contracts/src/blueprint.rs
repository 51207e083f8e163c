//! Session blueprint: the deserialized form of a session config file.

use serde::{Deserialize, Serialize};
use timecode::FrameRate;
use validator::Validate;

use crate::SourceId;

/// Complete description of a synchronization session.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionBlueprint {
    /// The clock driving the session.
    #[serde(default)]
    pub clock: ClockConfig,

    /// Data sources to synchronize.
    #[serde(default)]
    #[validate(length(min = 1, message = "at least one source is required"))]
    #[validate(nested)]
    pub sources: Vec<SourceConfig>,

    /// Session-wide settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Calibration tuning.
    #[serde(default)]
    pub calibration: CalibrationConfig,
}

/// Timecode source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "default_clock_id")]
    pub id: SourceId,

    /// Name shown in logs and summaries.
    #[serde(default)]
    pub name: String,

    #[serde(default = "default_rate")]
    pub rate: FrameRate,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            id: default_clock_id(),
            name: String::new(),
            rate: default_rate(),
        }
    }
}

/// One simulated data source.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SourceConfig {
    pub id: SourceId,

    /// Name shown in logs and summaries; defaults to the id.
    #[serde(default)]
    pub name: String,

    #[serde(default = "default_rate")]
    pub rate: FrameRate,

    /// Frames between a sample being generated and it arriving.
    #[serde(default)]
    pub latency_frames: u32,

    /// Maximum extra delivery latency, uniformly random per sample.
    #[serde(default)]
    pub jitter_frames: u32,

    /// Initial sample buffer capacity.
    #[serde(default = "default_buffer_size")]
    #[validate(range(min = 1, message = "buffer_size must be at least 1"))]
    pub buffer_size: usize,

    #[serde(default)]
    pub min_buffer_size: Option<usize>,

    #[serde(default)]
    pub max_buffer_size: Option<usize>,

    /// Constant timestamp offset of this source, in its own frames.
    #[serde(default)]
    pub offset_frames: i32,
}

/// Session-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Global presentation delay, in clock frames.
    #[serde(default)]
    pub delay_frames: i32,

    /// Frames to run before stopping (0 = until interrupted).
    #[serde(default = "default_frame_count")]
    pub frame_count: u64,

    /// Run a calibration pass before presenting.
    #[serde(default = "default_true")]
    pub calibrate: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            delay_frames: 0,
            frame_count: default_frame_count(),
            calibrate: true,
        }
    }
}

/// Calibration tuning parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Observations of a source before its latency estimate counts as
    /// reliable.
    #[serde(default = "default_required_good_samples")]
    pub required_good_samples: u32,

    /// Safety margin added on top of the delay when sizing buffers.
    #[serde(default = "default_buffer_margin")]
    pub buffer_margin_frames: u32,

    /// Hard bound on calibration steps; completion is forced there.
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            required_good_samples: default_required_good_samples(),
            buffer_margin_frames: default_buffer_margin(),
            max_steps: default_max_steps(),
        }
    }
}

fn default_clock_id() -> SourceId {
    SourceId::new("clock")
}

fn default_rate() -> FrameRate {
    FrameRate::FPS_30
}

fn default_buffer_size() -> usize {
    1
}

fn default_frame_count() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

fn default_required_good_samples() -> u32 {
    60
}

fn default_buffer_margin() -> u32 {
    2
}

fn default_max_steps() -> u32 {
    1200
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let calibration = CalibrationConfig::default();
        assert_eq!(calibration.required_good_samples, 60);
        assert_eq!(calibration.buffer_margin_frames, 2);
        assert_eq!(calibration.max_steps, 1200);

        let session = SessionConfig::default();
        assert_eq!(session.frame_count, 300);
        assert!(session.calibrate);

        assert_eq!(ClockConfig::default().rate, FrameRate::FPS_30);
    }

    #[test]
    fn test_minimal_toml() {
        let blueprint: SessionBlueprint = toml::from_str(
            r#"
            [[sources]]
            id = "camera"
            latency_frames = 5
            "#,
        )
        .unwrap();

        assert_eq!(blueprint.clock.id, "clock");
        assert_eq!(blueprint.sources.len(), 1);
        assert_eq!(blueprint.sources[0].buffer_size, 1);
        assert_eq!(blueprint.sources[0].rate, FrameRate::FPS_30);
        assert_eq!(blueprint.sources[0].latency_frames, 5);
    }

    #[test]
    fn test_validate_rejects_empty_sources() {
        use validator::Validate;

        let blueprint: SessionBlueprint = toml::from_str("").unwrap();
        assert!(blueprint.validate().is_err());
    }

    #[test]
    fn test_rate_is_normalized_on_load() {
        let config: SourceConfig = toml::from_str(
            r#"
            id = "cam"
            rate = { numerator = 48000, denominator = 2002, is_drop_frame = true }
            "#,
        )
        .unwrap();
        assert_eq!(config.rate, FrameRate::FPS_23_976_DF);
    }
}
