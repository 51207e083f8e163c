//! Configuration validation.
//!
//! Rules:
//! - at least one source (derive-level)
//! - source ids unique and distinct from the clock id
//! - every frame rate valid and above 0 fps
//! - min_buffer_size <= max_buffer_size, buffer_size within those bounds

use std::collections::HashSet;

use contracts::{ContractError, SessionBlueprint};
use validator::Validate;

/// Validate a SessionBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    validate_derived_rules(blueprint)?;
    validate_source_ids(blueprint)?;
    validate_rates(blueprint)?;
    validate_buffer_bounds(blueprint)?;
    Ok(())
}

/// Run the `validator`-derive rules (non-empty sources, ranges)
fn validate_derived_rules(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    blueprint.validate().map_err(|e| {
        let first = e
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errors)| {
                let message = errors
                    .first()
                    .and_then(|error| error.message.as_deref())
                    .unwrap_or("invalid value");
                (field.to_string(), message.to_string())
            });
        match first {
            Some((field, message)) => ContractError::config_validation(field, message),
            None => ContractError::config_validation("blueprint", e.to_string()),
        }
    })
}

/// Source ids must be unique and must not collide with the clock id
fn validate_source_ids(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for source in &blueprint.sources {
        if source.id.is_empty() {
            return Err(ContractError::config_validation(
                "sources[].id",
                "source id cannot be empty",
            ));
        }
        if source.id == blueprint.clock.id {
            return Err(ContractError::config_validation(
                format!("sources[id={}]", source.id),
                "source id collides with the clock id",
            ));
        }
        if !seen.insert(source.id.as_str()) {
            return Err(ContractError::config_validation(
                format!("sources[id={}]", source.id),
                "duplicate source id",
            ));
        }
    }
    Ok(())
}

/// Every configured rate must be valid and above 0 fps
fn validate_rates(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    if !blueprint.clock.rate.is_valid() || blueprint.clock.rate.numerator() == 0 {
        return Err(ContractError::config_validation(
            "clock.rate",
            format!("clock rate must be a positive rate, got {}", blueprint.clock.rate),
        ));
    }
    for source in &blueprint.sources {
        if !source.rate.is_valid() || source.rate.numerator() == 0 {
            return Err(ContractError::config_validation(
                format!("sources[{}].rate", source.id),
                format!("source rate must be a positive rate, got {}", source.rate),
            ));
        }
    }
    Ok(())
}

/// Buffer bounds must be ordered and contain the initial size
fn validate_buffer_bounds(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    for source in &blueprint.sources {
        if let (Some(min), Some(max)) = (source.min_buffer_size, source.max_buffer_size) {
            if min > max {
                return Err(ContractError::config_validation(
                    format!("sources[{}].min_buffer_size", source.id),
                    format!("min_buffer_size ({min}) must be <= max_buffer_size ({max})"),
                ));
            }
        }
        if let Some(min) = source.min_buffer_size {
            if source.buffer_size < min {
                return Err(ContractError::config_validation(
                    format!("sources[{}].buffer_size", source.id),
                    format!("buffer_size ({}) is below min_buffer_size ({min})", source.buffer_size),
                ));
            }
        }
        if let Some(max) = source.max_buffer_size {
            if source.buffer_size > max {
                return Err(ContractError::config_validation(
                    format!("sources[{}].buffer_size", source.id),
                    format!("buffer_size ({}) is above max_buffer_size ({max})", source.buffer_size),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{CalibrationConfig, ClockConfig, SessionConfig, SourceConfig};
    use timecode::FrameRate;

    fn minimal_blueprint() -> SessionBlueprint {
        SessionBlueprint {
            clock: ClockConfig::default(),
            sources: vec![SourceConfig {
                id: "camera".into(),
                name: String::new(),
                rate: FrameRate::FPS_29_97,
                latency_frames: 5,
                jitter_frames: 1,
                buffer_size: 4,
                min_buffer_size: Some(2),
                max_buffer_size: Some(30),
                offset_frames: 0,
            }],
            session: SessionConfig::default(),
            calibration: CalibrationConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        let bp = minimal_blueprint();
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_empty_sources() {
        let mut bp = minimal_blueprint();
        bp.sources.clear();
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("at least one source"), "got: {err}");
    }

    #[test]
    fn test_duplicate_source_id() {
        let mut bp = minimal_blueprint();
        bp.sources.push(bp.sources[0].clone());
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("duplicate source id"), "got: {err}");
    }

    #[test]
    fn test_source_id_collides_with_clock() {
        let mut bp = minimal_blueprint();
        bp.sources[0].id = bp.clock.id.clone();
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("collides"), "got: {err}");
    }

    #[test]
    fn test_invalid_rate() {
        let mut bp = minimal_blueprint();
        bp.sources[0].rate = FrameRate::default();
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("positive rate"), "got: {err}");
    }

    #[test]
    fn test_inverted_buffer_bounds() {
        let mut bp = minimal_blueprint();
        bp.sources[0].min_buffer_size = Some(10);
        bp.sources[0].max_buffer_size = Some(5);
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("min_buffer_size"), "got: {err}");
    }

    #[test]
    fn test_buffer_size_outside_bounds() {
        let mut bp = minimal_blueprint();
        bp.sources[0].buffer_size = 1;
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("below min_buffer_size"), "got: {err}");

        let mut bp = minimal_blueprint();
        bp.sources[0].buffer_size = 100;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("above max_buffer_size"), "got: {err}");
    }
}
