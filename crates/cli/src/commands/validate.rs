//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    clock_id: String,
    clock_rate: String,
    source_count: usize,
    frame_count: u64,
    calibrate: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating session");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Session validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    clock_id: blueprint.clock.id.to_string(),
                    clock_rate: blueprint.clock.rate.to_string(),
                    source_count: blueprint.sources.len(),
                    frame_count: blueprint.session.frame_count,
                    calibrate: blueprint.session.calibrate,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &contracts::SessionBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    // Without calibration, a fixed delay has to cover the worst latency.
    if !blueprint.session.calibrate {
        for source in &blueprint.sources {
            let worst = source.latency_frames + source.jitter_frames;
            if worst as i64 > blueprint.session.delay_frames as i64 {
                warnings.push(format!(
                    "Source '{}' can lag up to {} frames but the fixed delay is {} - \
                     expect 'behind' statuses",
                    source.id, worst, blueprint.session.delay_frames
                ));
            }
        }
    }

    // Rates that are not multiples of the clock rate remap with subframe
    // rounding.
    for source in &blueprint.sources {
        if source.rate != blueprint.clock.rate
            && !source.rate.is_multiple_of(&blueprint.clock.rate)
            && !source.rate.is_factor_of(&blueprint.clock.rate)
        {
            warnings.push(format!(
                "Source '{}' rate {} is unrelated to the clock rate {} - \
                 presentation targets will carry subframe offsets",
                source.id, source.rate, blueprint.clock.rate
            ));
        }
    }

    if blueprint.session.frame_count == 0 {
        warnings.push("session.frame_count is 0 - the session runs until interrupted".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Session is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Clock: {} @ {}", summary.clock_id, summary.clock_rate);
            println!("  Sources: {}", summary.source_count);
            println!("  Frames: {}", summary.frame_count);
            println!("  Calibrate: {}", summary.calibrate);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Session is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
