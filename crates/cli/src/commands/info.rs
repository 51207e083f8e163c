//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Session info for JSON output
#[derive(Serialize)]
struct SessionInfo {
    clock: ClockInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sources: Vec<SourceInfo>,
    session: SettingsInfo,
    calibration: CalibrationInfo,
}

#[derive(Serialize)]
struct ClockInfo {
    id: String,
    rate: String,
    drop_frame: bool,
}

#[derive(Serialize)]
struct SourceInfo {
    id: String,
    rate: String,
    latency_frames: u32,
    jitter_frames: u32,
    buffer_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_buffer_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_buffer_size: Option<usize>,
    offset_frames: i32,
}

#[derive(Serialize)]
struct SettingsInfo {
    delay_frames: i32,
    frame_count: u64,
    calibrate: bool,
}

#[derive(Serialize)]
struct CalibrationInfo {
    required_good_samples: u32,
    buffer_margin_frames: u32,
    max_steps: u32,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading session info");

    if !args.config.exists() {
        anyhow::bail!("Session file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load session from {}", args.config.display()))?;

    if args.json {
        let info = build_session_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize session info")?;
        println!("{}", json);
    } else {
        print_session_info(&blueprint, args);
    }

    Ok(())
}

fn build_session_info(blueprint: &contracts::SessionBlueprint, args: &InfoArgs) -> SessionInfo {
    let sources = if args.sources {
        blueprint
            .sources
            .iter()
            .map(|s| SourceInfo {
                id: s.id.to_string(),
                rate: s.rate.to_string(),
                latency_frames: s.latency_frames,
                jitter_frames: s.jitter_frames,
                buffer_size: s.buffer_size,
                min_buffer_size: s.min_buffer_size,
                max_buffer_size: s.max_buffer_size,
                offset_frames: s.offset_frames,
            })
            .collect()
    } else {
        Vec::new()
    };

    SessionInfo {
        clock: ClockInfo {
            id: blueprint.clock.id.to_string(),
            rate: blueprint.clock.rate.to_string(),
            drop_frame: blueprint.clock.rate.is_drop_frame(),
        },
        sources,
        session: SettingsInfo {
            delay_frames: blueprint.session.delay_frames,
            frame_count: blueprint.session.frame_count,
            calibrate: blueprint.session.calibrate,
        },
        calibration: CalibrationInfo {
            required_good_samples: blueprint.calibration.required_good_samples,
            buffer_margin_frames: blueprint.calibration.buffer_margin_frames,
            max_steps: blueprint.calibration.max_steps,
        },
    }
}

fn print_session_info(blueprint: &contracts::SessionBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Livesync Session                            ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    // Clock
    println!("🕒 Clock");
    println!("   ├─ Id: {}", blueprint.clock.id);
    println!("   └─ Rate: {}", blueprint.clock.rate);

    // Sources
    println!("\n🎥 Sources ({})", blueprint.sources.len());
    for (i, source) in blueprint.sources.iter().enumerate() {
        let is_last = i == blueprint.sources.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!("   {} {} @ {}", prefix, source.id, source.rate);

        if args.sources {
            println!(
                "   {}  ├─ Latency: {} frames (+{} jitter)",
                child_prefix, source.latency_frames, source.jitter_frames
            );
            let bounds = match (source.min_buffer_size, source.max_buffer_size) {
                (Some(min), Some(max)) => format!(" (bounds {min}..={max})"),
                (Some(min), None) => format!(" (min {min})"),
                (None, Some(max)) => format!(" (max {max})"),
                (None, None) => String::new(),
            };
            println!(
                "   {}  ├─ Buffer: {} frames{}",
                child_prefix, source.buffer_size, bounds
            );
            println!("   {}  └─ Offset: {} frames", child_prefix, source.offset_frames);
        }
    }

    // Session settings
    println!("\n⚙️  Session");
    println!("   ├─ Delay: {} frames", blueprint.session.delay_frames);
    println!("   ├─ Frames: {}", blueprint.session.frame_count);
    println!("   └─ Calibrate: {}", blueprint.session.calibrate);

    // Calibration tuning
    println!("\n📏 Calibration");
    println!(
        "   ├─ Required good samples: {}",
        blueprint.calibration.required_good_samples
    );
    println!(
        "   ├─ Buffer margin: {} frames",
        blueprint.calibration.buffer_margin_frames
    );
    println!("   └─ Max steps: {}", blueprint.calibration.max_steps);

    println!();
}
