//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Session, SessionConfig};

/// Execute the `run` command
pub async fn run_session(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading session");

    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Session file not found: {}", args.config.display());
    }

    // Load and parse configuration
    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load session from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(frames) = args.frames {
        info!(frames, "Overriding frame count from CLI");
        blueprint.session.frame_count = frames;
    }
    if let Some(delay) = args.delay {
        info!(delay, "Overriding presentation delay from CLI");
        blueprint.session.delay_frames = delay;
    }
    if args.no_calibrate {
        blueprint.session.calibrate = false;
    }

    info!(
        clock = %blueprint.clock.id,
        rate = %blueprint.clock.rate,
        sources = blueprint.sources.len(),
        frames = blueprint.session.frame_count,
        calibrate = blueprint.session.calibrate,
        "Session loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - session is valid, exiting");
        print_session_summary(&blueprint);
        return Ok(());
    }

    // Build session configuration
    let session_config = SessionConfig {
        blueprint,
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        realtime: args.realtime,
        seed: args.seed,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    // Create and run the session
    let session = Session::new(session_config);

    // Setup graceful shutdown handler
    let shutdown_signal = setup_shutdown_signal();

    info!("Starting session...");

    // Run session with shutdown signal
    tokio::select! {
        result = session.run() => {
            match result {
                Ok(stats) => {
                    info!(
                        ticks = stats.ticks,
                        calibration_ticks = stats.calibration_ticks,
                        duration_secs = stats.duration.as_secs_f64(),
                        tps = format!("{:.2}", stats.ticks_per_second()),
                        "Session completed successfully"
                    );

                    // Print detailed statistics
                    stats.print_summary();
                }
                Err(e) => {
                    return Err(e).context("Session execution failed");
                }
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping session...");
        }
    }

    info!("Livesync finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print session summary for dry-run mode
fn print_session_summary(blueprint: &contracts::SessionBlueprint) {
    println!("\n=== Session Summary ===\n");
    println!("Clock:");
    println!("  Id: {}", blueprint.clock.id);
    println!("  Rate: {}", blueprint.clock.rate);

    println!("\nSources ({}):", blueprint.sources.len());
    for source in &blueprint.sources {
        println!(
            "  - {} @ {} (latency {}f, jitter {}f, buffer {})",
            source.id,
            source.rate,
            source.latency_frames,
            source.jitter_frames,
            source.buffer_size
        );
    }

    println!("\nSession:");
    println!("  Frames: {}", blueprint.session.frame_count);
    println!("  Delay: {} frames", blueprint.session.delay_frames);
    println!("  Calibrate: {}", blueprint.session.calibrate);

    println!();
}
