//! Complete Session Demo
//!
//! Reads a session config file, wires the simulated sources, calibrates the
//! presentation delay and runs the synchronization loop.
//!
//! Run with: cargo run --bin complete_session [config_path]

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use config_loader::ConfigLoader;
use contracts::{CalibrationStatus, TimecodeSource, TimedDataSource, TimedSampleStatus};
use observability::SessionMetricsAggregator;
use sync_engine::sim::{ManualClock, SimulatedSource};
use sync_engine::Synchronizer;
use timecode::FrameTime;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize observability (Tracing + Prometheus)
    observability::init()?;

    info!("Starting Complete Session Demo");

    let config_path = resolve_config_path();
    info!(path = %config_path.display(), "Loading session config");
    let blueprint = ConfigLoader::load_from_path(config_path.as_path())?;
    info!(clock = %blueprint.clock.id, sources = blueprint.sources.len(), "Blueprint loaded");

    // ==== Stage 1: Build the source graph ====
    let clock = Rc::new(RefCell::new(ManualClock::new(
        blueprint.clock.id.clone(),
        blueprint.clock.rate,
    )));

    let mut synchronizer = Synchronizer::new("demo");
    synchronizer.set_timecode_source(Some(Rc::clone(&clock) as Rc<RefCell<dyn TimecodeSource>>));

    let sources: Vec<Rc<RefCell<SimulatedSource>>> = blueprint
        .sources
        .iter()
        .enumerate()
        .map(|(i, config)| {
            Rc::new(RefCell::new(SimulatedSource::from_config(
                config,
                i as u64 + 1,
            )))
        })
        .collect();
    for source in &sources {
        let as_dyn = Rc::clone(source) as Rc<RefCell<dyn TimedDataSource>>;
        synchronizer.add_data_source(&as_dyn);
    }
    synchronizer.set_delay(FrameTime::new(blueprint.session.delay_frames));

    let tick = |synchronizer: &mut Synchronizer| {
        clock.borrow_mut().advance_frames(1);
        if let Some(now) = clock.borrow().current_time() {
            for source in &sources {
                source.borrow_mut().ingest(&now);
            }
        }
        synchronizer.update();
    };

    // ==== Stage 2: Calibrate the presentation delay ====
    if blueprint.session.calibrate {
        info!("Calibrating...");
        synchronizer.start_calibration(blueprint.calibration.clone());
        let mut ticks = 0u32;
        while synchronizer.calibration_status() == CalibrationStatus::InProgress {
            tick(&mut synchronizer);
            ticks += 1;
        }
        info!(ticks, delay = %synchronizer.delay(), "Calibration complete");
    }

    // ==== Stage 3: Run the presentation loop ====
    let frame_count = blueprint.session.frame_count.max(1);
    info!(frames = frame_count, "Session running");

    let mut metrics = SessionMetricsAggregator::new();
    for _ in 0..frame_count {
        tick(&mut synchronizer);

        let delay = synchronizer.delay();
        let statuses: Vec<(String, TimedSampleStatus)> = sources
            .iter()
            .enumerate()
            .map(|(i, source)| {
                (
                    source.borrow().id().to_string(),
                    synchronizer.current_status(i).unwrap_or_default(),
                )
            })
            .collect();
        metrics.record_tick(
            statuses.iter().map(|(id, s)| (id.as_str(), *s)),
            delay.frame_number() as f64,
        );
    }

    print!("{}", metrics.summary());
    info!("Session complete");
    Ok(())
}

fn resolve_config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demos/session.toml"))
}
