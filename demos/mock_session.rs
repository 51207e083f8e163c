//! Mock Session Demo
//!
//! Builds a small source graph in code and synchronizes it with a fixed
//! presentation delay. No config file required.
//!
//! Run with: cargo run --bin mock_session

use std::cell::RefCell;
use std::rc::Rc;

use contracts::{SourceConfig, TimecodeSource, TimedDataSource, TimedSampleStatus};
use sync_engine::sim::{ManualClock, SimulatedSource};
use sync_engine::Synchronizer;
use timecode::{FrameRate, FrameTime};

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Mock Session Demo");

    // ==== Stage 1: Build the source graph in code ====
    let clock = Rc::new(RefCell::new(ManualClock::new(
        "clock".into(),
        FrameRate::FPS_30,
    )));

    let mut synchronizer = Synchronizer::new("demo");
    synchronizer.set_timecode_source(Some(Rc::clone(&clock) as Rc<RefCell<dyn TimecodeSource>>));

    let configs = [
        source_config("camera", 3, 8),
        source_config("audio", 1, 8),
    ];
    let sources: Vec<Rc<RefCell<SimulatedSource>>> = configs
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
    synchronizer.set_delay(FrameTime::new(5));

    // ==== Stage 2: Tick the session ====
    for tick in 1..=120u32 {
        clock.borrow_mut().advance_frames(1);
        if let Some(now) = clock.borrow().current_time() {
            for source in &sources {
                source.borrow_mut().ingest(&now);
            }
        }
        synchronizer.update();

        if tick % 30 == 0 {
            if let Some(now) = synchronizer.current_time() {
                let statuses: Vec<TimedSampleStatus> = synchronizer.statuses().collect();
                tracing::info!(
                    timecode = %now.to_timecode(),
                    statuses = ?statuses,
                    "Progress"
                );
            }
        }
    }

    // ==== Stage 3: Report ====
    for (i, source) in sources.iter().enumerate() {
        let source = source.borrow();
        tracing::info!(
            id = %source.id(),
            status = synchronizer.current_status(i).unwrap_or_default().as_str(),
            buffer = source.buffer_size(),
            "Final source state"
        );
    }

    tracing::info!("Mock session complete");
}

fn source_config(id: &str, latency_frames: u32, buffer_size: usize) -> SourceConfig {
    SourceConfig {
        id: id.into(),
        name: String::new(),
        rate: FrameRate::FPS_30,
        latency_frames,
        jitter_frames: 0,
        buffer_size,
        min_buffer_size: None,
        max_buffer_size: None,
        offset_frames: 0,
    }
}
