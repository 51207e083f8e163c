//! Session orchestrator - builds the source graph and drives the tick loop.
//!
//! The graph is single-threaded by design: sources and the clock are shared
//! `Rc<RefCell<_>>` handles, and every tick advances the clock, feeds the
//! simulated sources and updates the synchronizer in one pass.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Result;
use contracts::{
    CalibrationStatus, SessionBlueprint, TimecodeSource, TimecodeSourceRegistry, TimedDataSource,
    TimedDataSourceRegistry, TimedSampleStatus,
};
use observability::{
    record_buffer_size, record_calibration_result, record_clock_seconds, record_tick_duration_ms,
};
use sync_engine::sim::{ManualClock, SimulatedSource};
use sync_engine::Synchronizer;
use timecode::FrameTime;
use tracing::{info, warn};

use super::SessionStats;

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// The session blueprint
    pub blueprint: SessionBlueprint,

    /// Session timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Pace ticks at the clock rate instead of running flat out
    pub realtime: bool,

    /// Seed for simulated delivery jitter
    pub seed: u64,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main session orchestrator
pub struct Session {
    config: SessionConfig,
}

impl Session {
    /// Create a new session with the given configuration
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Run the session to completion
    pub async fn run(self) -> Result<SessionStats> {
        let start_time = Instant::now();

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let session_task = self.run_session(start_time);

        // Run with optional timeout
        let stats = if let Some(timeout) = self.config.timeout {
            match tokio::time::timeout(timeout, session_task).await {
                Ok(stats) => stats?,
                Err(_) => {
                    warn!(timeout_secs = timeout.as_secs(), "Session timed out");
                    SessionStats::default()
                }
            }
        } else {
            session_task.await?
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            tps = format!("{:.2}", stats.ticks_per_second()),
            "Session shutdown complete"
        );

        Ok(stats)
    }

    async fn run_session(&self, start_time: Instant) -> Result<SessionStats> {
        let blueprint = &self.config.blueprint;

        // Build the source graph
        info!("Building source graph...");
        let mut clock = ManualClock::new(blueprint.clock.id.clone(), blueprint.clock.rate);
        if !blueprint.clock.name.is_empty() {
            clock = clock.with_name(blueprint.clock.name.clone());
        }
        let clock = Rc::new(RefCell::new(clock));

        let mut timecode_registry = TimecodeSourceRegistry::new();
        timecode_registry.register(blueprint.clock.id.clone(), Rc::clone(&clock) as _);

        let mut synchronizer = Synchronizer::new("session");
        synchronizer.set_timecode_source(timecode_registry.get(&blueprint.clock.id));

        let mut data_registry = TimedDataSourceRegistry::new();
        let mut sources: Vec<Rc<RefCell<SimulatedSource>>> = Vec::new();
        for (i, config) in blueprint.sources.iter().enumerate() {
            let source = Rc::new(RefCell::new(SimulatedSource::from_config(
                config,
                self.config.seed.wrapping_add(i as u64),
            )));
            let as_dyn: Rc<RefCell<dyn TimedDataSource>> = Rc::clone(&source) as _;
            if !data_registry.register(config.id.clone(), Rc::clone(&as_dyn)) {
                anyhow::bail!("Duplicate source id: {}", config.id);
            }
            synchronizer.add_data_source(&as_dyn);
            sources.push(source);
        }
        synchronizer.set_delay(FrameTime::new(blueprint.session.delay_frames));

        info!(
            clock = %blueprint.clock.id,
            sources = data_registry.len(),
            delay_frames = blueprint.session.delay_frames,
            "Source graph built"
        );

        let mut ticker = self.config.realtime.then(|| {
            tokio::time::interval(Duration::from_secs_f64(blueprint.clock.rate.frame_interval()))
        });

        let mut stats = SessionStats {
            active_sources: sources.len(),
            ..Default::default()
        };

        // Calibration pass
        if blueprint.session.calibrate {
            info!("Calibrating presentation delay...");
            synchronizer.start_calibration(blueprint.calibration.clone());
            while synchronizer.calibration_status() == CalibrationStatus::InProgress {
                run_tick(&clock, &sources, &mut synchronizer, &mut ticker).await;
                stats.calibration_ticks += 1;
            }
            let delay = synchronizer.delay();
            record_calibration_result(stats.calibration_ticks as u32, frames_f64(delay));
            info!(
                ticks = stats.calibration_ticks,
                delay = %delay,
                "Calibration complete"
            );
        }

        // Presentation loop
        let frame_count = blueprint.session.frame_count;
        let log_every = nominal_fps(blueprint) as u64;
        info!(frames = frame_count, "Session running");

        let mut tick_index: u64 = 0;
        while frame_count == 0 || tick_index < frame_count {
            let tick_start = Instant::now();
            run_tick(&clock, &sources, &mut synchronizer, &mut ticker).await;
            tick_index += 1;

            let delay = frames_f64(synchronizer.delay());
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
            stats
                .metrics
                .record_tick(statuses.iter().map(|(id, s)| (id.as_str(), *s)), delay);

            let elapsed_ms = tick_start.elapsed().as_secs_f64() * 1000.0;
            record_tick_duration_ms(elapsed_ms);
            stats.metrics.record_tick_duration_ms(elapsed_ms);

            if let Some(now) = synchronizer.current_time() {
                record_clock_seconds(now.to_seconds());

                // Once a second of clock time, log where we are.
                if tick_index % log_every == 0 {
                    info!(
                        timecode = %now.to_timecode(),
                        tick = tick_index,
                        "Session progress"
                    );
                }
            }
            for source in &sources {
                let source = source.borrow();
                record_buffer_size(source.id(), source.buffer_size());
            }
        }

        stats.ticks = tick_index;
        stats.delay_frames = frames_f64(synchronizer.delay());
        stats.duration = start_time.elapsed();
        Ok(stats)
    }
}

/// One tick: pace, advance the clock, feed the sources, synchronize.
async fn run_tick(
    clock: &Rc<RefCell<ManualClock>>,
    sources: &[Rc<RefCell<SimulatedSource>>],
    synchronizer: &mut Synchronizer,
    ticker: &mut Option<tokio::time::Interval>,
) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        // Flat out, but stay cooperative with the runtime.
        None => tokio::task::yield_now().await,
    }

    clock.borrow_mut().advance_frames(1);
    if let Some(now) = clock.borrow().current_time() {
        for source in sources {
            source.borrow_mut().ingest(&now);
        }
    }
    synchronizer.update();
}

fn frames_f64(time: FrameTime) -> f64 {
    time.frame_number() as f64 + time.subframe().as_f64()
}

/// Whole frames per clock second, rounded up.
fn nominal_fps(blueprint: &SessionBlueprint) -> u32 {
    let rate = blueprint.clock.rate;
    if rate.denominator() == 0 || rate.numerator() == 0 {
        return 1;
    }
    (rate.numerator() + rate.denominator() - 1) / rate.denominator()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};

    fn blueprint() -> SessionBlueprint {
        ConfigLoader::load_from_str(
            r#"
            [[sources]]
            id = "camera"
            latency_frames = 4
            buffer_size = 16

            [[sources]]
            id = "audio"
            latency_frames = 1
            buffer_size = 16

            [session]
            frame_count = 60
            "#,
            ConfigFormat::Toml,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_session_runs_to_frame_count() {
        let session = Session::new(SessionConfig {
            blueprint: blueprint(),
            timeout: None,
            realtime: false,
            seed: 7,
            metrics_port: None,
        });

        let stats = session.run().await.unwrap();
        assert_eq!(stats.ticks, 60);
        assert_eq!(stats.active_sources, 2);
        // Calibration ran and settled on the worst latency.
        assert!(stats.calibration_ticks > 0);
        assert!((stats.delay_frames - 4.0).abs() < 1e-9);
        assert_eq!(stats.metrics.total_ticks, 60);
    }

    #[tokio::test]
    async fn test_session_without_calibration_keeps_fixed_delay() {
        let mut blueprint = blueprint();
        blueprint.session.calibrate = false;
        blueprint.session.delay_frames = 10;

        let session = Session::new(SessionConfig {
            blueprint,
            timeout: None,
            realtime: false,
            seed: 7,
            metrics_port: None,
        });

        let stats = session.run().await.unwrap();
        assert_eq!(stats.calibration_ticks, 0);
        assert!((stats.delay_frames - 10.0).abs() < 1e-9);

        // Delay 10 covers both sources, so steady state is all ok.
        let summary = stats.metrics.summary();
        let camera = &summary.sources["camera"];
        assert!(camera.ok > 0);
    }
}
