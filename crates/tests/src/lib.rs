//! # Integration Tests
//!
//! End-to-end scenarios across the workspace crates:
//! - config -> source graph -> synchronizer flows
//! - calibration convergence against simulated latencies
//! - timecode round trips at NTSC rates

#[cfg(test)]
mod support {
    use std::cell::RefCell;
    use std::rc::Rc;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{SessionBlueprint, TimecodeSource, TimedDataSource};
    use sync_engine::sim::{ManualClock, SimulatedSource};
    use sync_engine::Synchronizer;

    pub struct Harness {
        pub clock: Rc<RefCell<ManualClock>>,
        pub sources: Vec<Rc<RefCell<SimulatedSource>>>,
        pub synchronizer: Synchronizer,
    }

    impl Harness {
        pub fn from_toml(toml: &str) -> Self {
            Self::from_blueprint(&ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap())
        }

        pub fn from_blueprint(blueprint: &SessionBlueprint) -> Self {
            let clock = Rc::new(RefCell::new(ManualClock::new(
                blueprint.clock.id.clone(),
                blueprint.clock.rate,
            )));
            let mut synchronizer = Synchronizer::new("session");
            synchronizer
                .set_timecode_source(Some(Rc::clone(&clock) as Rc<RefCell<dyn TimecodeSource>>));

            let mut sources = Vec::new();
            for (i, config) in blueprint.sources.iter().enumerate() {
                let source = Rc::new(RefCell::new(SimulatedSource::from_config(
                    config,
                    i as u64 + 1,
                )));
                let as_dyn = Rc::clone(&source) as Rc<RefCell<dyn TimedDataSource>>;
                assert!(synchronizer.add_data_source(&as_dyn));
                sources.push(source);
            }
            synchronizer.set_delay(timecode::FrameTime::new(blueprint.session.delay_frames));

            Self {
                clock,
                sources,
                synchronizer,
            }
        }

        pub fn tick(&mut self) {
            self.clock.borrow_mut().advance_frames(1);
            if let Some(now) = self.clock.borrow().current_time() {
                for source in &self.sources {
                    source.borrow_mut().ingest(&now);
                }
            }
            self.synchronizer.update();
        }

        pub fn run(&mut self, ticks: u32) {
            for _ in 0..ticks {
                self.tick();
            }
        }
    }
}

#[cfg(test)]
mod session_tests {
    use contracts::{CalibrationStatus, TimecodeSource, TimedDataSource, TimedSampleStatus};
    use timecode::FrameTime;

    use crate::support::Harness;

    const THREE_SOURCES: &str = r#"
        [[sources]]
        id = "good"
        latency_frames = 5
        buffer_size = 30

        [[sources]]
        id = "fast"
        latency_frames = 0
        buffer_size = 3

        [[sources]]
        id = "slow"
        latency_frames = 15
        buffer_size = 30

        [session]
        delay_frames = 10
        calibrate = false
    "#;

    /// With a fixed delay of 10, the three sources split into one of each
    /// non-missing status: covered, too new, too old.
    #[test]
    fn test_fixed_delay_status_split() {
        let mut harness = Harness::from_toml(THREE_SOURCES);
        harness.run(60);

        assert_eq!(
            harness.synchronizer.current_status(0),
            Some(TimedSampleStatus::Ok)
        );
        assert_eq!(
            harness.synchronizer.current_status(1),
            Some(TimedSampleStatus::Ahead)
        );
        assert_eq!(
            harness.synchronizer.current_status(2),
            Some(TimedSampleStatus::Behind)
        );
    }

    /// Calibration raises the delay to the worst source latency and grows
    /// the shallow buffer, after which every source presents.
    #[test]
    fn test_calibration_fixes_the_split() {
        let mut harness = Harness::from_toml(THREE_SOURCES);
        assert!(harness
            .synchronizer
            .start_calibration(contracts::CalibrationConfig::default()));

        let mut ticks = 0;
        while harness.synchronizer.calibration_status() == CalibrationStatus::InProgress {
            harness.tick();
            ticks += 1;
            assert!(ticks < 1500, "calibration did not converge");
        }

        assert_eq!(
            harness.synchronizer.calibration_status(),
            CalibrationStatus::Completed
        );
        assert_eq!(harness.synchronizer.delay(), FrameTime::new(15));
        // The shallow buffer was grown to delay + margin.
        assert_eq!(harness.sources[1].borrow().buffer_size(), 17);

        harness.run(40);
        for i in 0..3 {
            assert_eq!(
                harness.synchronizer.current_status(i),
                Some(TimedSampleStatus::Ok),
                "source {i}"
            );
        }
    }

    /// A capped buffer cannot absorb the delay, but calibration still
    /// terminates instead of waiting for the impossible.
    #[test]
    fn test_capped_buffer_terminates_calibration() {
        let mut harness = Harness::from_toml(
            r#"
            [[sources]]
            id = "capped"
            latency_frames = 10
            max_buffer_size = 2
        "#,
        );
        assert!(harness
            .synchronizer
            .start_calibration(contracts::CalibrationConfig::default()));

        let mut ticks = 0;
        while harness.synchronizer.calibration_status() == CalibrationStatus::InProgress {
            harness.tick();
            ticks += 1;
            assert!(ticks < 1500, "calibration did not terminate");
        }

        assert_eq!(harness.synchronizer.delay(), FrameTime::new(10));
        assert_eq!(harness.sources[0].borrow().buffer_size(), 2);
    }

    /// Sources at rates other than the clock's still present: the target is
    /// remapped into each source's own timeline.
    #[test]
    fn test_mixed_rates_present() {
        let mut harness = Harness::from_toml(
            r#"
            [clock]
            rate = { numerator = 60, denominator = 1 }

            [[sources]]
            id = "half_rate"
            rate = { numerator = 30, denominator = 1 }
            latency_frames = 0
            buffer_size = 30

            [[sources]]
            id = "ntsc"
            rate = { numerator = 30000, denominator = 1001 }
            latency_frames = 0
            buffer_size = 30

            [session]
            delay_frames = 4
        "#,
        );
        harness.run(60);

        assert_eq!(
            harness.synchronizer.current_status(0),
            Some(TimedSampleStatus::Ok)
        );
        assert_eq!(
            harness.synchronizer.current_status(1),
            Some(TimedSampleStatus::Ok)
        );
    }

    /// Losing the clock mid-session drops every source to missing; signal
    /// recovery resumes presentation.
    #[test]
    fn test_clock_loss_and_recovery() {
        let mut harness = Harness::from_toml(
            r#"
            [[sources]]
            id = "camera"
            latency_frames = 0
            buffer_size = 8
        "#,
        );
        harness.run(10);
        assert_eq!(
            harness.synchronizer.current_status(0),
            Some(TimedSampleStatus::Ok)
        );

        let resume_at = harness.clock.borrow().current_time().unwrap().time();
        harness.clock.borrow_mut().set_time(None);
        harness.synchronizer.update();
        assert_eq!(
            harness.synchronizer.current_status(0),
            Some(TimedSampleStatus::DataMissing)
        );
        assert!(!harness.sources[0].borrow().is_synchronized());

        harness.clock.borrow_mut().set_time(Some(resume_at));
        harness.run(5);
        assert_eq!(
            harness.synchronizer.current_status(0),
            Some(TimedSampleStatus::Ok)
        );
        assert!(harness.sources[0].borrow().is_synchronized());
    }

    /// A source offset shifts its sample timestamps; the synchronizer
    /// compensates when presenting.
    #[test]
    fn test_offset_source_presents() {
        let mut harness = Harness::from_toml(
            r#"
            [[sources]]
            id = "shifted"
            latency_frames = 2
            buffer_size = 30
            offset_frames = 12

            [session]
            delay_frames = 5
        "#,
        );
        harness.run(60);
        assert_eq!(
            harness.synchronizer.current_status(0),
            Some(TimedSampleStatus::Ok)
        );
    }
}

#[cfg(test)]
mod observability_tests {
    use contracts::TimedDataSource;
    use observability::SessionMetricsAggregator;

    use crate::support::Harness;

    /// Per-source status counts flow from the synchronizer into the session
    /// summary.
    #[test]
    fn test_statuses_aggregate_into_summary() {
        let mut harness = Harness::from_toml(
            r#"
            [[sources]]
            id = "covered"
            latency_frames = 2
            buffer_size = 30

            [[sources]]
            id = "starved"
            latency_frames = 20
            buffer_size = 4

            [session]
            delay_frames = 5
            calibrate = false
        "#,
        );

        let mut metrics = SessionMetricsAggregator::new();
        for _ in 0..60 {
            harness.tick();
            let delay = 5.0;
            let statuses: Vec<(String, contracts::TimedSampleStatus)> = harness
                .sources
                .iter()
                .enumerate()
                .map(|(i, source)| {
                    (
                        source.borrow().id().to_string(),
                        harness.synchronizer.current_status(i).unwrap_or_default(),
                    )
                })
                .collect();
            metrics.record_tick(statuses.iter().map(|(id, s)| (id.as_str(), *s)), delay);
        }

        let summary = metrics.summary();
        assert_eq!(summary.total_ticks, 60);

        let covered = &summary.sources["covered"];
        assert!(covered.ok > covered.behind + covered.ahead);

        // Latency 20 against a delay of 5 means the wanted frame is always
        // older than the arriving data.
        let starved = &summary.sources["starved"];
        assert_eq!(starved.ok, 0);
        assert!(starved.behind + starved.data_missing == 60);
    }
}

#[cfg(test)]
mod registry_tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use contracts::{TimedDataSource, TimedDataSourceRegistry};
    use sync_engine::sim::SimulatedSource;

    fn source(id: &str) -> Rc<RefCell<dyn TimedDataSource>> {
        let config = contracts::SourceConfig {
            id: id.into(),
            name: String::new(),
            rate: timecode::FrameRate::FPS_30,
            latency_frames: 0,
            jitter_frames: 0,
            buffer_size: 1,
            min_buffer_size: None,
            max_buffer_size: None,
            offset_frames: 0,
        };
        Rc::new(RefCell::new(SimulatedSource::from_config(&config, 1)))
    }

    #[test]
    fn test_registry_lifecycle() {
        let mut registry = TimedDataSourceRegistry::new();
        assert!(registry.register("a".into(), source("a")));
        assert!(registry.register("b".into(), source("b")));
        assert!(!registry.register("a".into(), source("a")));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("a"));
        assert_eq!(registry.get("b").unwrap().borrow().id().as_str(), "b");

        assert!(registry.unregister("a"));
        assert!(!registry.contains("a"));
        assert_eq!(registry.len(), 1);
    }
}

#[cfg(test)]
mod timecode_tests {
    use timecode::{FrameRate, FrameTime, FrameTimeWithRate, Timecode};

    /// Hours of NTSC drop-frame timecode stay aligned with wall time.
    #[test]
    fn test_drop_frame_round_trip() {
        let rate = FrameRate::FPS_29_97_DF;
        for frames in [0, 1799, 1800, 17982, 2_191_160] {
            let time = FrameTime::new(frames);
            let timecode = Timecode::from_frame_time(&rate, time);
            assert_eq!(timecode.to_frame_time(&rate), time, "{frames}");
        }

        // One true minute displays as 00:01:00;02.
        let tc = Timecode::from_frame_time(&rate, FrameTime::new(1800));
        assert_eq!(tc.to_string(), "00:01:00;02");
    }

    /// Remapping a clock reading between rates and back lands on the same
    /// frame.
    #[test]
    fn test_cross_rate_round_trip() {
        let at_ntsc = FrameTimeWithRate::new(FrameRate::FPS_29_97, FrameTime::new(107_892));
        let at_60 = at_ntsc.remap(&FrameRate::from_fps(60)).unwrap();
        let back = at_60.remap(&FrameRate::FPS_29_97).unwrap();
        assert_eq!(back.time().round(), at_ntsc.time());
    }
}
