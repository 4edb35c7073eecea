use std::collections::HashSet;

use anyhow::{Context, Result};
use log::{debug, info, trace, warn};
use serde::Serialize;

use crate::Ray;
use crate::optics::{Extent, Propagation, Termination};
use crate::source::Source;

use super::config::{ChildRestart, SimulationConfig};
use super::handler::{self, NoopHandler, TerminationHandler};
use super::report::Report;
use super::setup::{Capabilities, Setup};

/// Counters collected while rays are driven through the setup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulationStats {
    /// Rays taken from the source.
    pub source_rays: usize,
    /// Rays walked through the setup, descendants included.
    pub traced_rays: usize,
    /// Rays that reached the end of the setup.
    pub completed: usize,
    pub absorbed: usize,
    pub escaped: usize,
    pub trapped: usize,
    pub halted: usize,
}

impl SimulationStats {
    /// Rays that stopped before the end of the setup.
    pub fn terminated(&self) -> usize {
        self.absorbed + self.escaped + self.trapped + self.halted
    }

    fn count(&mut self, termination: Termination) {
        match termination {
            Termination::Absorbed => self.absorbed += 1,
            Termination::Escaped => self.escaped += 1,
            Termination::Trapped => self.trapped += 1,
            Termination::Halted => self.halted += 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SimulationProgress {
    /// Source rays fully processed, descendants included.
    pub rays_done: usize,
    /// Rays the source declared at construction.
    pub num_rays: usize,
    /// Rays walked so far, descendants included.
    pub traced_rays: usize,
}

trait ProgressReporter {
    fn every_rays(&self) -> usize;
    fn report(&mut self, progress: &SimulationProgress);
}

struct LogProgress {
    every_rays: usize,
}

impl ProgressReporter for LogProgress {
    fn every_rays(&self) -> usize {
        self.every_rays
    }

    fn report(&mut self, progress: &SimulationProgress) {
        info!(
            "Progress: {}/{} source rays ({} traced)",
            progress.rays_done, progress.num_rays, progress.traced_rays
        );
    }
}

struct FnProgress<F> {
    every_rays: usize,
    f: F,
}

impl<F> ProgressReporter for FnProgress<F>
where
    F: FnMut(&SimulationProgress),
{
    fn every_rays(&self) -> usize {
        self.every_rays
    }

    fn report(&mut self, progress: &SimulationProgress) {
        (self.f)(progress);
    }
}

/// A ray waiting to be walked.
struct Pending {
    ray: Ray,
    start: usize,
    generation: usize,
}

/// How a single walk through the setup ended.
struct Walk {
    outcome: Option<Termination>,
    /// Index of the stage that spawned each child, in append order.
    /// `None` for children the ray already carried when the walk started.
    spawned_by: Vec<Option<usize>>,
}

/// Drives the rays of one source through an ordered setup.
///
/// Elements are laid out along z once (see [`Simulation::pre_process`]).
/// Every ray visits the stages in order; observers see it before
/// propagators act on it. Rays spawned by elements are walked after their
/// parent, depth-first in append order.
pub struct Simulation<H: TerminationHandler = NoopHandler> {
    source: Box<dyn Source>,
    num_rays: usize,
    setup: Setup,
    /// Per-stage capabilities, fixed at construction.
    capabilities: Vec<Capabilities>,
    /// Per-stage extent, `None` for pure detectors. Empty until laid out.
    extents: Vec<Option<Extent>>,
    laid_out: bool,
    post_processed: bool,
    config: SimulationConfig,
    handler: H,
    stats: SimulationStats,
}

impl Simulation<NoopHandler> {
    pub fn new(source: impl Source + 'static, setup: Setup) -> Self {
        warn_duplicate_names(&setup);
        let num_rays = source.num_rays();
        let capabilities = setup.stages().iter().map(|s| s.capabilities()).collect();
        Self {
            source: Box::new(source),
            num_rays,
            setup,
            capabilities,
            extents: Vec::new(),
            laid_out: false,
            post_processed: false,
            config: SimulationConfig::default(),
            handler: NoopHandler,
            stats: SimulationStats::default(),
        }
    }
}

impl<H: TerminationHandler> Simulation<H> {
    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the termination handler.
    pub fn with_handler<T: TerminationHandler>(self, handler: T) -> Simulation<T> {
        Simulation {
            source: self.source,
            num_rays: self.num_rays,
            setup: self.setup,
            capabilities: self.capabilities,
            extents: self.extents,
            laid_out: self.laid_out,
            post_processed: self.post_processed,
            config: self.config,
            handler,
            stats: self.stats,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn setup(&self) -> &Setup {
        &self.setup
    }

    /// Assigns absolute extents to the elements, back to back from `z = 0`.
    ///
    /// Only the first call has an effect.
    pub fn pre_process(&mut self) {
        if self.laid_out {
            return;
        }

        let mut z = 0.0;
        self.extents = self
            .setup
            .stages()
            .iter()
            .map(|stage| {
                stage.dz().map(|dz| {
                    let extent = Extent::new(z, dz);
                    z = extent.z_back;
                    extent
                })
            })
            .collect();
        self.laid_out = true;

        for (index, extent) in self.extents.iter().enumerate() {
            if let Some(e) = extent {
                debug!("Stage {index}: [{:.6}, {:.6})", e.z_front, e.z_back);
            }
        }
        debug!("Setup ends at z = {z:.6}");
    }

    /// Extents of the elements in setup order. Empty before
    /// [`Simulation::pre_process`].
    pub fn layout(&self) -> Vec<Extent> {
        self.extents.iter().flatten().copied().collect()
    }

    /// Walks `ray` and all of its descendants through the setup.
    ///
    /// Lays out the setup first if that has not happened yet. An `Err` from
    /// any stage aborts immediately.
    pub fn propagate(&mut self, ray: Ray) -> Result<()> {
        self.pre_process();

        let mut pending = vec![Pending {
            ray,
            start: 0,
            generation: 0,
        }];

        while let Some(Pending {
            mut ray,
            start,
            generation,
        }) = pending.pop()
        {
            if let Some(max) = self.config.max_generations
                && generation > max
            {
                trace!("Ray at generation {generation} exceeds the cap of {max}");
                self.terminate(Termination::Trapped, &ray);
                continue;
            }

            self.stats.traced_rays += 1;
            let walk = self.walk(&mut ray, start)?;
            match walk.outcome {
                Some(termination) => self.terminate(termination, &ray),
                None => self.stats.completed += 1,
            }

            let children = std::mem::take(&mut ray.children);
            for (child, spawned_by) in children.into_iter().zip(walk.spawned_by).rev() {
                let child_start = match self.config.child_restart {
                    ChildRestart::SequenceStart => 0,
                    ChildRestart::SpawningStage => spawned_by.map_or(start, |index| index + 1),
                };
                pending.push(Pending {
                    ray: child,
                    start: child_start,
                    generation: generation + 1,
                });
            }
        }
        Ok(())
    }

    fn walk(&mut self, ray: &mut Ray, start: usize) -> Result<Walk> {
        let mut spawned_by = vec![None; ray.children.len()];

        for (index, stage) in self.setup.stages_mut().iter_mut().enumerate().skip(start) {
            let caps = self.capabilities[index];
            if caps.observes {
                stage.detect(ray);
            }
            if !caps.propagates {
                continue;
            }
            let Some(extent) = self.extents.get(index).copied().flatten() else {
                continue;
            };

            let before = ray.children.len();
            let outcome = stage.propagate(ray, &extent).with_context(|| {
                format!(
                    "Stage {index} failed on ray at x = {:.6}, z = {:.6}",
                    ray.x, ray.z
                )
            })?;
            spawned_by.resize(ray.children.len().max(before), Some(index));

            if let Propagation::Terminated(termination) = outcome {
                return Ok(Walk {
                    outcome: Some(termination),
                    spawned_by,
                });
            }
        }

        Ok(Walk {
            outcome: None,
            spawned_by,
        })
    }

    fn terminate(&mut self, termination: Termination, ray: &Ray) {
        trace!(
            "Ray {termination} at x = {:.6}, z = {:.6}, amplitude = {:.6}",
            ray.x, ray.z, ray.amplitude
        );
        self.stats.count(termination);
        handler::dispatch(&mut self.handler, termination, ray);
    }

    /// Finalizes every detector. Only the first call has an effect.
    pub fn post_process(&mut self) {
        if self.post_processed {
            return;
        }
        for stage in self.setup.stages_mut() {
            stage.post_process();
        }
        self.post_processed = true;
    }

    /// Collects the detector reports by name.
    ///
    /// Detectors sharing a name overwrite each other, the last one in setup
    /// order wins.
    pub fn report(&self) -> Report {
        let mut report = Report::new();
        for stage in self.setup.stages() {
            if let (Some(name), Some(detector_report)) = (stage.detector_name(), stage.report()) {
                report.insert(name, detector_report);
            }
        }
        report
    }

    /// Lays out the setup, drives every source ray, finalizes the detectors
    /// and returns their reports.
    ///
    /// The source is consumed: a second run sees no new rays.
    pub fn run(&mut self) -> Result<Report> {
        let reporter = LogProgress {
            every_rays: self.config.progress_every,
        };
        self.run_with_reporter(reporter)
    }

    /// Same as [`Simulation::run`], calling `report` every `every_rays`
    /// source rays and once at the end. `every_rays = 0` disables it.
    pub fn run_with_progress<F>(&mut self, every_rays: usize, report: F) -> Result<Report>
    where
        F: FnMut(&SimulationProgress),
    {
        self.run_with_reporter(FnProgress {
            every_rays,
            f: report,
        })
    }

    fn run_with_reporter<R: ProgressReporter>(&mut self, mut reporter: R) -> Result<Report> {
        info!(
            "Running simulation: {} source rays, {} stages",
            self.num_rays,
            self.setup.len()
        );
        self.pre_process();

        let every = reporter.every_rays();
        while let Some(ray) = self.source.next() {
            self.stats.source_rays += 1;
            self.propagate(ray)?;

            if every > 0 && self.stats.source_rays.is_multiple_of(every) {
                reporter.report(&self.progress());
            }
        }
        if every > 0 && !self.stats.source_rays.is_multiple_of(every) {
            reporter.report(&self.progress());
        }

        self.post_process();
        let stats = &self.stats;
        info!(
            "Simulation finished: {} rays traced, {} completed, {} terminated",
            stats.traced_rays,
            stats.completed,
            stats.terminated()
        );
        Ok(self.report())
    }

    fn progress(&self) -> SimulationProgress {
        SimulationProgress {
            rays_done: self.stats.source_rays,
            num_rays: self.num_rays,
            traced_rays: self.stats.traced_rays,
        }
    }
}

fn warn_duplicate_names(setup: &Setup) {
    let mut seen = HashSet::new();
    for name in setup.stages().iter().filter_map(|s| s.detector_name()) {
        if !seen.insert(name) {
            warn!("Detector name '{name}' is used more than once, only the last one is reported");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::{Detector, DetectorReport, PositionHistogram, RayLog};
    use crate::optics::{Aperture, OpticalElement, Space};
    use crate::sim::LossCounter;
    use crate::source::{PositionSpan, SingleRay};
    use crate::vecutils::linspace;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Splits every ray with amplitude >= 0.5 into two children carrying half
    /// of it each, at `x = 10 * x + 1` and `x = 10 * x + 2`.
    struct Splitter;

    impl OpticalElement for Splitter {
        fn propagate(&self, ray: &mut Ray, _extent: &Extent) -> Result<Propagation> {
            if ray.amplitude >= 0.5 {
                for k in 1..=2 {
                    let child = Ray::with_amplitude(10.0 * ray.x + k as f64, 0.0, ray.amplitude / 2.0)
                        .at_z(ray.z);
                    ray.spawn(child);
                }
            }
            Ok(Propagation::Continue)
        }

        fn dz(&self) -> f64 {
            0.0
        }
    }

    /// Spawns one child from every ray it sees.
    struct Breeder;

    impl OpticalElement for Breeder {
        fn propagate(&self, ray: &mut Ray, _extent: &Extent) -> Result<Propagation> {
            let mut child = ray.clone();
            child.children.clear();
            ray.spawn(child);
            Ok(Propagation::Continue)
        }

        fn dz(&self) -> f64 {
            0.0
        }
    }

    struct Broken;

    impl OpticalElement for Broken {
        fn propagate(&self, _ray: &mut Ray, _extent: &Extent) -> Result<Propagation> {
            anyhow::bail!("detector hardware offline")
        }

        fn dz(&self) -> f64 {
            0.0
        }
    }

    struct CountingDetector {
        name: String,
        post_processed: Rc<Cell<usize>>,
    }

    impl Detector for CountingDetector {
        fn name(&self) -> &str {
            &self.name
        }

        fn detect(&mut self, _ray: &Ray) {}

        fn post_process(&mut self) {
            self.post_processed.set(self.post_processed.get() + 1);
        }

        fn report(&self) -> DetectorReport {
            DetectorReport::Custom {
                value: serde_json::json!(self.post_processed.get()),
            }
        }
    }

    fn logged_x(report: &Report, name: &str) -> Vec<f64> {
        report[name].rays().unwrap().iter().map(|r| r.x).collect()
    }

    #[test]
    fn test_layout_is_contiguous_from_zero() {
        let setup = Setup::new()
            .with_element(Space::new(1.0).unwrap())
            .with_detector(RayLog::new("log"))
            .with_element(Aperture::radius(1.0).unwrap())
            .with_element(Space::new(2.5).unwrap());
        let mut sim = Simulation::new(SingleRay::new(0.0, 0.0), setup);
        assert!(sim.layout().is_empty());

        sim.pre_process();
        let layout = sim.layout();
        assert_eq!(layout.len(), 3);
        assert_eq!(layout[0], Extent::new(0.0, 1.0));
        assert_eq!(layout[1], Extent::new(1.0, 0.0));
        assert_eq!(layout[2], Extent::new(1.0, 2.5));
        for pair in layout.windows(2) {
            assert_eq!(pair[0].z_back, pair[1].z_front);
        }

        // Repeat calls keep the same layout
        sim.pre_process();
        assert_eq!(sim.layout(), layout);
    }

    #[test]
    fn test_aperture_losses_reach_handler() -> Result<()> {
        let edges = linspace(-1.0, 1.0, 11);
        let setup = Setup::new()
            .with_element(Aperture::radius(0.5)?)
            .with_detector(PositionHistogram::new("hist", edges)?);
        let mut sim =
            Simulation::new(PositionSpan::new(11, 2.0), setup).with_handler(LossCounter::new());
        let report = sim.run()?;

        assert_eq!(sim.handler().count(Termination::Absorbed), 6);
        assert!((sim.handler().amplitude(Termination::Absorbed) - 6.0).abs() < 1e-12);
        assert!((report["hist"].total().unwrap() - 5.0).abs() < 1e-12);

        let stats = sim.stats();
        assert_eq!(stats.source_rays, 11);
        assert_eq!(stats.completed, 5);
        assert_eq!(stats.absorbed, 6);
        assert_eq!(stats.terminated(), 6);
        Ok(())
    }

    #[test]
    fn test_children_depth_first_in_append_order() -> Result<()> {
        let setup = Setup::new()
            .with_detector(RayLog::new("before"))
            .with_element(Splitter)
            .with_detector(RayLog::new("after"));
        let mut sim = Simulation::new(SingleRay::new(0.0, 0.0), setup);
        let report = sim.run()?;

        let expected = vec![0.0, 1.0, 11.0, 12.0, 2.0, 21.0, 22.0];
        assert_eq!(logged_x(&report, "before"), expected);
        assert_eq!(logged_x(&report, "after"), expected);
        assert_eq!(sim.stats().traced_rays, 7);
        assert_eq!(sim.stats().completed, 7);
        Ok(())
    }

    #[test]
    fn test_children_resume_after_spawning_stage() -> Result<()> {
        let config = SimulationConfig {
            child_restart: ChildRestart::SpawningStage,
            ..SimulationConfig::new()
        };
        let setup = Setup::new()
            .with_detector(RayLog::new("before"))
            .with_element(Splitter)
            .with_detector(RayLog::new("after"));
        let mut sim = Simulation::new(SingleRay::new(0.0, 0.0), setup).with_config(config);
        let report = sim.run()?;

        // Children skip the splitter, so nothing splits twice
        assert_eq!(logged_x(&report, "before"), vec![0.0]);
        assert_eq!(logged_x(&report, "after"), vec![0.0, 1.0, 2.0]);
        Ok(())
    }

    #[test]
    fn test_children_of_terminated_ray_are_driven() -> Result<()> {
        // The parent at x = 0 is clipped, its children at x = 1 and 2 pass
        let setup = Setup::new()
            .with_element(Splitter)
            .with_element(Aperture::new(0.5, 3.0)?)
            .with_detector(RayLog::new("after"));
        let mut sim = Simulation::new(SingleRay::new(0.0, 0.0).with_amplitude(0.9), setup)
            .with_handler(LossCounter::new());
        let report = sim.run()?;

        assert_eq!(logged_x(&report, "after"), vec![1.0, 2.0]);
        assert_eq!(sim.handler().count(Termination::Absorbed), 1);
        assert_eq!(sim.stats().completed, 2);
        Ok(())
    }

    #[test]
    fn test_restarted_children_meet_passed_aperture() -> Result<()> {
        let setup = Setup::new()
            .with_element(Aperture::radius(0.5)?)
            .with_element(Splitter)
            .with_detector(RayLog::new("after"));
        let mut sim = Simulation::new(SingleRay::new(0.0, 0.0).with_amplitude(0.9), setup)
            .with_handler(LossCounter::new());
        let report = sim.run()?;

        // Children walk from stage 0 and are clipped by the aperture the
        // parent went through
        assert_eq!(logged_x(&report, "after"), vec![0.0]);
        assert_eq!(sim.handler().count(Termination::Absorbed), 2);
        Ok(())
    }

    #[test]
    fn test_resumed_children_skip_passed_aperture() -> Result<()> {
        let config = SimulationConfig {
            child_restart: ChildRestart::SpawningStage,
            ..SimulationConfig::new()
        };
        let setup = Setup::new()
            .with_element(Aperture::radius(0.5)?)
            .with_element(Splitter)
            .with_detector(RayLog::new("after"));
        let mut sim = Simulation::new(SingleRay::new(0.0, 0.0).with_amplitude(0.9), setup)
            .with_config(config)
            .with_handler(LossCounter::new());
        let report = sim.run()?;

        assert_eq!(logged_x(&report, "after"), vec![0.0, 1.0, 2.0]);
        assert_eq!(sim.handler().total_count(), 0);
        Ok(())
    }

    #[test]
    fn test_carried_children_start_at_parent_start() -> Result<()> {
        let config = SimulationConfig {
            child_restart: ChildRestart::SpawningStage,
            ..SimulationConfig::new()
        };
        let setup = Setup::new()
            .with_detector(RayLog::new("first"))
            .with_detector(RayLog::new("second"));
        let mut sim = Simulation::new(SingleRay::new(0.0, 0.0), setup).with_config(config);

        let mut parent = Ray::new(0.0, 0.0);
        parent.spawn(Ray::new(7.0, 0.0));
        sim.propagate(parent)?;

        let report = sim.report();
        assert_eq!(logged_x(&report, "first"), vec![0.0, 7.0]);
        assert_eq!(logged_x(&report, "second"), vec![0.0, 7.0]);
        Ok(())
    }

    #[test]
    fn test_generation_cap_traps_descendants() -> Result<()> {
        let config = SimulationConfig {
            max_generations: Some(3),
            ..SimulationConfig::new()
        };
        let setup = Setup::new()
            .with_element(Breeder)
            .with_detector(RayLog::new("log"));
        let mut sim = Simulation::new(SingleRay::new(0.0, 0.0), setup)
            .with_config(config)
            .with_handler(LossCounter::new());
        let report = sim.run()?;

        assert_eq!(report["log"].rays().unwrap().len(), 4);
        assert_eq!(sim.stats().traced_rays, 4);
        assert_eq!(sim.stats().trapped, 1);
        assert_eq!(sim.handler().count(Termination::Trapped), 1);
        Ok(())
    }

    #[test]
    fn test_duplicate_names_last_wins() -> Result<()> {
        let setup = Setup::new()
            .with_detector(RayLog::new("dup"))
            .with_element(Space::new(1.0)?)
            .with_detector(PositionHistogram::new("dup", vec![-1.0, 1.0])?);
        let mut sim = Simulation::new(SingleRay::new(0.0, 0.0), setup);
        let report = sim.run()?;

        assert_eq!(report.len(), 1);
        assert!(report["dup"].position().is_some());
        Ok(())
    }

    #[test]
    fn test_flux_conservation() -> Result<()> {
        for n in [0, 1, 17, 500] {
            let setup = Setup::new()
                .with_element(Space::new(0.3)?)
                .with_detector(PositionHistogram::new("hist", linspace(-0.5, 0.5, 7))?);
            let mut sim = Simulation::new(PositionSpan::new(n, 4.0).with_theta(0.2), setup);
            let report = sim.run()?;
            assert!((report["hist"].total().unwrap() - n as f64).abs() < 1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_post_process_runs_once() -> Result<()> {
        let calls = Rc::new(Cell::new(0));
        let setup = Setup::new().with_detector(CountingDetector {
            name: "count".to_string(),
            post_processed: Rc::clone(&calls),
        });
        let mut sim = Simulation::new(PositionSpan::new(3, 1.0), setup);
        sim.run()?;
        sim.post_process();
        let report = sim.run()?;

        assert_eq!(calls.get(), 1);
        assert_eq!(sim.stats().source_rays, 3);
        assert!(matches!(report["count"], DetectorReport::Custom { .. }));
        Ok(())
    }

    #[test]
    fn test_stage_error_aborts_run() {
        let setup = Setup::new()
            .with_detector(RayLog::new("log"))
            .with_element(Broken);
        let mut sim = Simulation::new(PositionSpan::new(5, 1.0), setup);
        let err = sim.run().unwrap_err();

        let chain = format!("{err:#}");
        assert!(chain.contains("Stage 1"));
        assert!(chain.contains("detector hardware offline"));
        assert_eq!(sim.stats().source_rays, 1);
    }

    #[test]
    fn test_progress_callback() -> Result<()> {
        let setup = Setup::new().with_element(Space::new(1.0)?);
        let mut sim = Simulation::new(PositionSpan::new(10, 1.0), setup);
        let mut seen = Vec::new();
        sim.run_with_progress(4, |p| seen.push(p.rays_done))?;
        assert_eq!(seen, vec![4, 8, 10]);
        Ok(())
    }
}
