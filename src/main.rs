use anyhow::Result;
use log::info;
use optics2d::detectors::{PositionAngleHistogram, RayLog};
use optics2d::optics::{Lens, Space};
use optics2d::sim::LossCounter;
use optics2d::source::AngleSpan;
use optics2d::vecutils::linspace;
use optics2d::{Ray, Setup, Simulation, SimulationConfig};

fn main() -> Result<()> {
    env_logger::init();

    // 4-f imaging: object at the front focal plane of the first lens,
    // image at the back focal plane of the second one.
    let f = 0.1;
    let setup = Setup::new()
        .with_element(Space::new(f)?)
        .with_element(Lens::new(f)?)
        .with_element(Space::new(2.0 * f)?)
        .with_element(Lens::new(f)?)
        .with_element(Space::new(f)?)
        .with_detector(RayLog::new("rays"))
        .with_detector(PositionAngleHistogram::new("image", linspace(-0.05, 0.05, 11))?);

    let source = AngleSpan::new(5)
        .with_span(0.2)
        .with_factory(Ray::traced);
    let config = SimulationConfig {
        progress_every: 1,
        ..SimulationConfig::new()
    };
    let mut sim = Simulation::new(source, setup)
        .with_config(config)
        .with_handler(LossCounter::new());
    let report = sim.run()?;

    let stats = sim.stats();
    info!(
        "{} rays completed, {} lost ({:.3} amplitude)",
        stats.completed,
        stats.terminated(),
        sim.handler().total_amplitude()
    );

    println!("{}", report.to_json()?);
    Ok(())
}
