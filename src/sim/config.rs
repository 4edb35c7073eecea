/// Where a spawned ray starts its walk through the setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChildRestart {
    /// From the first stage, like every ray coming from the source.
    ///
    /// A child may therefore meet stages its parent already passed (and be
    /// absorbed by an aperture the parent went through).
    #[default]
    SequenceStart,
    /// From the stage right after the one that spawned it.
    SpawningStage,
}

pub struct SimulationConfig {
    /// Start stage of spawned rays.
    pub child_restart: ChildRestart,
    /// Deepest descendant generation that is still propagated.
    ///
    /// Source rays are generation 0. Deeper rays are handed to
    /// `handle_trapped_ray` instead of being walked. `None` means unbounded:
    /// an element that keeps spawning rays then never lets the run finish.
    pub max_generations: Option<usize>,
    /// Log progress every this many source rays. Set to 0 to disable.
    pub progress_every: usize,
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self {
            child_restart: ChildRestart::SequenceStart,
            max_generations: None,
            progress_every: 0,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}
