use std::collections::HashMap;

use crate::Ray;
use crate::optics::Termination;

/// Bookkeeping hooks for rays that stop early.
///
/// Each hook is called once per terminated ray, right after its walk through
/// the setup stops. The engine does nothing else with terminated rays, so
/// loss accounting belongs here.
pub trait TerminationHandler {
    fn handle_absorbed_ray(&mut self, _ray: &Ray) {}

    fn handle_escaped_ray(&mut self, _ray: &Ray) {}

    fn handle_trapped_ray(&mut self, _ray: &Ray) {}

    /// Generic stop without a dedicated hook.
    fn handle_halted_ray(&mut self, _ray: &Ray) {}
}

/// Dispatches `termination` to the matching hook.
pub(crate) fn dispatch<H: TerminationHandler + ?Sized>(
    handler: &mut H,
    termination: Termination,
    ray: &Ray,
) {
    match termination {
        Termination::Absorbed => handler.handle_absorbed_ray(ray),
        Termination::Escaped => handler.handle_escaped_ray(ray),
        Termination::Trapped => handler.handle_trapped_ray(ray),
        Termination::Halted => handler.handle_halted_ray(ray),
    }
}

/// Ignores every terminated ray.
pub struct NoopHandler;

impl TerminationHandler for NoopHandler {}

/// Number of rays and amplitude lost per termination kind.
#[derive(Debug, Clone, Default)]
pub struct LossCounter {
    losses: HashMap<Termination, (usize, f64)>,
}

impl LossCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, termination: Termination, ray: &Ray) {
        let entry = self.losses.entry(termination).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += ray.amplitude;
    }

    /// Number of rays lost to `termination`.
    pub fn count(&self, termination: Termination) -> usize {
        self.losses.get(&termination).map_or(0, |&(n, _)| n)
    }

    /// Summed amplitude of rays lost to `termination`.
    pub fn amplitude(&self, termination: Termination) -> f64 {
        self.losses.get(&termination).map_or(0.0, |&(_, a)| a)
    }

    pub fn total_count(&self) -> usize {
        self.losses.values().map(|&(n, _)| n).sum()
    }

    pub fn total_amplitude(&self) -> f64 {
        self.losses.values().map(|&(_, a)| a).sum()
    }
}

impl TerminationHandler for LossCounter {
    fn handle_absorbed_ray(&mut self, ray: &Ray) {
        self.add(Termination::Absorbed, ray);
    }

    fn handle_escaped_ray(&mut self, ray: &Ray) {
        self.add(Termination::Escaped, ray);
    }

    fn handle_trapped_ray(&mut self, ray: &Ray) {
        self.add(Termination::Trapped, ray);
    }

    fn handle_halted_ray(&mut self, ray: &Ray) {
        self.add(Termination::Halted, ray);
    }
}
