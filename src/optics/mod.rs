//! Optical elements.
//!
//! An element occupies a fixed longitudinal extent `[z_front, z_back)` and
//! mutates the state of every ray passing through it. The extent is not part
//! of the element: the simulation lays elements out once and hands each one
//! its [`Extent`] on every call.

pub mod aperture;
pub mod lens;
pub mod space;
pub mod sphere;

use std::fmt;

use anyhow::Result;
use serde::Serialize;

use crate::Ray;

pub use aperture::{Aperture, AperturePolicy};
pub use lens::{Lens, ParaxialLens, PartitionedApertureLens};
pub use space::{ParaxialSpace, Space};
pub use sphere::{DielectricSphere, SphereCrossing, SphereHit, SurfaceCrossing};

/// Absolute longitudinal bounds of a laid-out element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent {
    pub z_front: f64,
    pub z_back: f64,
}

impl Extent {
    pub fn new(z_front: f64, dz: f64) -> Self {
        Self {
            z_front,
            z_back: z_front + dz,
        }
    }

    /// Longitudinal width.
    pub fn dz(&self) -> f64 {
        self.z_back - self.z_front
    }
}

/// Why a ray stopped propagating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Termination {
    /// Blocked, e.g. by an aperture.
    Absorbed,
    /// Left the modeled domain sideways and never reaches the next element.
    Escaped,
    /// Held inside a component longer than the simulation handles.
    Trapped,
    /// Stopped for any other reason.
    Halted,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Termination::Absorbed => "absorbed",
            Termination::Escaped => "escaped",
            Termination::Trapped => "trapped",
            Termination::Halted => "halted",
        };
        f.write_str(s)
    }
}

/// Outcome of a single propagation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// The ray moves on to the next stage.
    Continue,
    /// The ray stops here; remaining stages are skipped for it.
    Terminated(Termination),
}

/// A physical stage acting on rays.
pub trait OpticalElement {
    /// Mutates `ray` in place or reports a terminal condition.
    ///
    /// `Err` is reserved for failures that must abort the whole run.
    fn propagate(&self, ray: &mut Ray, extent: &Extent) -> Result<Propagation>;

    /// Fixed longitudinal width, may be 0.
    fn dz(&self) -> f64;
}

/// Straight-line translation by `distance` with the exact tangent law.
///
/// Shared by [`Space`] and the exit leg of [`DielectricSphere`].
pub(crate) fn translate(ray: &mut Ray, distance: f64) {
    ray.x += ray.theta.tan() * distance;
    ray.z += distance;
    ray.record();
}
