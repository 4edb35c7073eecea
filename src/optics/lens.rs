use anyhow::Result;

use super::{Extent, OpticalElement, Propagation};
use crate::Ray;
use crate::error::ConfigError;

fn check_focal_length(f: f64) -> Result<f64, ConfigError> {
    if f.is_finite() && f != 0.0 {
        Ok(f)
    } else {
        Err(ConfigError::InvalidFocalLength(f))
    }
}

/// Thin lens of zero width: `theta -= x / f`.
#[derive(Debug, Clone)]
pub struct ParaxialLens {
    f: f64,
}

/// The thin lens is the only lens model, paraxial or not.
pub type Lens = ParaxialLens;

impl ParaxialLens {
    pub fn new(f: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            f: check_focal_length(f)?,
        })
    }

    pub fn focal_length(&self) -> f64 {
        self.f
    }
}

impl OpticalElement for ParaxialLens {
    fn propagate(&self, ray: &mut Ray, _extent: &Extent) -> Result<Propagation> {
        ray.theta -= ray.x / self.f;
        Ok(Propagation::Continue)
    }

    fn dz(&self) -> f64 {
        0.0
    }
}

/// Two decentered lens halves, each shifted by `separation` toward the axis.
///
/// A ray at `x > 0` sees the offset `x - separation`, any other ray sees
/// `x + separation`; the thin-lens kick then uses that offset.
#[derive(Debug, Clone)]
pub struct PartitionedApertureLens {
    f: f64,
    separation: f64,
}

impl PartitionedApertureLens {
    pub fn new(f: f64, separation: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            f: check_focal_length(f)?,
            separation,
        })
    }
}

impl OpticalElement for PartitionedApertureLens {
    fn propagate(&self, ray: &mut Ray, _extent: &Extent) -> Result<Propagation> {
        let x_effective = if ray.x > 0.0 {
            ray.x - self.separation
        } else {
            ray.x + self.separation
        };
        ray.theta -= x_effective / self.f;
        Ok(Propagation::Continue)
    }

    fn dz(&self) -> f64 {
        0.0
    }
}
