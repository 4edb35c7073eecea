use anyhow::Result;

use super::{Extent, OpticalElement, Propagation, translate};
use crate::Ray;
use crate::error::ConfigError;

fn check_distance(distance: f64) -> Result<f64, ConfigError> {
    if distance.is_finite() && distance >= 0.0 {
        Ok(distance)
    } else {
        Err(ConfigError::InvalidDistance(distance))
    }
}

/// Free space: `x += tan(theta) * d`, `z += d`.
#[derive(Debug, Clone)]
pub struct Space {
    distance: f64,
}

impl Space {
    pub fn new(distance: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            distance: check_distance(distance)?,
        })
    }
}

impl OpticalElement for Space {
    fn propagate(&self, ray: &mut Ray, _extent: &Extent) -> Result<Propagation> {
        translate(ray, self.distance);
        Ok(Propagation::Continue)
    }

    fn dz(&self) -> f64 {
        self.distance
    }
}

/// Free space in the small-angle approximation: `x += theta * d`, `z += d`.
#[derive(Debug, Clone)]
pub struct ParaxialSpace {
    distance: f64,
}

impl ParaxialSpace {
    pub fn new(distance: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            distance: check_distance(distance)?,
        })
    }
}

impl OpticalElement for ParaxialSpace {
    fn propagate(&self, ray: &mut Ray, _extent: &Extent) -> Result<Propagation> {
        ray.x += ray.theta * self.distance;
        ray.z += self.distance;
        ray.record();
        Ok(Propagation::Continue)
    }

    fn dz(&self) -> f64 {
        self.distance
    }
}
