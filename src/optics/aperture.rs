use anyhow::Result;
use serde::Serialize;

use super::{Extent, OpticalElement, Propagation, Termination};
use crate::Ray;
use crate::error::ConfigError;

/// What happens to a ray outside the aperture opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AperturePolicy {
    /// The ray terminates as absorbed.
    #[default]
    Absorb,
    /// The ray keeps going with zero amplitude.
    ZeroAmplitude,
}

/// Zero-width opening `[left, right]`.
#[derive(Debug, Clone)]
pub struct Aperture {
    left: f64,
    right: f64,
    policy: AperturePolicy,
}

impl Aperture {
    pub fn new(left: f64, right: f64) -> Result<Self, ConfigError> {
        if left > right || left.is_nan() || right.is_nan() {
            return Err(ConfigError::InvertedAperture { left, right });
        }
        Ok(Self {
            left,
            right,
            policy: AperturePolicy::default(),
        })
    }

    /// Symmetric opening `[-radius, radius]`.
    pub fn radius(radius: f64) -> Result<Self, ConfigError> {
        if radius.is_nan() || radius < 0.0 {
            return Err(ConfigError::InvalidRadius(radius));
        }
        Self::new(-radius, radius)
    }

    pub fn with_policy(mut self, policy: AperturePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> AperturePolicy {
        self.policy
    }

    /// Returns true if `x` passes through the opening.
    pub fn contains(&self, x: f64) -> bool {
        x >= self.left && x <= self.right
    }
}

impl OpticalElement for Aperture {
    fn propagate(&self, ray: &mut Ray, _extent: &Extent) -> Result<Propagation> {
        if self.contains(ray.x) {
            return Ok(Propagation::Continue);
        }
        match self.policy {
            AperturePolicy::Absorb => Ok(Propagation::Terminated(Termination::Absorbed)),
            AperturePolicy::ZeroAmplitude => {
                ray.amplitude = 0.0;
                Ok(Propagation::Continue)
            }
        }
    }

    fn dz(&self) -> f64 {
        0.0
    }
}
