//! Refractive sphere (bead).
//!
//! In 2-D the sphere is a circle of radius `r` whose center sits at
//! `(center_x, z_front + r)`, so the element spans exactly `2r` along z.
//! A ray crossing it is refracted at the entry and exit surfaces by Snell's
//! law and then continues in a straight line to the back plane.

use anyhow::Result;
use serde::Serialize;

use super::{Extent, OpticalElement, Propagation, Termination, translate};
use crate::Ray;
use crate::error::ConfigError;
use crate::geom::rotation::{to_global_frame, to_ray_frame};

/// Refraction angle for a ray hitting a boundary from a medium of index `n1`
/// into a medium of index `n2`, both angles measured from the surface normal.
///
/// Returns `None` on total internal reflection.
pub fn snell(incidence: f64, n1: f64, n2: f64) -> Option<f64> {
    let s = n1 / n2 * incidence.sin();
    if s.abs() > 1.0 {
        None
    } else {
        Some(s.asin())
    }
}

/// Ray state right after crossing one surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SurfaceCrossing {
    /// Crossing point
    pub x: f64,
    pub z: f64,
    /// Angle to the surface normal before the bend
    pub incidence: f64,
    /// Angle to the surface normal after the bend
    pub refraction: f64,
    /// Absolute ray angle after the bend
    pub theta: f64,
}

impl SurfaceCrossing {
    fn apply(&self, ray: &mut Ray) {
        ray.x = self.x;
        ray.z = self.z;
        ray.theta = self.theta;
        ray.record();
    }
}

/// Entry and exit of a ray through the sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SphereCrossing {
    pub entry: SurfaceCrossing,
    pub exit: SurfaceCrossing,
}

/// How a ray meets the sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SphereHit {
    /// The ray passes beside the sphere (or the sphere is not ahead of it).
    Miss,
    /// The ray is reflected at the entry surface.
    TotalInternalReflection,
    Refracted(SphereCrossing),
}

/// Dielectric sphere of index `n_inside` in a medium of index `n_surround`.
#[derive(Debug, Clone)]
pub struct DielectricSphere {
    radius: f64,
    center_x: f64,
    n_inside: f64,
    n_surround: f64,
}

impl DielectricSphere {
    /// Sphere surrounded by vacuum (`n_surround = 1`).
    pub fn new(radius: f64, center_x: f64, n_inside: f64) -> Result<Self, ConfigError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(ConfigError::InvalidRadius(radius));
        }
        Ok(Self {
            radius,
            center_x,
            n_inside: check_index(n_inside)?,
            n_surround: 1.0,
        })
    }

    pub fn with_surround(mut self, n_surround: f64) -> Result<Self, ConfigError> {
        self.n_surround = check_index(n_surround)?;
        Ok(self)
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Center of the sphere once laid out at `extent`.
    pub fn center(&self, extent: &Extent) -> (f64, f64) {
        (self.center_x, extent.z_front + self.radius)
    }

    /// Computes where and how `ray` crosses the sphere, without moving it.
    pub fn trace(&self, ray: &Ray, extent: &Extent) -> SphereHit {
        let (cx, cz) = self.center(extent);
        let (x_local, z_local) = to_ray_frame(ray, cx, cz);
        if x_local.abs() >= self.radius {
            return SphereHit::Miss;
        }

        // Depth of the first contact behind the center, along the ray
        let sphere_depth = (self.radius.powi(2) - x_local.powi(2)).sqrt();
        if z_local < sphere_depth {
            return SphereHit::Miss;
        }

        let incidence = (x_local / sphere_depth).atan();
        let Some(refraction) = snell(incidence, self.n_surround, self.n_inside) else {
            return SphereHit::TotalInternalReflection;
        };
        let (x_in, z_in) = to_global_frame(ray, 0.0, z_local - sphere_depth);
        let theta_in = ray.theta + (incidence - refraction);
        let entry = SurfaceCrossing {
            x: x_in,
            z: z_in,
            incidence,
            refraction,
            theta: theta_in,
        };

        // The chord and both radii form an isosceles triangle, so the ray
        // meets the exit surface at the same angle it left the entry one.
        let chord = 2.0 * self.radius * refraction.cos();
        let exit_refraction =
            snell(refraction, self.n_inside, self.n_surround).unwrap_or(incidence);
        let exit = SurfaceCrossing {
            x: x_in + chord * theta_in.sin(),
            z: z_in + chord * theta_in.cos(),
            incidence: refraction,
            refraction: exit_refraction,
            theta: theta_in + (exit_refraction - refraction),
        };

        SphereHit::Refracted(SphereCrossing { entry, exit })
    }
}

fn check_index(n: f64) -> Result<f64, ConfigError> {
    if n.is_finite() && n > 0.0 {
        Ok(n)
    } else {
        Err(ConfigError::InvalidRefractiveIndex(n))
    }
}

impl OpticalElement for DielectricSphere {
    fn propagate(&self, ray: &mut Ray, extent: &Extent) -> Result<Propagation> {
        match self.trace(ray, extent) {
            SphereHit::Miss => {}
            SphereHit::TotalInternalReflection => {
                return Ok(Propagation::Terminated(Termination::Escaped));
            }
            SphereHit::Refracted(crossing) => {
                crossing.entry.apply(ray);
                if crossing.exit.z < crossing.entry.z {
                    return Ok(Propagation::Terminated(Termination::Escaped));
                }
                crossing.exit.apply(ray);
            }
        }

        if ray.theta.cos() <= 0.0 {
            return Ok(Propagation::Terminated(Termination::Escaped));
        }
        let distance = (extent.z_back - ray.z).max(0.0);
        translate(ray, distance);
        Ok(Propagation::Continue)
    }

    fn dz(&self) -> f64 {
        2.0 * self.radius
    }
}
