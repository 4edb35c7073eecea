//! Ray state.
//!
//! A [`Ray`] is a point particle traced through a setup: lateral position,
//! angle to the optical axis, longitudinal position and a scalar amplitude.
//! Rays may carry children (rays spawned by an element) and, when created
//! with [`Ray::traced`], a history of the positions they passed through.

use serde::Serialize;

/// Constructs a new ray from `(x, theta, amplitude)`.
///
/// Sources take one of these so that a history-tracking ray can be
/// substituted without touching the source itself.
pub type RayFactory = fn(f64, f64, f64) -> Ray;

/// A single 2-D ray.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ray {
    /// Lateral position
    pub x: f64,
    /// Propagation angle in radians, measured from the z axis toward +x
    pub theta: f64,
    /// Longitudinal position (never decreases during propagation)
    pub z: f64,
    /// Scalar weight accumulated by detectors
    pub amplitude: f64,
    /// Rays spawned from this one, in spawn order
    pub children: Vec<Ray>,
    /// Recorded `(x, z)` samples, `None` for plain rays
    #[serde(skip_serializing_if = "Option::is_none")]
    history: Option<Vec<(f64, f64)>>,
}

impl Ray {
    /// Creates a plain ray with amplitude 1 at `z = 0`.
    pub fn new(x: f64, theta: f64) -> Self {
        Self::with_amplitude(x, theta, 1.0)
    }

    /// Creates a plain ray with the given amplitude at `z = 0`.
    pub fn with_amplitude(x: f64, theta: f64, amplitude: f64) -> Self {
        Self {
            x,
            theta,
            z: 0.0,
            amplitude,
            children: Vec::new(),
            history: None,
        }
    }

    /// [`RayFactory`] for rays without history.
    pub fn plain(x: f64, theta: f64, amplitude: f64) -> Self {
        Self::with_amplitude(x, theta, amplitude)
    }

    /// [`RayFactory`] for rays that record every position they pass through.
    ///
    /// The history starts with the initial `(x, z)` sample.
    pub fn traced(x: f64, theta: f64, amplitude: f64) -> Self {
        let mut ray = Self::with_amplitude(x, theta, amplitude);
        ray.history = Some(vec![(ray.x, ray.z)]);
        ray
    }

    /// Moves the starting point of the ray along z.
    ///
    /// Meant for construction only. For traced rays the initial sample is
    /// replaced.
    pub fn at_z(mut self, z: f64) -> Self {
        self.z = z;
        if let Some(history) = self.history.as_mut() {
            history.clear();
            history.push((self.x, self.z));
        }
        self
    }

    /// Returns true if this ray records its history.
    pub fn is_traced(&self) -> bool {
        self.history.is_some()
    }

    /// Recorded `(x, z)` samples, or `None` for plain rays.
    pub fn history(&self) -> Option<&[(f64, f64)]> {
        self.history.as_deref()
    }

    /// Records the current position.
    ///
    /// Every step that changes `x` or `z` must call this as its last action.
    /// A sample equal to the previous one is not stored again.
    pub fn record(&mut self) {
        let current = (self.x, self.z);
        if let Some(history) = self.history.as_mut()
            && history.last() != Some(&current)
        {
            history.push(current);
        }
    }

    /// Appends a child ray.
    pub fn spawn(&mut self, child: Ray) {
        self.children.push(child);
    }
}
