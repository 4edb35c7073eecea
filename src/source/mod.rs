//! Ray sources.
//!
//! A source is a finite, lazy iterator over freshly created rays. The number
//! of rays is fixed at construction and an exhausted source stays exhausted.
//! Variants differ only in how each `(x, theta, amplitude)` triple is chosen;
//! all of them build rays through a [`RayFactory`], so swapping in
//! [`Ray::traced`] turns on history tracking without changing the source.

pub mod sampler;

use crate::ray::{Ray, RayFactory};

pub use sampler::Sampler;

/// A finite sequence of new rays.
pub trait Source: Iterator<Item = Ray> {
    /// Total number of rays this source emits over its lifetime.
    fn num_rays(&self) -> usize;

    /// Number of rays not emitted yet.
    fn remaining(&self) -> usize;
}

/// Emission counter shared by all sources.
#[derive(Debug, Clone, Copy)]
struct Emission {
    num_rays: usize,
    emitted: usize,
}

impl Emission {
    fn new(num_rays: usize) -> Self {
        Self {
            num_rays,
            emitted: 0,
        }
    }

    /// Index of the next ray, or `None` once exhausted.
    fn next_index(&mut self) -> Option<usize> {
        if self.emitted >= self.num_rays {
            return None;
        }
        self.emitted += 1;
        Some(self.emitted - 1)
    }

    fn remaining(&self) -> usize {
        self.num_rays - self.emitted
    }
}

/// Offset of ray `index` in a fan of `num` rays spread evenly over `span`,
/// centered on zero. A single ray sits on the center.
fn fan_offset(index: usize, num: usize, span: f64) -> f64 {
    if num <= 1 {
        return 0.0;
    }
    (index as f64) * span / ((num - 1) as f64) - span / 2.0
}

macro_rules! impl_source {
    ($ty:ty) => {
        impl Source for $ty {
            fn num_rays(&self) -> usize {
                self.emission.num_rays
            }

            fn remaining(&self) -> usize {
                self.emission.remaining()
            }
        }

        impl ExactSizeIterator for $ty {}
    };
}

/// Emits exactly one ray.
pub struct SingleRay {
    x: f64,
    theta: f64,
    amplitude: f64,
    factory: RayFactory,
    emission: Emission,
}

impl SingleRay {
    pub fn new(x: f64, theta: f64) -> Self {
        Self {
            x,
            theta,
            amplitude: 1.0,
            factory: Ray::plain,
            emission: Emission::new(1),
        }
    }

    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn with_factory(mut self, factory: RayFactory) -> Self {
        self.factory = factory;
        self
    }
}

impl Iterator for SingleRay {
    type Item = Ray;

    fn next(&mut self) -> Option<Ray> {
        self.emission.next_index()?;
        Some((self.factory)(self.x, self.theta, self.amplitude))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.emission.remaining();
        (n, Some(n))
    }
}

impl_source!(SingleRay);

/// Collimated beam: every ray has the same angle, positions are sampled.
pub struct ConstantAngle {
    theta: f64,
    x_dist: Sampler,
    factory: RayFactory,
    emission: Emission,
}

impl ConstantAngle {
    pub fn new(num_rays: usize, theta: f64, x_dist: Sampler) -> Self {
        Self {
            theta,
            x_dist,
            factory: Ray::plain,
            emission: Emission::new(num_rays),
        }
    }

    pub fn with_factory(mut self, factory: RayFactory) -> Self {
        self.factory = factory;
        self
    }
}

impl Iterator for ConstantAngle {
    type Item = Ray;

    fn next(&mut self) -> Option<Ray> {
        self.emission.next_index()?;
        let x = (self.x_dist)();
        Some((self.factory)(x, self.theta, 1.0))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.emission.remaining();
        (n, Some(n))
    }
}

impl_source!(ConstantAngle);

/// Angular fan from a single point: `theta` sweeps evenly over `span`,
/// centered on the optical axis.
pub struct AngleSpan {
    x: f64,
    span: f64,
    factory: RayFactory,
    emission: Emission,
}

impl AngleSpan {
    /// Fan of `num_rays` from `x = 0` covering `[-π/4, π/4]`.
    pub fn new(num_rays: usize) -> Self {
        Self {
            x: 0.0,
            span: std::f64::consts::FRAC_PI_2,
            factory: Ray::plain,
            emission: Emission::new(num_rays),
        }
    }

    /// Lateral position shared by all rays.
    pub fn with_x(mut self, x: f64) -> Self {
        self.x = x;
        self
    }

    /// Full angular width of the fan (radians).
    pub fn with_span(mut self, span: f64) -> Self {
        self.span = span;
        self
    }

    pub fn with_factory(mut self, factory: RayFactory) -> Self {
        self.factory = factory;
        self
    }
}

impl Iterator for AngleSpan {
    type Item = Ray;

    fn next(&mut self) -> Option<Ray> {
        let index = self.emission.next_index()?;
        let theta = fan_offset(index, self.emission.num_rays, self.span);
        Some((self.factory)(self.x, theta, 1.0))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.emission.remaining();
        (n, Some(n))
    }
}

impl_source!(AngleSpan);

/// Positional fan: parallel rays evenly spaced over `span` around `center`.
pub struct PositionSpan {
    center: f64,
    span: f64,
    theta: f64,
    factory: RayFactory,
    emission: Emission,
}

impl PositionSpan {
    pub fn new(num_rays: usize, span: f64) -> Self {
        Self {
            center: 0.0,
            span,
            theta: 0.0,
            factory: Ray::plain,
            emission: Emission::new(num_rays),
        }
    }

    pub fn with_center(mut self, center: f64) -> Self {
        self.center = center;
        self
    }

    /// Angle shared by all rays.
    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    pub fn with_factory(mut self, factory: RayFactory) -> Self {
        self.factory = factory;
        self
    }
}

impl Iterator for PositionSpan {
    type Item = Ray;

    fn next(&mut self) -> Option<Ray> {
        let index = self.emission.next_index()?;
        let x = self.center + fan_offset(index, self.emission.num_rays, self.span);
        Some((self.factory)(x, self.theta, 1.0))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.emission.remaining();
        (n, Some(n))
    }
}

impl_source!(PositionSpan);

/// Monte-Carlo source: every ray attribute is drawn from a sampler.
pub struct RandomSource {
    x_dist: Sampler,
    theta_dist: Sampler,
    z_dist: Sampler,
    amplitude_dist: Sampler,
    factory: RayFactory,
    emission: Emission,
}

impl RandomSource {
    /// Rays start at `z = 0` with amplitude 1 unless overridden.
    pub fn new(num_rays: usize, x_dist: Sampler, theta_dist: Sampler) -> Self {
        Self {
            x_dist,
            theta_dist,
            z_dist: sampler::constant(0.0),
            amplitude_dist: sampler::constant(1.0),
            factory: Ray::plain,
            emission: Emission::new(num_rays),
        }
    }

    pub fn with_z(mut self, z_dist: Sampler) -> Self {
        self.z_dist = z_dist;
        self
    }

    pub fn with_amplitude(mut self, amplitude_dist: Sampler) -> Self {
        self.amplitude_dist = amplitude_dist;
        self
    }

    pub fn with_factory(mut self, factory: RayFactory) -> Self {
        self.factory = factory;
        self
    }
}

impl Iterator for RandomSource {
    type Item = Ray;

    fn next(&mut self) -> Option<Ray> {
        self.emission.next_index()?;
        let x = (self.x_dist)();
        let theta = (self.theta_dist)();
        let amplitude = (self.amplitude_dist)();
        let z = (self.z_dist)();
        Some((self.factory)(x, theta, amplitude).at_z(z))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.emission.remaining();
        (n, Some(n))
    }
}

impl_source!(RandomSource);
