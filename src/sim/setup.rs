use anyhow::Result;

use crate::Ray;
use crate::detectors::{Detector, DetectorReport};
use crate::optics::{Extent, OpticalElement, Propagation};

/// A stage that both observes and acts on rays.
///
/// Its detector side runs first, so it sees the ray as it arrives.
pub trait Instrument: OpticalElement + Detector {}

impl<T: OpticalElement + Detector> Instrument for T {}

/// What a stage does to the rays passing through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub propagates: bool,
    pub observes: bool,
}

/// One entry of a [`Setup`].
pub enum Stage {
    Element(Box<dyn OpticalElement>),
    Detector(Box<dyn Detector>),
    Instrument(Box<dyn Instrument>),
}

impl Stage {
    pub fn capabilities(&self) -> Capabilities {
        match self {
            Stage::Element(_) => Capabilities {
                propagates: true,
                observes: false,
            },
            Stage::Detector(_) => Capabilities {
                propagates: false,
                observes: true,
            },
            Stage::Instrument(_) => Capabilities {
                propagates: true,
                observes: true,
            },
        }
    }

    /// Width along z, `None` for stages without extent (pure detectors).
    pub(crate) fn dz(&self) -> Option<f64> {
        match self {
            Stage::Element(e) => Some(e.dz()),
            Stage::Detector(_) => None,
            Stage::Instrument(i) => Some(i.dz()),
        }
    }

    pub(crate) fn detector_name(&self) -> Option<&str> {
        match self {
            Stage::Element(_) => None,
            Stage::Detector(d) => Some(d.name()),
            Stage::Instrument(i) => Some(i.name()),
        }
    }

    pub(crate) fn detect(&mut self, ray: &Ray) {
        match self {
            Stage::Element(_) => {}
            Stage::Detector(d) => d.detect(ray),
            Stage::Instrument(i) => i.detect(ray),
        }
    }

    pub(crate) fn propagate(&self, ray: &mut Ray, extent: &Extent) -> Result<Propagation> {
        match self {
            Stage::Element(e) => e.propagate(ray, extent),
            Stage::Detector(_) => Ok(Propagation::Continue),
            Stage::Instrument(i) => i.propagate(ray, extent),
        }
    }

    pub(crate) fn post_process(&mut self) {
        match self {
            Stage::Element(_) => {}
            Stage::Detector(d) => d.post_process(),
            Stage::Instrument(i) => i.post_process(),
        }
    }

    pub(crate) fn report(&self) -> Option<DetectorReport> {
        match self {
            Stage::Element(_) => None,
            Stage::Detector(d) => Some(d.report()),
            Stage::Instrument(i) => Some(i.report()),
        }
    }
}

/// Ordered sequence of stages. The order is the execution order for every
/// ray.
pub struct Setup {
    stages: Vec<Stage>,
}

impl Setup {
    pub fn new() -> Self {
        Self { stages: vec![] }
    }

    pub fn with_element<E: OpticalElement + 'static>(mut self, element: E) -> Self {
        self.stages.push(Stage::Element(Box::new(element)));
        self
    }

    pub fn with_detector<D: Detector + 'static>(mut self, detector: D) -> Self {
        self.stages.push(Stage::Detector(Box::new(detector)));
        self
    }

    pub fn with_instrument<I: Instrument + 'static>(mut self, instrument: I) -> Self {
        self.stages.push(Stage::Instrument(Box::new(instrument)));
        self
    }

    pub fn push(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub(crate) fn stages_mut(&mut self) -> &mut [Stage] {
        &mut self.stages
    }
}

impl Default for Setup {
    fn default() -> Self {
        Self::new()
    }
}
