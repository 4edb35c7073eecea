//! Detectors.
//!
//! A detector observes rays without changing them and accumulates whatever
//! statistics it needs. After the last ray it gets one `post_process` call,
//! then its [`DetectorReport`] is collected into the simulation report under
//! the detector's name.

pub mod histogram;
pub mod ray_log;

use serde::Serialize;

use crate::Ray;

pub use histogram::{PositionAngleHistogram, PositionAngleReport, PositionHistogram, PositionReport};
pub use ray_log::RayLog;

/// An accumulator stage.
pub trait Detector {
    /// Key of this detector in the simulation report.
    fn name(&self) -> &str;

    /// Observes one ray.
    fn detect(&mut self, ray: &Ray);

    /// Runs once after all rays have been propagated.
    fn post_process(&mut self) {}

    fn report(&self) -> DetectorReport;
}

/// Result of a single detector.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectorReport {
    /// Every observed ray, in observation order.
    Rays { rays: Vec<Ray> },
    Position(PositionReport),
    PositionAngle(PositionAngleReport),
    /// Free-form result of a user-defined detector.
    Custom { value: serde_json::Value },
}

impl DetectorReport {
    pub fn rays(&self) -> Option<&[Ray]> {
        match self {
            DetectorReport::Rays { rays } => Some(rays),
            _ => None,
        }
    }

    pub fn position(&self) -> Option<&PositionReport> {
        match self {
            DetectorReport::Position(r) => Some(r),
            _ => None,
        }
    }

    pub fn position_angle(&self) -> Option<&PositionAngleReport> {
        match self {
            DetectorReport::PositionAngle(r) => Some(r),
            _ => None,
        }
    }

    /// Total weight collected, if the report is a histogram.
    pub fn total(&self) -> Option<f64> {
        match self {
            DetectorReport::Position(r) => Some(r.total()),
            DetectorReport::PositionAngle(r) => Some(r.total()),
            _ => None,
        }
    }
}
