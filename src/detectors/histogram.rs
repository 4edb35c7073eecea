use ndarray::{Array1, Array2, Axis};
use serde::Serialize;

use super::{Detector, DetectorReport};
use crate::Ray;
use crate::error::ConfigError;
use crate::vecutils::{digitize, is_ascending, linspace};

/// Number of angle edges used when none are given.
pub const DEFAULT_ANGLE_EDGES: usize = 100;

fn check_edges(edges: Vec<f64>) -> Result<Vec<f64>, ConfigError> {
    if !is_ascending(&edges) {
        return Err(ConfigError::UnsortedEdges);
    }
    Ok(edges)
}

/// Amplitude-weighted histogram of the lateral position.
pub struct PositionHistogram {
    name: String,
    x_bins: Vec<f64>,
    data: Array1<f64>,
}

impl PositionHistogram {
    /// Creates a histogram over sorted bin `edges`.
    ///
    /// There is one bucket per gap between edges plus one open-ended bucket
    /// on each side.
    pub fn new(name: &str, edges: Vec<f64>) -> Result<Self, ConfigError> {
        let x_bins = check_edges(edges)?;
        let data = Array1::zeros(x_bins.len() + 1);
        Ok(Self {
            name: name.to_string(),
            x_bins,
            data,
        })
    }
}

impl Detector for PositionHistogram {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&mut self, ray: &Ray) {
        let x_bin = digitize(ray.x, &self.x_bins);
        self.data[x_bin] += ray.amplitude;
    }

    fn report(&self) -> DetectorReport {
        DetectorReport::Position(PositionReport {
            x_bins: Array1::from(self.x_bins.clone()),
            data: self.data.clone(),
        })
    }
}

/// Edges and weighted counts of a [`PositionHistogram`].
#[derive(Debug, Clone, Serialize)]
pub struct PositionReport {
    pub x_bins: Array1<f64>,
    pub data: Array1<f64>,
}

impl PositionReport {
    pub fn total(&self) -> f64 {
        self.data.sum()
    }

    /// Share of the total weight per bucket (all zeros if nothing arrived).
    pub fn fractions(&self) -> Array1<f64> {
        let total = self.total();
        if total > 0.0 {
            &self.data / total
        } else {
            Array1::zeros(self.data.len())
        }
    }
}

/// Amplitude-weighted 2-D histogram over position and angle.
pub struct PositionAngleHistogram {
    name: String,
    x_bins: Vec<f64>,
    th_bins: Vec<f64>,
    data: Array2<f64>,
}

impl PositionAngleHistogram {
    /// Creates a histogram with the default angle edges: `linspace(-π/2, π/2)`
    /// with [`DEFAULT_ANGLE_EDGES`] points.
    pub fn new(name: &str, x_edges: Vec<f64>) -> Result<Self, ConfigError> {
        Self::with_angle_count(name, x_edges, DEFAULT_ANGLE_EDGES)
    }

    /// Uses `count` evenly spaced angle edges over `[-π/2, π/2]`.
    pub fn with_angle_count(
        name: &str,
        x_edges: Vec<f64>,
        count: usize,
    ) -> Result<Self, ConfigError> {
        let half_pi = std::f64::consts::FRAC_PI_2;
        Self::with_angle_edges(name, x_edges, linspace(-half_pi, half_pi, count))
    }

    pub fn with_angle_edges(
        name: &str,
        x_edges: Vec<f64>,
        th_edges: Vec<f64>,
    ) -> Result<Self, ConfigError> {
        let x_bins = check_edges(x_edges)?;
        let th_bins = check_edges(th_edges)?;
        let data = Array2::zeros((x_bins.len() + 1, th_bins.len() + 1));
        Ok(Self {
            name: name.to_string(),
            x_bins,
            th_bins,
            data,
        })
    }
}

impl Detector for PositionAngleHistogram {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&mut self, ray: &Ray) {
        let x_bin = digitize(ray.x, &self.x_bins);
        let th_bin = digitize(ray.theta, &self.th_bins);
        self.data[[x_bin, th_bin]] += ray.amplitude;
    }

    fn report(&self) -> DetectorReport {
        DetectorReport::PositionAngle(PositionAngleReport {
            x_bins: Array1::from(self.x_bins.clone()),
            th_bins: Array1::from(self.th_bins.clone()),
            data: self.data.clone(),
        })
    }
}

/// Edges and weighted counts of a [`PositionAngleHistogram`].
///
/// `data[[x_bucket, theta_bucket]]`
#[derive(Debug, Clone, Serialize)]
pub struct PositionAngleReport {
    pub x_bins: Array1<f64>,
    pub th_bins: Array1<f64>,
    pub data: Array2<f64>,
}

impl PositionAngleReport {
    pub fn total(&self) -> f64 {
        self.data.sum()
    }

    /// Weight per position bucket, summed over all angles.
    pub fn position_marginal(&self) -> Array1<f64> {
        self.data.sum_axis(Axis(1))
    }

    /// Weight per angle bucket, summed over all positions.
    pub fn angle_marginal(&self) -> Array1<f64> {
        self.data.sum_axis(Axis(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_histogram_weights_by_amplitude() {
        let mut h = PositionHistogram::new("camera", vec![-1.0, 0.0, 1.0]).unwrap();
        h.detect(&Ray::with_amplitude(-2.0, 0.0, 0.5));
        h.detect(&Ray::with_amplitude(0.5, 0.0, 2.0));
        h.detect(&Ray::with_amplitude(0.25, 0.0, 1.0));
        h.detect(&Ray::new(5.0, 0.0));

        let report = h.report();
        let r = report.position().unwrap();
        assert_eq!(r.data.len(), 4);
        assert_eq!(r.data.to_vec(), vec![0.5, 0.0, 3.0, 1.0]);
        assert!((r.total() - 4.5).abs() < 1e-12);
        assert_eq!(h.name(), "camera");
    }

    #[test]
    fn test_value_on_edge_goes_below() {
        let mut h =
            PositionAngleHistogram::with_angle_edges("h", vec![0.0, 1.0], vec![-0.5, 0.5]).unwrap();
        h.detect(&Ray::new(1.0, -0.5));
        h.detect(&Ray::new(0.5, 0.5));

        let report = h.report();
        let r = report.position_angle().unwrap();
        assert_eq!(r.data[[1, 0]], 1.0);
        assert_eq!(r.data[[1, 1]], 1.0);
        assert!((r.total() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_fractions() {
        let mut h = PositionHistogram::new("h", vec![0.0]).unwrap();
        let empty = h.report();
        assert_eq!(empty.position().unwrap().fractions().to_vec(), vec![0.0, 0.0]);

        h.detect(&Ray::new(-1.0, 0.0));
        h.detect(&Ray::new(1.0, 0.0));
        h.detect(&Ray::new(2.0, 0.0));
        h.detect(&Ray::new(3.0, 0.0));
        let report = h.report();
        let f = report.position().unwrap().fractions();
        assert!((f[0] - 0.25).abs() < 1e-12);
        assert!((f[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_unsorted_edges_rejected() {
        assert!(matches!(
            PositionHistogram::new("h", vec![1.0, 0.0]),
            Err(ConfigError::UnsortedEdges)
        ));
        assert!(PositionAngleHistogram::with_angle_edges("h", vec![0.0], vec![0.5, -0.5]).is_err());
    }

    #[test]
    fn test_default_angle_edges() {
        let h = PositionAngleHistogram::new("h", vec![0.0]).unwrap();
        let report = h.report();
        let r = report.position_angle().unwrap();
        assert_eq!(r.th_bins.len(), DEFAULT_ANGLE_EDGES);
        assert_eq!(r.th_bins[0], -std::f64::consts::FRAC_PI_2);
        assert_eq!(r.th_bins[DEFAULT_ANGLE_EDGES - 1], std::f64::consts::FRAC_PI_2);
        assert_eq!(r.data.dim(), (2, DEFAULT_ANGLE_EDGES + 1));
    }

    #[test]
    fn test_position_angle_grid() {
        let mut h =
            PositionAngleHistogram::with_angle_edges("h", vec![0.0, 1.0], vec![0.0]).unwrap();
        h.detect(&Ray::with_amplitude(0.5, -0.1, 2.0));
        h.detect(&Ray::with_amplitude(0.5, 0.1, 1.0));
        h.detect(&Ray::with_amplitude(3.0, 0.1, 0.25));

        let report = h.report();
        let r = report.position_angle().unwrap();
        assert_eq!(r.data[[1, 0]], 2.0);
        assert_eq!(r.data[[1, 1]], 1.0);
        assert_eq!(r.data[[2, 1]], 0.25);
        assert_eq!(r.position_marginal().to_vec(), vec![0.0, 3.0, 0.25]);
        assert_eq!(r.angle_marginal().to_vec(), vec![2.0, 1.25]);
        assert!((report.total().unwrap() - 3.25).abs() < 1e-12);
    }
}
