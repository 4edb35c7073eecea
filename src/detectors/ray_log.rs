use super::{Detector, DetectorReport};
use crate::Ray;

/// Keeps a copy of every ray it observes.
///
/// Combined with [`Ray::traced`] this gives the full path of each ray up to
/// the point where the log sits in the setup.
pub struct RayLog {
    name: String,
    rays: Vec<Ray>,
}

impl RayLog {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rays: Vec::new(),
        }
    }

    pub fn rays(&self) -> &[Ray] {
        &self.rays
    }
}

impl Detector for RayLog {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&mut self, ray: &Ray) {
        self.rays.push(ray.clone());
    }

    fn report(&self) -> DetectorReport {
        DetectorReport::Rays {
            rays: self.rays.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_keeps_snapshots() {
        let mut log = RayLog::new("rays");
        let mut ray = Ray::with_amplitude(0.1, 0.2, 0.7);
        log.detect(&ray);

        // Later changes to the ray do not leak into the log
        ray.x = 9.0;
        log.detect(&ray);

        let report = log.report();
        let rays = report.rays().unwrap();
        assert_eq!(rays.len(), 2);
        assert_eq!(rays[0].x, 0.1);
        assert_eq!(rays[0].amplitude, 0.7);
        assert_eq!(rays[1].x, 9.0);
        assert_eq!(log.rays().len(), 2);
    }
}
