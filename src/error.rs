use thiserror::Error;

/// Invalid element or detector configuration.
///
/// Raised by constructors. A configuration error is never a per-ray
/// condition: it means the setup itself cannot be simulated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("focal length must be finite and non-zero, got {0}")]
    InvalidFocalLength(f64),

    #[error("distance must be finite and non-negative, got {0}")]
    InvalidDistance(f64),

    #[error("aperture bounds are inverted: left {left} > right {right}")]
    InvertedAperture { left: f64, right: f64 },

    #[error("radius must be finite and positive, got {0}")]
    InvalidRadius(f64),

    #[error("refractive index must be finite and positive, got {0}")]
    InvalidRefractiveIndex(f64),

    #[error("bin edges must be finite and sorted in ascending order")]
    UnsortedEdges,
}
