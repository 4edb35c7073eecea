pub mod rotation;

/// Geometric precision
#[cfg(test)]
const EPS: f64 = 1e-12;

/// Approximate equality within the geometric precision.
#[cfg(test)]
pub(crate) trait IsClose {
    fn is_close(&self, other: Self) -> bool;
}

#[cfg(test)]
impl IsClose for f64 {
    fn is_close(&self, other: f64) -> bool {
        (self - other).abs() < EPS
    }
}
