use crate::Ray;

/// Rotates the vector `(x, z)` by `phi` (radians).
///
/// Angles are measured from the z axis toward +x, the same convention as
/// [`Ray::theta`]: a vector at angle `alpha` ends up at `alpha + phi`.
pub fn rotate(x: f64, z: f64, phi: f64) -> (f64, f64) {
    let (s, c) = phi.sin_cos();
    (x * c + z * s, z * c - x * s)
}

/// Converts a global point to the ray frame.
///
/// The ray position is the origin of the ray frame and the ray direction is
/// its z axis. Returns `(x_local, z_local)`.
pub fn to_ray_frame(ray: &Ray, x: f64, z: f64) -> (f64, f64) {
    rotate(x - ray.x, z - ray.z, -ray.theta)
}

/// Converts a point in the ray frame back to global coordinates.
pub fn to_global_frame(ray: &Ray, x_local: f64, z_local: f64) -> (f64, f64) {
    let (dx, dz) = rotate(x_local, z_local, ray.theta);
    (ray.x + dx, ray.z + dz)
}
