//! Vector utility functions like linspace(), digitize()

/// Returns `num` evenly spaced values over `[start, end]` (both included).
pub fn linspace(start: f64, end: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let span = end - start;
            let last = (num - 1) as f64;
            (0..num)
                .map(|i| {
                    if i == num - 1 {
                        end
                    } else {
                        start + span * (i as f64) / last
                    }
                })
                .collect()
        }
    }
}

/// Returns the bucket of `value` given sorted bin `edges`.
///
/// The bucket is the number of edges strictly less than `value`, so there are
/// `edges.len() + 1` buckets with open-ended ones at both extremes.
pub fn digitize(value: f64, edges: &[f64]) -> usize {
    edges.partition_point(|&edge| edge < value)
}

/// Checks that all values are finite and in non-decreasing order.
pub fn is_ascending(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite()) && values.windows(2).all(|w| w[0] <= w[1])
}

/// Checks if two arrays or vectors are almost equal.
///
/// Elements in both containers must be in the same order.
#[cfg(test)]
pub(crate) fn almost_equal(a: &[f64], b: &[f64], eps: f64) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).all(|(&x, &y)| (x - y).abs() <= eps)
}
