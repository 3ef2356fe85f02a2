//! Ramer-Douglas-Peucker simplification.

use model::GeometricPoint;

use super::seg_dist_sq;

/// Drops interior points that lie within `tolerance` of the chord between
/// the points kept around them. Inputs of two points or fewer come back
/// unchanged; every returned point is an input point.
pub fn simplify(points: &[GeometricPoint], tolerance: f64) -> Vec<GeometricPoint> {
    let n = points.len();
    if n <= 2 {
        return points.to_vec();
    }

    let tol_sq = tolerance * tolerance;
    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    // explicit stack; laps run to thousands of samples
    let mut stack = vec![(0usize, n - 1)];
    while let Some((first, last)) = stack.pop() {
        if last <= first + 1 {
            continue;
        }
        let mut max_sq = 0.0;
        let mut index = first;
        for i in (first + 1)..last {
            let d = seg_dist_sq(&points[i], &points[first], &points[last]);
            if d > max_sq {
                max_sq = d;
                index = i;
            }
        }
        if max_sq > tol_sq {
            keep[index] = true;
            stack.push((first, index));
            stack.push((index, last));
        }
    }

    points
        .iter()
        .zip(&keep)
        .filter(|(_, k)| **k)
        .map(|(p, _)| p.clone())
        .collect()
}
