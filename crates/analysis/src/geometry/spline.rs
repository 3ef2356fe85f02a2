//! Catmull-Rom densification.

use model::GeometricPoint;

/// Inserts `density` Catmull-Rom points between each consecutive pair.
///
/// Needs at least four points; shorter input comes back as-is. Ends are
/// clamped by reusing the boundary point as its own outer neighbour.
/// Inserted points carry no metadata.
pub fn densify(points: &[GeometricPoint], density: usize) -> Vec<GeometricPoint> {
    let n = points.len();
    if n < 4 || density == 0 {
        return points.to_vec();
    }

    let mut out = Vec::with_capacity(n + (n - 1) * density);
    for i in 0..n - 1 {
        let p0 = &points[i.saturating_sub(1)];
        let p1 = &points[i];
        let p2 = &points[i + 1];
        let p3 = &points[(i + 2).min(n - 1)];

        out.push(p1.clone());
        for k in 1..=density {
            let t = k as f64 / (density + 1) as f64;
            let (x, y) = catmull_rom(p0, p1, p2, p3, t);
            out.push(GeometricPoint::new(x, y));
        }
    }
    out.push(points[n - 1].clone());
    out
}

/// Uniform Catmull-Rom between `p1` (t = 0) and `p2` (t = 1).
fn catmull_rom(
    p0: &GeometricPoint,
    p1: &GeometricPoint,
    p2: &GeometricPoint,
    p3: &GeometricPoint,
    t: f64,
) -> (f64, f64) {
    let t2 = t * t;
    let t3 = t2 * t;
    let f = |a: f64, b: f64, c: f64, d: f64| {
        0.5 * ((2.0 * b)
            + (-a + c) * t
            + (2.0 * a - 5.0 * b + 4.0 * c - d) * t2
            + (-a + 3.0 * b - 3.0 * c + d) * t3)
    };
    (f(p0.x, p1.x, p2.x, p3.x), f(p0.y, p1.y, p2.y, p3.y))
}
