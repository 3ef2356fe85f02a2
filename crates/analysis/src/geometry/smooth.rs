//! Centered moving-average smoothing.

use model::GeometricPoint;

/// Replaces each point with the mean of itself and up to `window / 2`
/// neighbours per side, clipped at the ends (no wraparound).
///
/// Returns the input unchanged when it is not longer than `window`.
/// Metadata stays with the centre point.
pub fn smooth(points: &[GeometricPoint], window: usize) -> Vec<GeometricPoint> {
    let n = points.len();
    if n <= window {
        return points.to_vec();
    }
    let half = window / 2;

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let from = i.saturating_sub(half);
        let to = (i + half + 1).min(n);
        let mut sx = 0.0;
        let mut sy = 0.0;
        for p in &points[from..to] {
            sx += p.x;
            sy += p.y;
        }
        let cnt = (to - from) as f64;
        out.push(points[i].moved_to(sx / cnt, sy / cnt));
    }
    out
}
