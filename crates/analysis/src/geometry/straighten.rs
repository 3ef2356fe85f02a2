//! Snaps points on geometrically straight sections onto a fitted line.
//!
//! Noisy source positions leave small zig-zags on straights that smoothing
//! alone only flattens partially. A window whose x and y coordinates are
//! strongly correlated is treated as straight and its centre point is
//! projected onto the least-squares line through the window.

use model::GeometricPoint;
use tracing::trace;

/// Slopes steeper than this are handled as vertical.
const VERTICAL_SLOPE: f64 = 1e6;

pub fn straighten(
    points: &[GeometricPoint],
    window: usize,
    threshold: f64,
    min_points: usize,
) -> Vec<GeometricPoint> {
    let n = points.len();
    let half = window / 2;
    let mut out = Vec::with_capacity(n);
    let mut snapped = 0usize;

    for i in 0..n {
        let from = i.saturating_sub(half);
        let to = (i + half + 1).min(n);
        let w = &points[from..to];
        let p = &points[i];

        if w.len() < min_points {
            out.push(p.clone());
            continue;
        }
        let fit = match LineFit::of(w) {
            Some(f) => f,
            None => {
                out.push(p.clone());
                continue;
            }
        };
        // flat or vertical windows produce a NaN r
        if fit.r.is_nan() || fit.r.abs() <= threshold {
            out.push(p.clone());
            continue;
        }
        let (x, y) = fit.project(p.x, p.y);
        out.push(p.moved_to(x, y));
        snapped += 1;
    }

    trace!(points = n, snapped, "straightened polyline");
    out
}

/// Ordinary least-squares fit of y on x plus Pearson's r.
struct LineFit {
    mx: f64,
    my: f64,
    sxx: f64,
    sxy: f64,
    r: f64,
}

impl LineFit {
    fn of(w: &[GeometricPoint]) -> Option<Self> {
        if w.is_empty() {
            return None;
        }
        let n = w.len() as f64;
        let mx = w.iter().map(|p| p.x).sum::<f64>() / n;
        let my = w.iter().map(|p| p.y).sum::<f64>() / n;
        let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
        for p in w {
            let dx = p.x - mx;
            let dy = p.y - my;
            sxx += dx * dx;
            syy += dy * dy;
            sxy += dx * dy;
        }
        let r = sxy / (sxx * syy).sqrt();
        Some(Self { mx, my, sxx, sxy, r })
    }

    /// Orthogonal projection of (x, y) onto the fitted line.
    fn project(&self, x: f64, y: f64) -> (f64, f64) {
        if self.sxx <= f64::EPSILON {
            return (self.mx, y);
        }
        let m = self.sxy / self.sxx;
        if m.abs() > VERTICAL_SLOPE {
            return (self.mx, y);
        }
        let b = self.my - m * self.mx;
        let px = (x + m * (y - b)) / (1.0 + m * m);
        (px, m * px + b)
    }
}
