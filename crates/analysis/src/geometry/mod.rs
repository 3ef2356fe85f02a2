//! Polyline transforms used to turn noisy lap positions into map geometry.
//!
//! All functions are pure and infallible: degenerate input comes back
//! unchanged (or smaller), never as an error.

pub mod simplify;
pub mod smooth;
pub mod spline;
pub mod straighten;

pub use simplify::simplify;
pub use smooth::smooth;
pub use spline::densify;
pub use straighten::straighten;

use model::{BBox, GeometricPoint};

/// Squared distance from `p` to the segment `a`-`b`.
/// A zero-length segment falls back to the point distance.
pub(crate) fn seg_dist_sq(p: &GeometricPoint, a: &GeometricPoint, b: &GeometricPoint) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return p.dist_sq(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    let cx = a.x + t * dx;
    let cy = a.y + t * dy;
    (p.x - cx) * (p.x - cx) + (p.y - cy) * (p.y - cy)
}

pub fn bbox_of<'a, I>(points: I) -> Option<BBox>
where
    I: IntoIterator<Item = &'a GeometricPoint>,
{
    let mut it = points.into_iter();
    let first = it.next()?;
    let mut b = BBox { minx: first.x, maxx: first.x, miny: first.y, maxy: first.y };
    for p in it {
        b.minx = b.minx.min(p.x);
        b.maxx = b.maxx.max(p.x);
        b.miny = b.miny.min(p.y);
        b.maxy = b.maxy.max(p.y);
    }
    Some(b)
}

#[cfg(test)]
pub(crate) fn line(coords: &[(f64, f64)]) -> Vec<GeometricPoint> {
    coords.iter().map(|&(x, y)| GeometricPoint::new(x, y)).collect()
}
