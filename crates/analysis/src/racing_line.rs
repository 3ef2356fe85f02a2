//! Racing line and track boundary rails for the bird's-eye map.

use model::{GeometricPoint, RenderableLine, TelemetryPoint, TrackMap};
use tracing::debug;
use uuid::Uuid;

use crate::config::{EngineConfig, RailConfig};
use crate::geometry::{bbox_of, densify, simplify, smooth, straighten};

/// Builds map geometry for laps using one engine configuration.
#[derive(Clone, Debug, Default)]
pub struct RacingLineBuilder {
    config: EngineConfig,
}

impl RacingLineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The driven line, point for point. Never simplified: hover and
    /// tooltip lookups index into it by sample.
    pub fn racing_line(
        &self,
        lap_id: Uuid,
        points: &[TelemetryPoint],
        color: Option<&str>,
    ) -> RenderableLine {
        let pl: Vec<GeometricPoint> = points.iter().filter_map(GeometricPoint::from_telemetry).collect();
        RenderableLine {
            id: format!("{lap_id}-line-world"),
            points: pl,
            color: color.unwrap_or(self.config.render.racing_line_color.as_str()).to_string(),
            highlight: true,
            interactive: true,
        }
    }

    /// Left and right track edges, or an empty vec when fewer than three
    /// samples carry both a position and a track edge.
    pub fn boundary_rails(&self, lap_id: Uuid, points: &[TelemetryPoint]) -> Vec<RenderableLine> {
        let cfg = &self.config.rails;

        let mut centre = Vec::with_capacity(points.len());
        let mut edges = Vec::with_capacity(points.len());
        for p in points {
            let edge = match p.track_edge {
                Some(e) if e.is_finite() => e,
                _ => continue,
            };
            if let Some(g) = GeometricPoint::from_telemetry(p) {
                centre.push(g);
                edges.push(edge.abs());
            }
        }
        if centre.len() < 3 {
            debug!(%lap_id, usable = centre.len(), "not enough points for rails");
            return Vec::new();
        }

        // one width for the whole lap keeps the rails parallel
        let half_width = median(&mut edges) * cfg.width_margin;
        let (left, right) = offset_rails(&centre, half_width, cfg);
        if left.len() < 2 {
            debug!(%lap_id, "rail tangents degenerate");
            return Vec::new();
        }

        let target = points.len();
        let left = refine_rail(&left, target, cfg);
        let right = refine_rail(&right, target, cfg);
        debug!(
            %lap_id,
            input = points.len(),
            usable = centre.len(),
            half_width,
            rail_points = left.len(),
            "built boundary rails"
        );

        let color = &self.config.render.rail_color;
        vec![
            rail_line(format!("{lap_id}-rail-left-world"), left, color),
            rail_line(format!("{lap_id}-rail-right-world"), right, color),
        ]
    }

    pub fn track_map(&self, lap_id: Uuid, points: &[TelemetryPoint]) -> TrackMap {
        let racing_line = self.racing_line(lap_id, points, None);
        let rails = self.boundary_rails(lap_id, points);
        let bbox = bbox_of(
            racing_line
                .points
                .iter()
                .chain(rails.iter().flat_map(|r| r.points.iter())),
        );
        TrackMap { racing_line, rails, bbox }
    }
}

pub fn build_racing_line(lap_id: Uuid, points: &[TelemetryPoint], color: Option<&str>) -> RenderableLine {
    RacingLineBuilder::default().racing_line(lap_id, points, color)
}

pub fn build_boundary_rails(lap_id: Uuid, points: &[TelemetryPoint]) -> Vec<RenderableLine> {
    RacingLineBuilder::default().boundary_rails(lap_id, points)
}

pub fn build_track_map(lap_id: Uuid, points: &[TelemetryPoint]) -> TrackMap {
    RacingLineBuilder::default().track_map(lap_id, points)
}

fn rail_line(id: String, points: Vec<GeometricPoint>, color: &str) -> RenderableLine {
    RenderableLine { id, points, color: color.to_string(), highlight: false, interactive: false }
}

fn median(v: &mut [f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.sort_by(f64::total_cmp);
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        (v[mid - 1] + v[mid]) / 2.0
    } else {
        v[mid]
    }
}

/// Offsets every point by `half_width` along its left normal.
///
/// The tangent looks a few samples ahead (behind, near the end) so
/// frame-to-frame jitter does not swing the normal around. Points with a
/// zero-length tangent are skipped.
fn offset_rails(
    pts: &[GeometricPoint],
    half_width: f64,
    cfg: &RailConfig,
) -> (Vec<GeometricPoint>, Vec<GeometricPoint>) {
    let n = pts.len();
    let k = cfg
        .lookahead_max
        .min(n / cfg.lookahead_divisor.max(1))
        .max(1);

    let mut left = Vec::with_capacity(n);
    let mut right = Vec::with_capacity(n);
    let mut skipped = 0usize;
    for i in 0..n {
        let (a, b) = if i + k < n {
            (i, i + k)
        } else if i >= k {
            (i - k, i)
        } else {
            (0, n - 1)
        };
        let tx = pts[b].x - pts[a].x;
        let ty = pts[b].y - pts[a].y;
        let len = (tx * tx + ty * ty).sqrt();
        if len <= f64::EPSILON {
            skipped += 1;
            continue;
        }
        let nx = -ty / len;
        let ny = tx / len;
        let p = &pts[i];
        left.push(GeometricPoint::new(p.x + nx * half_width, p.y + ny * half_width));
        right.push(GeometricPoint::new(p.x - nx * half_width, p.y - ny * half_width));
    }
    if skipped > 0 {
        debug!(skipped, "skipped points with zero-length tangent");
    }
    (left, right)
}

/// Straighten, smooth, simplify, densify back to about `target` points,
/// smooth again. Straightening must come before densification.
fn refine_rail(rail: &[GeometricPoint], target: usize, cfg: &RailConfig) -> Vec<GeometricPoint> {
    let mut r = straighten(rail, cfg.straight_window, cfg.straight_threshold, cfg.straight_min_points);
    for &w in &cfg.smooth_passes {
        r = smooth(&r, w);
    }

    let simplified = simplify(&r, cfg.simplify_tolerance);
    if simplified.len() >= 4 {
        r = simplified;
    }

    let r = densify(&r, rail_density(target, r.len()));
    smooth(&r, cfg.final_smooth_window)
}

/// Points to insert per gap so `rail_len` points grow to at least `target`.
fn rail_density(target: usize, rail_len: usize) -> usize {
    if rail_len >= 2 && target > rail_len {
        (target - rail_len).div_ceil(rail_len - 1)
    } else {
        0
    }
}
