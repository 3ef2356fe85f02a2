use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recorded telemetry sample as supplied by the storage layer.
///
/// Position and track edge are optional because sources drop them on
/// sparse frames; everything downstream filters on them once.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct TelemetryPoint {
    pub id: Uuid,
    pub index: u32,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
    pub speed: f64,
    #[serde(default)]
    pub throttle: Option<f64>,
    #[serde(default)]
    pub brake: Option<f64>,
    #[serde(default)]
    pub steering: Option<f64>,
    #[serde(default)]
    pub gear: Option<i8>,
    #[serde(default)]
    pub rpm: Option<f64>,
    pub lap_progress: f64,
    #[serde(default)]
    pub track_edge: Option<f64>,
    pub session_elapsed: f64,
    #[serde(default)]
    pub timestamp_ms: Option<i64>,
}

impl TelemetryPoint {
    /// Bare sample at `progress` with no inputs, position or edge.
    pub fn new(index: u32, lap_progress: f64, session_elapsed: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            index,
            x: None,
            y: None,
            z: None,
            speed: 0.0,
            throttle: None,
            brake: None,
            steering: None,
            gear: None,
            rpm: None,
            lap_progress,
            track_edge: None,
            session_elapsed,
            timestamp_ms: None,
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_track_edge(mut self, edge: f64) -> Self {
        self.track_edge = Some(edge);
        self
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((x, y)),
            _ => None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct PointMeta {
    pub speed: f64,
    pub throttle: Option<f64>,
    pub brake: Option<f64>,
    pub gear: Option<i8>,
    pub rpm: Option<f64>,
    pub steering: Option<f64>,
    pub source_index: u32,
    pub timestamp_ms: Option<i64>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct GeometricPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PointMeta>,
}

impl GeometricPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, meta: None }
    }

    /// Lifts a sample into geometry space, carrying its inputs along.
    /// Samples without a finite position yield `None`.
    pub fn from_telemetry(p: &TelemetryPoint) -> Option<Self> {
        let (x, y) = p.position()?;
        Some(Self {
            x,
            y,
            meta: Some(PointMeta {
                speed: p.speed,
                throttle: p.throttle,
                brake: p.brake,
                gear: p.gear,
                rpm: p.rpm,
                steering: p.steering,
                source_index: p.index,
                timestamp_ms: p.timestamp_ms,
            }),
        })
    }

    /// Same metadata, new position.
    pub fn moved_to(&self, x: f64, y: f64) -> Self {
        Self { x, y, meta: self.meta.clone() }
    }

    pub fn dist_sq(&self, other: &GeometricPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

pub type Polyline = Vec<GeometricPoint>;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RenderableLine {
    pub id: String,
    #[serde(default)]
    pub points: Polyline,
    pub color: String,
    pub highlight: bool,
    pub interactive: bool,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct LapMeta {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub lap_number: u32,
    #[serde(default)]
    pub lap_time_s: Option<f64>,
    pub valid: bool,
    #[serde(default)]
    pub personal_best: bool,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct LapTelemetrySeries {
    pub lap_id: Uuid,
    #[serde(default)]
    pub lap_time_s: Option<f64>,
    #[serde(default)]
    pub points: Vec<TelemetryPoint>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct DeltaRecord {
    pub sample_id: Uuid,
    pub delta_to_personal_best: f64,
    pub delta_to_session_best: f64,
    pub reference_lap_id: Uuid,
}

pub type DeltaMap = HashMap<Uuid, DeltaRecord>;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct BBox {
    pub minx: f64,
    pub maxx: f64,
    pub miny: f64,
    pub maxy: f64,
}

impl BBox {
    pub fn width(&self) -> f64 {
        self.maxx - self.minx
    }

    pub fn height(&self) -> f64 {
        self.maxy - self.miny
    }
}

/// Everything a bird's-eye map needs for one lap.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct TrackMap {
    pub racing_line: RenderableLine,
    #[serde(default)]
    pub rails: Vec<RenderableLine>,
    #[serde(default)]
    pub bbox: Option<BBox>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_telemetry_drops_missing_positions() {
        let p = TelemetryPoint::new(0, 0.0, 0.0);
        assert!(GeometricPoint::from_telemetry(&p).is_none());

        let p = TelemetryPoint::new(0, 0.0, 0.0).with_position(f64::NAN, 1.0);
        assert!(GeometricPoint::from_telemetry(&p).is_none());
    }

    #[test]
    fn from_telemetry_carries_inputs() {
        let mut p = TelemetryPoint::new(7, 0.2, 12.0).with_position(3.0, 4.0);
        p.speed = 140.0;
        p.gear = Some(4);
        p.timestamp_ms = Some(1_000);

        let g = GeometricPoint::from_telemetry(&p).unwrap();
        assert_eq!((g.x, g.y), (3.0, 4.0));
        let meta = g.meta.unwrap();
        assert_eq!(meta.source_index, 7);
        assert_eq!(meta.gear, Some(4));
        assert_eq!(meta.speed, 140.0);
        assert_eq!(meta.timestamp_ms, Some(1_000));
    }

    #[test]
    fn telemetry_point_optional_fields_default_when_absent() {
        let id = Uuid::new_v4();
        let raw = format!(
            r#"{{"id":"{id}","index":3,"speed":88.0,"lap_progress":0.5,"session_elapsed":41.2}}"#
        );
        let p: TelemetryPoint = serde_json::from_str(&raw).unwrap();
        assert_eq!(p.id, id);
        assert!(p.position().is_none());
        assert!(p.track_edge.is_none());
        assert_eq!(p.gear, None);
    }
}
