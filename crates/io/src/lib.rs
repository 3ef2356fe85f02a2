use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::{fs::File, path::Path};
use serde::{Serialize, Deserialize};
use uuid::Uuid;
use model::*;
use analysis::EngineConfig;

mod store;
pub use store::MemoryStore;

/// A lap as the storage layer hands it over: metadata plus samples.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct LapRecord {
    pub meta: LapMeta,
    pub series: LapTelemetrySeries,
}

impl LapRecord {
    pub fn id(&self) -> Uuid {
        self.meta.id
    }
}

/// Reads one row per sample; consecutive rows sharing session, user and
/// lap number form one lap.
pub fn import_csv(path: &Path) -> Result<Vec<LapRecord>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut laps = Vec::<LapRecord>::new();
    let mut current: Option<LapRecord> = None;
    for rec in rdr.deserialize() {
        let r: CsvRow = rec?;
        let same_lap = current.as_ref().is_some_and(|l| {
            (l.meta.session_id, l.meta.user_id, l.meta.lap_number)
                == (r.session_id, r.user_id, r.lap_number)
        });
        if !same_lap {
            if let Some(l) = current.take() { laps.push(l); }
            current = Some(new_lap(&r));
        }
        if let Some(l) = &mut current {
            l.series.points.push(TelemetryPoint {
                id: r.sample_id.unwrap_or_else(Uuid::new_v4),
                index: r.index,
                x: r.x, y: r.y, z: r.z,
                speed: r.speed,
                throttle: r.throttle, brake: r.brake, steering: r.steering,
                gear: r.gear, rpm: r.rpm,
                lap_progress: r.lap_progress,
                track_edge: r.track_edge,
                session_elapsed: r.session_elapsed,
                timestamp_ms: r.timestamp_ms,
            });
        }
    }
    if let Some(l) = current.take() { laps.push(l); }
    tracing::debug!(path = %path.display(), laps = laps.len(), "imported csv");
    Ok(laps)
}

pub fn export_csv(laps: &[LapRecord], path: &Path) -> Result<()> {
    let mut w = csv::Writer::from_path(path)?;
    for l in laps {
        for p in &l.series.points {
            w.serialize(CsvRow {
                lap_id: Some(l.meta.id),
                session_id: l.meta.session_id,
                user_id: l.meta.user_id,
                lap_number: l.meta.lap_number,
                lap_time_s: l.meta.lap_time_s,
                valid: l.meta.valid,
                personal_best: l.meta.personal_best,
                sample_id: Some(p.id),
                index: p.index,
                x: p.x, y: p.y, z: p.z,
                speed: p.speed,
                throttle: p.throttle, brake: p.brake, steering: p.steering,
                gear: p.gear, rpm: p.rpm,
                lap_progress: p.lap_progress,
                track_edge: p.track_edge,
                session_elapsed: p.session_elapsed,
                timestamp_ms: p.timestamp_ms,
            })?;
        }
    }
    w.flush()?;
    Ok(())
}

pub fn import_ndjson(path: &Path) -> Result<Vec<LapRecord>> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let rdr = std::io::BufReader::new(f);
    let mut laps = vec![];
    for (n, line) in rdr.lines().enumerate() {
        let s = line?;
        if s.trim().is_empty() { continue; }
        let l: LapRecord = serde_json::from_str(&s)
            .with_context(|| format!("{}:{}", path.display(), n + 1))?;
        laps.push(l);
    }
    Ok(laps)
}

pub fn export_ndjson(laps: &[LapRecord], path: &Path) -> Result<()> {
    write_ndjson(laps, path)
}

/// Picks the reader from the file extension (`.csv`, otherwise NDJSON).
pub fn import_laps(path: &Path) -> Result<Vec<LapRecord>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(e) if e.eq_ignore_ascii_case("csv") => import_csv(path),
        _ => import_ndjson(path),
    }
}

/// One row per record, tagged with the lap the sample belongs to.
pub fn export_deltas_csv(deltas: &[(Uuid, DeltaRecord)], path: &Path) -> Result<()> {
    let mut w = csv::Writer::from_path(path)?;
    w.write_record(["lap_id", "sample_id", "delta_to_personal_best", "delta_to_session_best", "reference_lap_id"])?;
    for (lap_id, d) in deltas {
        w.write_record(&[
            lap_id.to_string(),
            d.sample_id.to_string(),
            format!("{:.4}", d.delta_to_personal_best),
            format!("{:.4}", d.delta_to_session_best),
            d.reference_lap_id.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

pub fn export_deltas_ndjson(deltas: &[DeltaRecord], path: &Path) -> Result<()> {
    write_ndjson(deltas, path)
}

pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    EngineConfig::from_json_str(&s).with_context(|| format!("parsing config {}", path.display()))
}

fn write_ndjson<T: Serialize>(items: &[T], path: &Path) -> Result<()> {
    let f = File::create(path)?;
    let mut w = std::io::BufWriter::new(f);
    for it in items {
        let s = serde_json::to_string(it)?;
        writeln!(w, "{}", s)?;
    }
    w.flush()?;
    Ok(())
}

fn new_lap(r: &CsvRow) -> LapRecord {
    let id = r.lap_id.unwrap_or_else(Uuid::new_v4);
    LapRecord {
        meta: LapMeta {
            id,
            user_id: r.user_id,
            session_id: r.session_id,
            lap_number: r.lap_number,
            lap_time_s: r.lap_time_s,
            valid: r.valid,
            personal_best: r.personal_best,
        },
        series: LapTelemetrySeries { lap_id: id, lap_time_s: r.lap_time_s, points: vec![] },
    }
}

#[derive(Serialize, Deserialize)]
struct CsvRow {
    #[serde(default)]
    lap_id: Option<Uuid>,
    session_id: Uuid, user_id: Uuid, lap_number: u32,
    lap_time_s: Option<f64>, valid: bool, personal_best: bool,
    #[serde(default)]
    sample_id: Option<Uuid>,
    index: u32,
    x: Option<f64>, y: Option<f64>, z: Option<f64>,
    speed: f64,
    throttle: Option<f64>, brake: Option<f64>, steering: Option<f64>,
    gear: Option<i8>, rpm: Option<f64>,
    lap_progress: f64,
    track_edge: Option<f64>,
    session_elapsed: f64,
    timestamp_ms: Option<i64>,
}
