//! Time deltas of a lap against its personal-best and session-best laps.

use model::{DeltaMap, DeltaRecord, LapTelemetrySeries};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DeltaError, Result};
use crate::interpolate::interpolate_at_progress;
use crate::store::LapStore;

/// Computes one [`DeltaRecord`] per sample of `target_lap`.
///
/// The personal-best reference is `reference_lap` when given, otherwise
/// the store's personal best for the lap's user and session. Without one
/// the lap fails with [`DeltaError::MissingReferenceLap`]. When no session
/// best resolves, the session-best delta repeats the personal-best delta.
///
/// Deltas are `target - reference` session-elapsed seconds at the same
/// lap progress, so positive means the target is slower there.
pub fn compute_lap_deltas<S: LapStore + ?Sized>(
    store: &S,
    target_lap: Uuid,
    reference_lap: Option<Uuid>,
) -> Result<DeltaMap> {
    let meta = store.lap_meta(target_lap)?.ok_or(DeltaError::LapNotFound(target_lap))?;
    let target = store
        .lap_series(target_lap)?
        .filter(|s| !s.points.is_empty())
        .ok_or(DeltaError::EmptyTelemetry(target_lap))?;
    if target.lap_time_s.or(meta.lap_time_s).is_none() {
        return Err(DeltaError::MissingLapTime(target_lap));
    }

    let pb_id = match reference_lap {
        Some(id) => Some(id),
        None => store.personal_best_lap(meta.user_id, meta.session_id)?,
    };
    let pb = match pb_id {
        Some(id) => load_reference(store, id)?,
        None => None,
    }
    .ok_or(DeltaError::MissingReferenceLap(target_lap))?;

    let sb = match store.session_best_lap(meta.session_id)? {
        Some(id) => load_reference(store, id)?,
        None => None,
    };
    if sb.is_none() {
        debug!(lap = %target_lap, "no session best, reusing personal-best deltas");
    }

    let mut out = DeltaMap::with_capacity(target.points.len());
    for s in &target.points {
        let Some(pb_delta) = delta_at(&pb, s.lap_progress, s.session_elapsed) else {
            continue;
        };
        let sb_delta = sb
            .as_ref()
            .and_then(|r| delta_at(r, s.lap_progress, s.session_elapsed))
            .unwrap_or(pb_delta);
        out.insert(
            s.id,
            DeltaRecord {
                sample_id: s.id,
                delta_to_personal_best: pb_delta,
                delta_to_session_best: sb_delta,
                reference_lap_id: pb.lap_id,
            },
        );
    }

    debug!(
        lap = %target_lap,
        personal_best = %pb.lap_id,
        session_best = ?sb.as_ref().map(|s| s.lap_id),
        records = out.len(),
        "computed lap deltas"
    );
    Ok(out)
}

/// A reference lap is usable only with telemetry to interpolate into.
fn load_reference<S: LapStore + ?Sized>(store: &S, lap_id: Uuid) -> Result<Option<LapTelemetrySeries>> {
    let series = store.lap_series(lap_id)?;
    match series {
        Some(s) if !s.points.is_empty() => Ok(Some(s)),
        _ => {
            warn!(lap = %lap_id, "reference lap has no telemetry");
            Ok(None)
        }
    }
}

fn delta_at(reference: &LapTelemetrySeries, progress: f64, elapsed: f64) -> Option<f64> {
    interpolate_at_progress(&reference.points, progress).map(|r| elapsed - r.session_elapsed)
}
