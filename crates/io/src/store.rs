use std::collections::HashMap;

use analysis::LapStore;
use model::{DeltaMap, DeltaRecord, LapMeta, LapTelemetrySeries};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::LapRecord;

/// In-memory lap store. Laps are kept sorted by progress on insert so
/// the engine's ordering requirement holds for anything loaded here.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    laps: HashMap<Uuid, LapRecord>,
    deltas: HashMap<Uuid, DeltaMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = LapRecord>) -> Self {
        let s = Self::new();
        for r in records {
            s.insert(r);
        }
        s
    }

    pub fn insert(&self, mut rec: LapRecord) {
        rec.series
            .points
            .sort_by(|a, b| a.lap_progress.total_cmp(&b.lap_progress));
        let mut inner = self.inner.write();
        // new telemetry invalidates stored deltas
        inner.deltas.remove(&rec.meta.id);
        inner.laps.insert(rec.meta.id, rec);
    }

    pub fn lap(&self, lap_id: Uuid) -> Option<LapRecord> {
        self.inner.read().laps.get(&lap_id).cloned()
    }

    /// Distinct sessions, ordered for stable output.
    pub fn sessions(&self) -> Vec<Uuid> {
        let inner = self.inner.read();
        let mut v: Vec<Uuid> = inner.laps.values().map(|l| l.meta.session_id).collect();
        v.sort_unstable();
        v.dedup();
        v
    }

    pub fn deltas(&self, lap_id: Uuid) -> Option<DeltaMap> {
        self.inner.read().deltas.get(&lap_id).cloned()
    }

    /// Every stored record with its lap id, ordered by lap then sample index.
    pub fn all_deltas(&self) -> Vec<(Uuid, DeltaRecord)> {
        let inner = self.inner.read();
        let mut out = Vec::new();
        let mut laps: Vec<&LapRecord> = inner.laps.values().collect();
        laps.sort_by_key(|l| (l.meta.session_id, l.meta.lap_number, l.meta.user_id));
        for l in laps {
            let Some(map) = inner.deltas.get(&l.meta.id) else { continue };
            for p in &l.series.points {
                if let Some(d) = map.get(&p.id) {
                    out.push((l.meta.id, d.clone()));
                }
            }
        }
        out
    }

    fn valid_in(inner: &Inner, session_id: Uuid) -> impl Iterator<Item = &LapMeta> {
        inner
            .laps
            .values()
            .map(|l| &l.meta)
            .filter(move |m| m.session_id == session_id && m.valid)
    }
}

impl LapStore for MemoryStore {
    fn lap_meta(&self, lap_id: Uuid) -> anyhow::Result<Option<LapMeta>> {
        Ok(self.inner.read().laps.get(&lap_id).map(|l| l.meta.clone()))
    }

    fn lap_series(&self, lap_id: Uuid) -> anyhow::Result<Option<LapTelemetrySeries>> {
        Ok(self.inner.read().laps.get(&lap_id).map(|l| l.series.clone()))
    }

    fn personal_best_lap(&self, user_id: Uuid, session_id: Uuid) -> anyhow::Result<Option<Uuid>> {
        let inner = self.inner.read();
        let best = Self::valid_in(&inner, session_id)
            .filter(|m| m.user_id == user_id && m.personal_best)
            .max_by_key(|m| m.lap_number)
            .map(|m| m.id);
        Ok(best)
    }

    fn session_best_lap(&self, session_id: Uuid) -> anyhow::Result<Option<Uuid>> {
        let inner = self.inner.read();
        let best = Self::valid_in(&inner, session_id)
            .filter_map(|m| m.lap_time_s.map(|t| (t, m.lap_number, m.id)))
            // equal times go to the earlier lap, then the lower id
            .min_by(|a, b| a.0.total_cmp(&b.0).then((a.1, a.2).cmp(&(b.1, b.2))))
            .map(|(_, _, id)| id);
        Ok(best)
    }

    fn session_laps(&self, session_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
        let inner = self.inner.read();
        let mut v: Vec<&LapMeta> = inner
            .laps
            .values()
            .map(|l| &l.meta)
            .filter(|m| m.session_id == session_id)
            .collect();
        v.sort_by_key(|m| (m.lap_number, m.user_id));
        Ok(v.into_iter().map(|m| m.id).collect())
    }

    fn save_deltas(&self, lap_id: Uuid, records: &DeltaMap) -> anyhow::Result<()> {
        let mut inner = self.inner.write();
        if !inner.laps.contains_key(&lap_id) {
            anyhow::bail!("cannot store deltas for unknown lap {lap_id}");
        }
        inner.deltas.insert(lap_id, records.clone());
        Ok(())
    }
}
