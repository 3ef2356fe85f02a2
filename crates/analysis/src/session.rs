//! Batch delta computation for every lap of a session.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::delta::compute_lap_deltas;
use crate::error::{DeltaError, Result};
use crate::store::LapStore;

#[derive(Debug, Default)]
pub struct SessionDeltaReport {
    pub session_id: Uuid,
    /// Lap id and number of records stored for it.
    pub computed: Vec<(Uuid, usize)>,
    pub failed: Vec<(Uuid, DeltaError)>,
}

impl SessionDeltaReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Computes and stores deltas for every lap in `session_id`.
///
/// Each lap runs as its own blocking task in a [`JoinSet`]; a lap that
/// fails (or whose task panics) is recorded in the report and the rest
/// carry on. Only a failure to list the session's laps fails the whole
/// call. Dropping the returned future aborts every lap that has not
/// started yet; laps already running finish.
pub async fn compute_session_deltas<S>(store: Arc<S>, session_id: Uuid) -> Result<SessionDeltaReport>
where
    S: LapStore + 'static,
{
    let laps = store.session_laps(session_id)?;
    info!(session = %session_id, laps = laps.len(), "computing session deltas");

    let rank: HashMap<Uuid, usize> = laps.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let mut tasks = JoinSet::new();
    let mut lap_of = HashMap::with_capacity(laps.len());
    for lap_id in laps {
        let store = Arc::clone(&store);
        let handle = tasks.spawn_blocking(move || -> Result<usize> {
            let records = compute_lap_deltas(&*store, lap_id, None)?;
            store.save_deltas(lap_id, &records)?;
            Ok(records.len())
        });
        lap_of.insert(handle.id(), lap_id);
    }

    let mut report = SessionDeltaReport { session_id, ..Default::default() };
    while let Some(joined) = tasks.join_next_with_id().await {
        let (lap_id, outcome) = match joined {
            Ok((id, r)) => (lap_of[&id], r),
            Err(e) => (lap_of[&e.id()], Err(DeltaError::Join(e.to_string()))),
        };
        match outcome {
            Ok(n) => report.computed.push((lap_id, n)),
            Err(e) => {
                warn!(session = %session_id, lap = %lap_id, error = %e, "lap delta failed");
                report.failed.push((lap_id, e));
            }
        }
    }
    // completion order varies; report in lap order
    report.computed.sort_by_key(|(id, _)| rank[id]);
    report.failed.sort_by_key(|(id, _)| rank[id]);

    info!(
        session = %session_id,
        computed = report.computed.len(),
        failed = report.failed.len(),
        "session deltas done"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::delta::tests::{meta, samples, TestStore};

    #[tokio::test]
    async fn failures_stay_scoped_to_their_lap() {
        let (driver, newcomer, session) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut store = TestStore::default();
        let best = meta(driver, session, 1, Some(80.0), true);
        let next = meta(driver, session, 2, Some(81.5), false);
        let orphan = meta(newcomer, session, 1, Some(90.0), false);
        let (best_id, next_id, orphan_id) = (best.id, next.id, orphan.id);
        store.add(best, samples(0.0, 80.0));
        store.add(next, samples(0.0, 81.5));
        store.add(orphan, samples(0.0, 90.0));
        let store = Arc::new(store);

        let report = compute_session_deltas(Arc::clone(&store), session).await.unwrap();

        assert_eq!(report.computed.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert!(!report.is_complete());
        assert_eq!(report.failed[0].0, orphan_id);
        assert!(report.failed[0].1.is_missing_reference());

        let saved = store.saved.lock();
        assert_eq!(saved[&next_id].len(), 21);
        assert_eq!(saved[&best_id].len(), 21);
        assert!(!saved.contains_key(&orphan_id));
    }

    #[tokio::test]
    async fn storage_failures_are_reported_per_lap() {
        let (user, session) = (Uuid::new_v4(), Uuid::new_v4());
        let mut store = TestStore { fail_saves: true, ..Default::default() };
        store.add(meta(user, session, 1, Some(80.0), true), samples(0.0, 80.0));
        store.add(meta(user, session, 2, Some(80.5), false), samples(0.0, 80.5));

        let report = compute_session_deltas(Arc::new(store), session).await.unwrap();
        assert!(report.computed.is_empty());
        assert_eq!(report.failed.len(), 2);
        assert!(report.failed.iter().all(|(_, e)| matches!(e, DeltaError::Storage(_))));
    }

    #[tokio::test]
    async fn empty_session_is_an_empty_report() {
        let report = compute_session_deltas(Arc::new(TestStore::default()), Uuid::new_v4())
            .await
            .unwrap();
        assert!(report.computed.is_empty() && report.is_complete());
    }

    /// Counts saves and holds each one long enough for a caller to give up.
    struct SlowSaves {
        inner: TestStore,
        saves: AtomicUsize,
    }

    impl LapStore for SlowSaves {
        fn lap_meta(&self, lap_id: Uuid) -> anyhow::Result<Option<model::LapMeta>> {
            self.inner.lap_meta(lap_id)
        }

        fn lap_series(&self, lap_id: Uuid) -> anyhow::Result<Option<model::LapTelemetrySeries>> {
            self.inner.lap_series(lap_id)
        }

        fn personal_best_lap(&self, user_id: Uuid, session_id: Uuid) -> anyhow::Result<Option<Uuid>> {
            self.inner.personal_best_lap(user_id, session_id)
        }

        fn session_best_lap(&self, session_id: Uuid) -> anyhow::Result<Option<Uuid>> {
            self.inner.session_best_lap(session_id)
        }

        fn session_laps(&self, session_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
            self.inner.session_laps(session_id)
        }

        fn save_deltas(&self, lap_id: Uuid, records: &model::DeltaMap) -> anyhow::Result<()> {
            std::thread::sleep(Duration::from_millis(200));
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save_deltas(lap_id, records)
        }
    }

    #[test]
    fn dropping_the_batch_stops_unstarted_laps() {
        let (user, session) = (Uuid::new_v4(), Uuid::new_v4());
        let mut inner = TestStore::default();
        inner.add(meta(user, session, 1, Some(80.0), true), samples(0.0, 80.0));
        for n in 2..=6 {
            inner.add(meta(user, session, n, Some(81.0), false), samples(0.0, 81.0));
        }
        let store = Arc::new(SlowSaves { inner, saves: AtomicUsize::new(0) });

        // one blocking worker, so laps queue behind each other
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(1)
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let batch = compute_session_deltas(Arc::clone(&store), session);
            assert!(tokio::time::timeout(Duration::from_millis(300), batch).await.is_err());
            tokio::time::sleep(Duration::from_millis(1500)).await;
        });

        let saves = store.saves.load(Ordering::SeqCst);
        assert!(saves <= 2, "{saves} laps saved after the batch was dropped");
        assert!(saves >= 1);
    }

    #[tokio::test]
    async fn report_lists_laps_in_session_order() {
        let (user, session) = (Uuid::new_v4(), Uuid::new_v4());
        let mut store = TestStore::default();
        let mut ids = Vec::new();
        for n in 1..=5 {
            let m = meta(user, session, n, Some(80.0 + n as f64), n == 1);
            ids.push(m.id);
            store.add(m, samples(0.0, 80.0 + n as f64));
        }

        let report = compute_session_deltas(Arc::new(store), session).await.unwrap();
        let got: Vec<Uuid> = report.computed.iter().map(|(id, _)| *id).collect();
        assert_eq!(got, ids);
    }
}
