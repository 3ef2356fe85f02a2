use model::{DeltaMap, LapMeta, LapTelemetrySeries};
use uuid::Uuid;

/// Storage collaborator the delta engine reads laps from and hands
/// results to. Implementations own all I/O; the engine never caches.
pub trait LapStore: Send + Sync {
    fn lap_meta(&self, lap_id: Uuid) -> anyhow::Result<Option<LapMeta>>;

    /// Samples sorted by ascending `lap_progress`.
    fn lap_series(&self, lap_id: Uuid) -> anyhow::Result<Option<LapTelemetrySeries>>;

    /// Most recent valid lap flagged personal best for this user and session.
    fn personal_best_lap(&self, user_id: Uuid, session_id: Uuid) -> anyhow::Result<Option<Uuid>>;

    /// Valid lap with the lowest lap time in the session, any user.
    fn session_best_lap(&self, session_id: Uuid) -> anyhow::Result<Option<Uuid>>;

    fn session_laps(&self, session_id: Uuid) -> anyhow::Result<Vec<Uuid>>;

    /// Replaces whatever was stored for `lap_id` with `records`.
    fn save_deltas(&self, lap_id: Uuid, records: &DeltaMap) -> anyhow::Result<()>;
}
