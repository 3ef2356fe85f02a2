use thiserror::Error;
use uuid::Uuid;

/// Failures of a single lap's delta computation.
///
/// Geometry never fails; it degrades to smaller output instead.
#[derive(Debug, Error)]
pub enum DeltaError {
    #[error("lap {0} not found")]
    LapNotFound(Uuid),
    #[error("lap {0} has no telemetry")]
    EmptyTelemetry(Uuid),
    #[error("lap {0} has no recorded lap time")]
    MissingLapTime(Uuid),
    #[error("no personal-best reference lap resolves for lap {0}")]
    MissingReferenceLap(Uuid),
    #[error("lap task failed: {0}")]
    Join(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl DeltaError {
    /// True when the lap had no personal-best lap to compare against.
    pub fn is_missing_reference(&self) -> bool {
        matches!(self, Self::MissingReferenceLap(_))
    }
}

pub type Result<T> = std::result::Result<T, DeltaError>;
