//! Telemetry geometry and lap delta engine.
//!
//! Turns per-lap telemetry into map geometry (racing line and boundary
//! rails) and into per-sample time deltas against reference laps. All
//! computation is synchronous and pure; storage and scheduling belong to
//! the caller, except for [`session::compute_session_deltas`] which fans a
//! session out over blocking tasks.

pub mod config;
pub mod delta;
pub mod error;
pub mod geometry;
pub mod interpolate;
pub mod racing_line;
pub mod session;
pub mod store;

pub use config::{EngineConfig, RailConfig, RenderConfig};
pub use delta::compute_lap_deltas;
pub use error::{DeltaError, Result};
pub use interpolate::interpolate_at_progress;
pub use racing_line::{build_boundary_rails, build_racing_line, build_track_map, RacingLineBuilder};
pub use session::{compute_session_deltas, SessionDeltaReport};
pub use store::LapStore;
