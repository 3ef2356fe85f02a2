//! Tuning knobs for the map and rail pipeline.
//!
//! Every field has a default equal to the constant the pipeline was tuned
//! with, so an empty JSON object deserializes into a working config.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub rails: RailConfig,
    pub render: RenderConfig,
}

impl EngineConfig {
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RailConfig {
    /// Douglas-Peucker tolerance in world units.
    pub simplify_tolerance: f64,
    pub straight_window: usize,
    /// Minimum |r| between x and y for a window to count as straight.
    pub straight_threshold: f64,
    pub straight_min_points: usize,
    /// Smoothing passes applied before densification, in order.
    pub smooth_passes: Vec<usize>,
    pub final_smooth_window: usize,
    /// Tangent look-ahead is `min(lookahead_max, n / lookahead_divisor)`.
    pub lookahead_max: usize,
    pub lookahead_divisor: usize,
    /// Multiplier on the median half-width.
    pub width_margin: f64,
}

impl Default for RailConfig {
    fn default() -> Self {
        Self {
            simplify_tolerance: 1.0,
            straight_window: 15,
            straight_threshold: 0.95,
            straight_min_points: 5,
            smooth_passes: vec![25, 15],
            final_smooth_window: 9,
            lookahead_max: 8,
            lookahead_divisor: 15,
            width_margin: 1.05,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub racing_line_color: String,
    pub rail_color: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            racing_line_color: "#e10600".into(),
            rail_color: "#ffffff".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let cfg = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.rails.smooth_passes, vec![25, 15]);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let cfg = EngineConfig::from_json_str(
            r##"{"rails":{"width_margin":1.1},"render":{"rail_color":"#888888"}}"##,
        )
        .unwrap();
        assert_eq!(cfg.rails.width_margin, 1.1);
        assert_eq!(cfg.rails.straight_window, 15);
        assert_eq!(cfg.render.rail_color, "#888888");
        assert_eq!(cfg.render.racing_line_color, "#e10600");
    }
}
