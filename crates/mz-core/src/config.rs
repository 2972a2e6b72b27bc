//! Shuffle configuration
//!
//! [`Tuning`] carries the per-strategy knobs, [`ShuffleConfig`] the bounds
//! shared by every shuffle run. Both deserialize with defaults for any
//! missing field.

#[cfg(not(feature = "std"))]
use crate::compat::*;

use serde::{Deserialize, Serialize};

use crate::error::ShuffleError;
use crate::maze::Tag;

/// Strategy-level tuning knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Number of components the final layout must traverse into.
    pub max_partitions: usize,
    pub min_spikes: usize,
    pub max_spikes: usize,
    /// Accept a refine pass that stalls above the target size.
    pub loose_refine: bool,
    /// Try swapping in block variants while refining the layout.
    pub add_blocks: bool,
    /// Tag used to flood the map before refining.
    pub initial_fill: Tag,
    /// Tag placed on top border exits.
    pub up_edge: Tag,
    /// Require a through screen in both axes to land a pit on.
    pub require_pit_destination: bool,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_partitions: 1,
            min_spikes: 2,
            max_spikes: 5,
            loose_refine: false,
            add_blocks: true,
            initial_fill: Tag::Cave,
            up_edge: Tag::Cave,
            require_pit_destination: false,
        }
    }
}

/// Bounds for the orchestrator and the shared pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShuffleConfig {
    /// Overrides the strategy's own attempt budget.
    pub max_attempts: Option<usize>,
    pub max_height: usize,
    pub max_width: usize,
    /// Passes over the filled cells before refine gives up.
    pub refine_passes: usize,
    /// Consecutive failed spike placements tolerated.
    pub spike_attempts: usize,
    pub removals_per_pass: usize,
    /// Consecutive failed early-terrain growths tolerated.
    pub early_path_attempts: usize,
}

impl Default for ShuffleConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            max_height: 16,
            max_width: 8,
            refine_passes: 50,
            spike_attempts: 20,
            removals_per_pass: 4,
            early_path_attempts: 20,
        }
    }
}

/// Tallest map a [`Pos`](crate::maze::Pos) row can address.
pub const MAX_HEIGHT: usize = 16;
/// Widest map whose right border still fits a grid coordinate's column.
pub const MAX_WIDTH: usize = 15;

impl ShuffleConfig {
    /// Parse a config from JSON, filling unspecified fields with defaults.
    #[cfg(feature = "std")]
    pub fn from_json(json: &str) -> Result<Self, ShuffleError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ShuffleError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject dimension bounds the grid cannot represent.
    pub fn validate(&self) -> Result<(), ShuffleError> {
        if !(1..=MAX_HEIGHT).contains(&self.max_height) {
            return Err(ShuffleError::Config(format!(
                "max_height {} outside 1..={MAX_HEIGHT}",
                self.max_height
            )));
        }
        if !(1..=MAX_WIDTH).contains(&self.max_width) {
            return Err(ShuffleError::Config(format!(
                "max_width {} outside 1..={MAX_WIDTH}",
                self.max_width
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuning_defaults() {
        let t = Tuning::default();
        assert_eq!(t.max_partitions, 1);
        assert_eq!(t.initial_fill, Tag::Cave);
        assert!(t.add_blocks);
        assert!(!t.loose_refine);
    }

    #[test]
    fn test_config_partial_json() {
        let cfg = ShuffleConfig::from_json(r#"{"max_attempts": 10, "refine_passes": 5}"#).unwrap();
        assert_eq!(cfg.max_attempts, Some(10));
        assert_eq!(cfg.refine_passes, 5);
        assert_eq!(cfg.max_width, 8);
    }

    #[test]
    fn test_config_rejects_oversize_bounds() {
        assert!(ShuffleConfig::default().validate().is_ok());
        let wide = ShuffleConfig {
            max_width: MAX_WIDTH + 1,
            ..ShuffleConfig::default()
        };
        assert!(matches!(wide.validate(), Err(ShuffleError::Config(m)) if m.contains("max_width 16")));
        let tall = ShuffleConfig {
            max_height: MAX_HEIGHT + 1,
            ..ShuffleConfig::default()
        };
        assert!(matches!(tall.validate(), Err(ShuffleError::Config(m)) if m.contains("max_height 17")));
        let flat = ShuffleConfig {
            max_height: 0,
            ..ShuffleConfig::default()
        };
        assert!(flat.validate().is_err());
        let err = ShuffleConfig::from_json(r#"{"max_width": 40}"#).unwrap_err();
        assert!(err.to_string().contains("max_width 40"));
    }

    #[test]
    fn test_config_bad_json() {
        let err = ShuffleConfig::from_json("{ nope").unwrap_err();
        assert!(err.to_string().contains("invalid shuffle configuration"));
    }

    #[test]
    fn test_tuning_roundtrip() {
        let t = Tuning {
            initial_fill: Tag::Wide,
            up_edge: Tag::Narrow,
            ..Tuning::default()
        };
        let json = serde_json::to_string(&t).unwrap();
        let back: Tuning = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
