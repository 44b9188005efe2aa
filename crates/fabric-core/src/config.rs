//! Tunable parameters for the fabric and memory layers.
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! [fabric]
//! max_units = 20000
//! power_budget_watts = 5.0
//!
//! [memory]
//! consolidation_threshold = 2
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{FabricError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FabricConfig {
    pub max_units: usize,
    pub power_budget_watts: f64,
    pub unit_threshold: f64,
    /// Geometric decay applied to a unit's potential on every step it does not fire.
    pub unit_decay: f64,
    pub default_link_weight: f64,
    pub learning_rate: f64,
    /// Weight of the newest sample in the rolling power average, in (0, 1].
    pub power_smoothing: f64,
    pub min_power_interval_secs: f64,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            max_units: DEFAULT_MAX_UNITS,
            power_budget_watts: DEFAULT_POWER_BUDGET_WATTS,
            unit_threshold: DEFAULT_THRESHOLD,
            unit_decay: DEFAULT_DECAY,
            default_link_weight: DEFAULT_LINK_WEIGHT,
            learning_rate: DEFAULT_LEARNING_RATE,
            power_smoothing: DEFAULT_POWER_SMOOTHING,
            min_power_interval_secs: DEFAULT_MIN_POWER_INTERVAL_SECS,
        }
    }
}

impl FabricConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.unit_decay > 0.0 && self.unit_decay <= 1.0) {
            return Err(invalid(format!("unit_decay {} not in (0, 1]", self.unit_decay)));
        }
        if !(self.unit_threshold > 0.0 && self.unit_threshold.is_finite()) {
            return Err(invalid(format!(
                "unit_threshold {} must be positive and finite",
                self.unit_threshold
            )));
        }
        check_unit_interval("default_link_weight", self.default_link_weight)?;
        check_unit_interval("learning_rate", self.learning_rate)?;
        if !(self.power_smoothing > 0.0 && self.power_smoothing <= 1.0) {
            return Err(invalid(format!(
                "power_smoothing {} not in (0, 1]",
                self.power_smoothing
            )));
        }
        // Infinity is a usable budget (never exceeded); NaN is not.
        if self.power_budget_watts.is_nan() || self.power_budget_watts < 0.0 {
            return Err(invalid(format!(
                "power_budget_watts {} must be non-negative",
                self.power_budget_watts
            )));
        }
        check_non_negative("min_power_interval_secs", self.min_power_interval_secs)?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub short_term_capacity: usize,
    pub min_pattern_size: usize,
    /// Occurrences in the short-term buffer needed for a pattern to be salient.
    pub consolidation_threshold: usize,
    pub consolidation_weight: f64,
    pub strong_link_threshold: f64,
    pub recall_strength: f64,
    pub dream_strength: f64,
    pub prune_threshold: f64,
    pub prune_decay: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            short_term_capacity: DEFAULT_SHORT_TERM_CAPACITY,
            min_pattern_size: DEFAULT_MIN_PATTERN_SIZE,
            consolidation_threshold: DEFAULT_CONSOLIDATION_THRESHOLD,
            consolidation_weight: DEFAULT_CONSOLIDATION_WEIGHT,
            strong_link_threshold: DEFAULT_STRONG_LINK_THRESHOLD,
            recall_strength: DEFAULT_RECALL_STRENGTH,
            dream_strength: DEFAULT_DREAM_STRENGTH,
            prune_threshold: DEFAULT_PRUNE_THRESHOLD,
            prune_decay: DEFAULT_PRUNE_DECAY,
        }
    }
}

impl MemoryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.short_term_capacity == 0 {
            return Err(invalid("short_term_capacity must be at least 1".into()));
        }
        if self.min_pattern_size < 2 {
            return Err(invalid(format!(
                "min_pattern_size {} must be at least 2",
                self.min_pattern_size
            )));
        }
        if self.consolidation_threshold == 0 {
            return Err(invalid("consolidation_threshold must be at least 1".into()));
        }
        check_unit_interval("consolidation_weight", self.consolidation_weight)?;
        check_unit_interval("strong_link_threshold", self.strong_link_threshold)?;
        check_unit_interval("prune_threshold", self.prune_threshold)?;
        check_unit_interval("prune_decay", self.prune_decay)?;
        check_non_negative("recall_strength", self.recall_strength)?;
        check_non_negative("dream_strength", self.dream_strength)?;
        Ok(())
    }
}

/// Combined configuration as read from a TOML file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fabric: FabricConfig,
    pub memory: MemoryConfig,
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        self.fabric.validate()?;
        self.memory.validate()
    }
}

fn invalid(msg: String) -> FabricError {
    FabricError::InvalidConfig(msg)
}

fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{name} {value} not in [0, 1]")))
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{name} {value} must be finite and non-negative")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
        assert_eq!(Config::default().memory.consolidation_threshold, 3);
        assert_eq!(Config::default().fabric.unit_decay, 0.9);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [fabric]
            max_units = 500
            power_budget_watts = 1.5

            [memory]
            consolidation_threshold = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.fabric.max_units, 500);
        assert_eq!(config.fabric.power_budget_watts, 1.5);
        assert_eq!(config.fabric.learning_rate, DEFAULT_LEARNING_RATE);
        assert_eq!(config.memory.consolidation_threshold, 2);
        assert_eq!(config.memory.short_term_capacity, DEFAULT_SHORT_TERM_CAPACITY);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_rejects_bad_decay() {
        let err = Config::from_toml_str("[fabric]\nunit_decay = 1.5\n").unwrap_err();
        assert!(matches!(err, FabricError::InvalidConfig(_)), "got {err}");
    }

    #[test]
    fn test_rejects_nan_from_toml() {
        for content in [
            "[fabric]\nunit_threshold = nan\n",
            "[fabric]\npower_budget_watts = nan\n",
            "[fabric]\nmin_power_interval_secs = nan\n",
            "[memory]\nrecall_strength = nan\n",
        ] {
            let err = Config::from_toml_str(content).unwrap_err();
            assert!(matches!(err, FabricError::InvalidConfig(_)), "{content:?} gave {err}");
        }
    }

    #[test]
    fn test_rejects_nan_fields() {
        let config = FabricConfig {
            power_budget_watts: f64::NAN,
            ..FabricConfig::default()
        };
        assert!(config.validate().is_err());
        let config = FabricConfig {
            unit_threshold: f64::INFINITY,
            ..FabricConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unbounded_budget_is_valid() {
        let config = FabricConfig {
            power_budget_watts: f64::INFINITY,
            ..FabricConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_single_unit_patterns() {
        for size in [0, 1] {
            let config = MemoryConfig {
                min_pattern_size: size,
                ..MemoryConfig::default()
            };
            assert!(matches!(config.validate(), Err(FabricError::InvalidConfig(_))));
        }
        let config = MemoryConfig {
            min_pattern_size: 3,
            ..MemoryConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = Config::from_toml_str("[fabric\nmax_units = ").unwrap_err();
        assert!(matches!(err, FabricError::ConfigParse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/fabric.toml")).unwrap_err();
        assert!(matches!(err, FabricError::ConfigIo(_)));
    }
}
