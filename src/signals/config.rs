//! Rule tunables: active subset, thresholds and weights.
//!
//! Loaded from an optional JSON file; every field falls back to a default
//! so a file only needs to list what it changes.

use std::collections::HashMap;
use std::fmt::Write;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::RuleId;

/// Numeric thresholds for every rule in the set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub short_term_pump_pct: Decimal,
    pub daily_pump_pct: Decimal,
    pub weekly_pump_pct: Decimal,
    /// Negative percentage; fires strictly below.
    pub daily_dump_pct: Decimal,
    pub high_volume: Decimal,
    /// `market_cap / volume_cap_divisor` approximates expected daily volume.
    pub volume_cap_divisor: Decimal,
    pub volume_cap_multiplier: Decimal,
    pub volume_cap_ratio: Decimal,
    pub market_cap_surge_pct: Decimal,
    pub near_ath_fraction: Decimal,
    pub rsi_window: usize,
    pub rsi_oversold: Decimal,
    pub rsi_overbought: Decimal,
    pub large_cap: Decimal,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            short_term_pump_pct: Decimal::TWO,
            daily_pump_pct: Decimal::TEN,
            weekly_pump_pct: Decimal::from(20),
            daily_dump_pct: Decimal::from(-10),
            high_volume: Decimal::from(50_000_000u64),
            volume_cap_divisor: Decimal::ONE_HUNDRED,
            volume_cap_multiplier: Decimal::from(3),
            volume_cap_ratio: Decimal::new(5, 2),
            market_cap_surge_pct: Decimal::TEN,
            near_ath_fraction: Decimal::new(95, 2),
            rsi_window: 14,
            rsi_oversold: Decimal::from(30),
            rsi_overbought: Decimal::from(70),
            large_cap: Decimal::from(10_000_000_000u64),
        }
    }
}

/// Which rules run, with what thresholds, and how much each signal weighs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Rules evaluated each cycle. List order is evaluation order, so it
    /// also sets the order of signal names in alerts; repeats are ignored.
    pub active: Vec<RuleId>,
    pub thresholds: Thresholds,
    /// Per-rule weight for the weighted-score policy. Missing rules weigh 1.
    pub weights: HashMap<RuleId, u32>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            active: vec![RuleId::ShortTermPump, RuleId::DailyPump, RuleId::HighVolume],
            thresholds: Thresholds::default(),
            weights: HashMap::new(),
        }
    }
}

impl RulesConfig {
    /// Loads rule configuration from a JSON file and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails
    /// [`validate`](Self::validate).
    pub fn load(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::CoinwatchError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects combinations that would make rule semantics ambiguous.
    ///
    /// # Errors
    ///
    /// Returns [`CoinwatchError::Config`](crate::CoinwatchError::Config) if
    /// both volume-to-cap formulations are active, the RSI window is zero,
    /// or the volume divisor is not positive.
    pub fn validate(&self) -> crate::Result<()> {
        if self.active.contains(&RuleId::VolumeCapSpike)
            && self.active.contains(&RuleId::VolumeCapRatio)
        {
            return Err(crate::CoinwatchError::Config(
                "volume_cap_spike and volume_cap_ratio cannot both be active".to_string(),
            ));
        }
        if self.thresholds.rsi_window == 0 {
            return Err(crate::CoinwatchError::Config(
                "rsi_window must be at least 1".to_string(),
            ));
        }
        if self.thresholds.volume_cap_divisor <= Decimal::ZERO {
            return Err(crate::CoinwatchError::Config(
                "volume_cap_divisor must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Weight carried by a signal from `rule`.
    pub fn weight_of(&self, rule: RuleId) -> u32 {
        self.weights.get(&rule).copied().unwrap_or(1)
    }

    /// Human-readable summary of the active rules, logged at startup.
    pub fn describe(&self) -> String {
        let mut out = String::from("Active rules:");
        for rule in &self.active {
            let _ = write!(out, " {}(w={})", rule.as_str(), self.weight_of(*rule));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_json() -> &'static str {
        r#"{
            "active": ["weekly_pump", "volume_cap_ratio", "large_cap"],
            "thresholds": {
                "weekly_pump_pct": "25",
                "volume_cap_ratio": "0.1"
            },
            "weights": {
                "large_cap": 3
            }
        }"#
    }

    #[test]
    fn defaults_match_original_rule_set() {
        let config = RulesConfig::default();
        assert_eq!(
            config.active,
            vec![RuleId::ShortTermPump, RuleId::DailyPump, RuleId::HighVolume]
        );
        assert_eq!(config.thresholds.high_volume, dec!(50000000));
        assert_eq!(config.thresholds.volume_cap_ratio, dec!(0.05));
        assert_eq!(config.thresholds.near_ath_fraction, dec!(0.95));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_thresholds_inherit_defaults() {
        let config: RulesConfig = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(config.thresholds.weekly_pump_pct, dec!(25));
        assert_eq!(config.thresholds.volume_cap_ratio, dec!(0.1));
        assert_eq!(config.thresholds.daily_pump_pct, dec!(10));
        assert_eq!(config.thresholds.rsi_window, 14);
    }

    #[test]
    fn weights_default_to_one() {
        let config: RulesConfig = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(config.weight_of(RuleId::LargeCap), 3);
        assert_eq!(config.weight_of(RuleId::WeeklyPump), 1);
    }

    #[test]
    fn empty_object_is_default() {
        let config: RulesConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RulesConfig::default());
    }

    #[test]
    fn unknown_rule_id_rejected() {
        let result = serde_json::from_str::<RulesConfig>(r#"{"active": ["moon_shot"]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn both_volume_formulas_rejected() {
        let config = RulesConfig {
            active: vec![RuleId::VolumeCapSpike, RuleId::VolumeCapRatio],
            ..RulesConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cannot both be active"));
    }

    #[test]
    fn zero_divisor_rejected() {
        let mut config = RulesConfig::default();
        config.thresholds.volume_cap_divisor = Decimal::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, sample_json()).unwrap();

        let config = RulesConfig::load(&path).unwrap();
        assert_eq!(config.active.len(), 3);
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let err = RulesConfig::load(Path::new("/nonexistent/rules.json")).unwrap_err();
        assert!(matches!(err, crate::CoinwatchError::Config(_)));
    }

    #[test]
    fn describe_lists_weights() {
        let config: RulesConfig = serde_json::from_str(sample_json()).unwrap();
        let desc = config.describe();
        assert!(desc.contains("large_cap(w=3)"));
        assert!(desc.contains("weekly_pump(w=1)"));
    }
}
