//! Signal rule set.
//!
//! Each rule is a pure predicate over one [`AssetSnapshot`] (plus a
//! per-batch [`BatchContext`] for cross-asset rules). A missing field means
//! the rule does not fire; nothing here fails or reads global state.

pub mod config;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::indicators::rolling_rsi;
use crate::models::{AssetSnapshot, MarketBatch};
use config::{RulesConfig, Thresholds};

/// Identifier of a single rule, as written in rules files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    ShortTermPump,
    DailyPump,
    WeeklyPump,
    DailyDump,
    HighVolume,
    /// `total_volume > multiplier × (market_cap / divisor)`.
    VolumeCapSpike,
    /// `total_volume > ratio × market_cap`.
    VolumeCapRatio,
    MarketCapSurge,
    NearAllTimeHigh,
    /// RSI over the batch's cross-sectional prices, not a per-asset history.
    RsiExtreme,
    /// Weighted scoring only; never counted by the count policy.
    LargeCap,
}

impl RuleId {
    /// Every rule, in declaration order.
    pub const ALL: [RuleId; 11] = [
        RuleId::ShortTermPump,
        RuleId::DailyPump,
        RuleId::WeeklyPump,
        RuleId::DailyDump,
        RuleId::HighVolume,
        RuleId::VolumeCapSpike,
        RuleId::VolumeCapRatio,
        RuleId::MarketCapSurge,
        RuleId::NearAllTimeHigh,
        RuleId::RsiExtreme,
        RuleId::LargeCap,
    ];

    /// Config-file name of the rule.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::ShortTermPump => "short_term_pump",
            RuleId::DailyPump => "daily_pump",
            RuleId::WeeklyPump => "weekly_pump",
            RuleId::DailyDump => "daily_dump",
            RuleId::HighVolume => "high_volume",
            RuleId::VolumeCapSpike => "volume_cap_spike",
            RuleId::VolumeCapRatio => "volume_cap_ratio",
            RuleId::MarketCapSurge => "market_cap_surge",
            RuleId::NearAllTimeHigh => "near_all_time_high",
            RuleId::RsiExtreme => "rsi_extreme",
            RuleId::LargeCap => "large_cap",
        }
    }

    /// Signal name shown in alerts.
    pub fn label(&self) -> &'static str {
        match self {
            RuleId::ShortTermPump => "Short-term pump",
            RuleId::DailyPump => "Daily pump",
            RuleId::WeeklyPump => "Weekly pump",
            RuleId::DailyDump => "Daily dump",
            RuleId::HighVolume => "High absolute volume",
            RuleId::VolumeCapSpike => "Volume-to-cap spike",
            RuleId::VolumeCapRatio => "Volume-to-cap ratio",
            RuleId::MarketCapSurge => "Market-cap surge",
            RuleId::NearAllTimeHigh => "Near all-time high",
            RuleId::RsiExtreme => "Batch RSI extreme",
            RuleId::LargeCap => "Large-cap flag",
        }
    }

    /// Whether a signal from this rule counts toward `min_signals`.
    pub fn counts_toward_count(&self) -> bool {
        !matches!(self, RuleId::LargeCap)
    }

    /// Whether the signal describes downward movement.
    pub fn is_bearish(&self) -> bool {
        matches!(self, RuleId::DailyDump)
    }

    fn fires(&self, asset: &AssetSnapshot, ctx: &BatchContext, t: &Thresholds) -> bool {
        match self {
            RuleId::ShortTermPump => above(asset.price_change_pct_1h, t.short_term_pump_pct),
            RuleId::DailyPump => above(asset.price_change_pct_24h, t.daily_pump_pct),
            RuleId::WeeklyPump => above(asset.price_change_pct_7d, t.weekly_pump_pct),
            RuleId::DailyDump => {
                matches!(asset.price_change_pct_24h, Some(v) if v < t.daily_dump_pct)
            }
            RuleId::HighVolume => above(asset.total_volume, t.high_volume),
            RuleId::VolumeCapSpike => match (asset.market_cap, asset.total_volume) {
                (Some(cap), Some(volume)) if cap > Decimal::ZERO => cap
                    .checked_div(t.volume_cap_divisor)
                    .and_then(|expected| expected.checked_mul(t.volume_cap_multiplier))
                    .is_some_and(|limit| volume > limit),
                _ => false,
            },
            RuleId::VolumeCapRatio => match (asset.market_cap, asset.total_volume) {
                (Some(cap), Some(volume)) if cap > Decimal::ZERO => cap
                    .checked_mul(t.volume_cap_ratio)
                    .is_some_and(|limit| volume > limit),
                _ => false,
            },
            RuleId::MarketCapSurge => {
                above(asset.market_cap_change_pct_24h, t.market_cap_surge_pct)
            }
            RuleId::NearAllTimeHigh => match (asset.current_price, asset.all_time_high) {
                (Some(price), Some(ath)) if ath > Decimal::ZERO => ath
                    .checked_mul(t.near_ath_fraction)
                    .is_some_and(|floor| price >= floor),
                _ => false,
            },
            RuleId::RsiExtreme => ctx
                .batch_rsi
                .is_some_and(|rsi| rsi < t.rsi_oversold || rsi > t.rsi_overbought),
            RuleId::LargeCap => above(asset.market_cap, t.large_cap),
        }
    }
}

fn above(value: Option<Decimal>, threshold: Decimal) -> bool {
    matches!(value, Some(v) if v > threshold)
}

/// A named fact about one snapshot, produced by one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub rule: RuleId,
    pub weight: u32,
}

impl Signal {
    pub fn name(&self) -> &'static str {
        self.rule.label()
    }
}

/// Values derived once per batch for cross-asset rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchContext {
    /// RSI over the batch's current prices in source order. `None` when the
    /// batch is too short.
    pub batch_rsi: Option<Decimal>,
}

impl BatchContext {
    /// Computes the cross-sectional RSI for `batch`.
    pub fn from_batch(batch: &MarketBatch, rsi_window: usize) -> Self {
        let batch_rsi = match rolling_rsi(&batch.prices(), rsi_window) {
            Ok(rsi) => Some(rsi),
            Err(e) => {
                debug!(assets = batch.len(), "batch RSI unavailable: {e}");
                None
            }
        };
        Self { batch_rsi }
    }
}

/// The configured subset of rules with their thresholds and weights.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    config: RulesConfig,
}

impl RuleSet {
    /// Creates a rule set from validated configuration.
    pub fn new(config: RulesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    /// Builds the cross-asset context, skipping indicator work when no
    /// active rule needs it.
    pub fn context(&self, batch: &MarketBatch) -> BatchContext {
        if self.config.active.contains(&RuleId::RsiExtreme) {
            BatchContext::from_batch(batch, self.config.thresholds.rsi_window)
        } else {
            BatchContext::default()
        }
    }

    /// Evaluates every active rule against `asset`, in configured order.
    pub fn evaluate(&self, asset: &AssetSnapshot, ctx: &BatchContext) -> Vec<Signal> {
        let mut seen = Vec::with_capacity(self.config.active.len());
        let signals: Vec<Signal> = self
            .config
            .active
            .iter()
            .copied()
            .filter(|rule| {
                // duplicates in the config must not double count
                if seen.contains(rule) {
                    return false;
                }
                seen.push(*rule);
                rule.fires(asset, ctx, &self.config.thresholds)
            })
            .map(|rule| Signal {
                rule,
                weight: self.config.weight_of(rule),
            })
            .collect();

        debug!(
            symbol = %asset.symbol,
            signals = signals.len(),
            "evaluated rules"
        );
        signals
    }
}
