//! Alert aggregation and message building.
//!
//! [`Aggregator`] turns the signals fired for one asset into an
//! [`AlertDecision`] under a single configured [`AggregationPolicy`], and
//! renders firing decisions into webhook payloads. The notification sink
//! knows nothing about signals; all formatting lives here.

use rust_decimal::Decimal;

use crate::models::{AssetSnapshot, Embed, WebhookPayload};
use crate::signals::Signal;

/// Embed colour for bullish alerts.
pub const COLOR_BULLISH: u32 = 0x00ff00;

/// Embed colour when any bearish signal fired.
pub const COLOR_BEARISH: u32 = 0xff0000;

const ALERT_DESCRIPTION: &str = "Multiple signals aligned!";

/// How fired signals become a fire / no-fire decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationPolicy {
    /// Fires when at least `min_signals` countable signals fired.
    Count { min_signals: usize },
    /// Fires when the summed signal weights reach `threshold` (inclusive).
    Weighted { threshold: u32 },
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self::Count { min_signals: 2 }
    }
}

/// Shape of the outbound webhook message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessageFormat {
    /// One rich embed per alert.
    #[default]
    Embed,
    /// One plain `content` line per alert.
    Text,
}

/// Per-asset, per-cycle outcome of aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDecision {
    pub asset: AssetSnapshot,
    /// Fired signals in rule evaluation order.
    pub signals: Vec<Signal>,
    pub score: u32,
    pub fires: bool,
}

impl AlertDecision {
    /// Signal names in evaluation order.
    pub fn signal_names(&self) -> Vec<&'static str> {
        self.signals.iter().map(Signal::name).collect()
    }

    /// Whether any fired signal describes downward movement.
    pub fn is_bearish(&self) -> bool {
        self.signals.iter().any(|s| s.rule.is_bearish())
    }
}

/// Applies the active [`AggregationPolicy`] and builds outbound messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    policy: AggregationPolicy,
    format: MessageFormat,
}

impl Aggregator {
    pub fn new(policy: AggregationPolicy) -> Self {
        Self {
            policy,
            format: MessageFormat::Embed,
        }
    }

    /// Switches the message shape produced by [`Aggregator::payload`].
    #[must_use]
    pub fn with_format(mut self, format: MessageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn policy(&self) -> AggregationPolicy {
        self.policy
    }

    /// Scores `signals` for `asset` and decides whether to alert.
    pub fn decide(&self, asset: &AssetSnapshot, signals: Vec<Signal>) -> AlertDecision {
        let (score, fires) = match self.policy {
            AggregationPolicy::Count { min_signals } => {
                let count = signals
                    .iter()
                    .filter(|s| s.rule.counts_toward_count())
                    .count();
                (
                    u32::try_from(count).unwrap_or(u32::MAX),
                    count >= min_signals,
                )
            }
            AggregationPolicy::Weighted { threshold } => {
                let sum = signals
                    .iter()
                    .fold(0u32, |acc, s| acc.saturating_add(s.weight));
                (sum, sum >= threshold)
            }
        };

        AlertDecision {
            asset: asset.clone(),
            signals,
            score,
            fires,
        }
    }

    /// Builds the Discord embed for a decision.
    pub fn embed(&self, decision: &AlertDecision) -> Embed {
        let asset = &decision.asset;
        let color = if decision.is_bearish() {
            COLOR_BEARISH
        } else {
            COLOR_BULLISH
        };
        let title = format!(
            "🚀 Coin Alert: {} ({})",
            asset.display_name(),
            asset.display_symbol()
        );

        let mut embed = Embed::new(title, color)
            .description(ALERT_DESCRIPTION)
            .field("Price", format_money(asset.current_price), true)
            .field("Market Cap", format_money(asset.market_cap), true)
            .field("Signals", decision.signal_names().join(", "), false);

        if let AggregationPolicy::Weighted { threshold } = self.policy {
            embed = embed.field("Score", format!("{}/{threshold}", decision.score), true);
        }
        embed
    }

    /// One-line plain-text rendering of a decision.
    pub fn text(&self, decision: &AlertDecision) -> String {
        let asset = &decision.asset;
        format!(
            "{} ({}) price {} cap {}: {} [score {}]",
            asset.display_name(),
            asset.display_symbol(),
            format_money(asset.current_price),
            format_money(asset.market_cap),
            decision.signal_names().join(", "),
            decision.score
        )
    }

    /// Webhook body for a firing decision, in the configured format.
    pub fn payload(&self, decision: &AlertDecision) -> WebhookPayload {
        match self.format {
            MessageFormat::Embed => WebhookPayload::embed(self.embed(decision)),
            MessageFormat::Text => WebhookPayload::text(self.text(decision)),
        }
    }
}

/// Formats a currency amount as `$1,234.5`, or `n/a` when absent.
pub fn format_money(value: Option<Decimal>) -> String {
    let Some(value) = value else {
        return "n/a".to_string();
    };

    let text = value.normalize().to_string();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{sign}${grouped}.{f}"),
        None => format!("{sign}${grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::RuleId;
    use rust_decimal_macros::dec;

    fn signal(rule: RuleId, weight: u32) -> Signal {
        Signal { rule, weight }
    }

    #[test]
    fn count_policy_fires_at_min_signals() {
        let agg = Aggregator::new(AggregationPolicy::Count { min_signals: 2 });
        let asset = AssetSnapshot::new("abc");

        let two = agg.decide(
            &asset,
            vec![signal(RuleId::DailyPump, 1), signal(RuleId::HighVolume, 1)],
        );
        assert!(two.fires);
        assert_eq!(two.score, 2);

        let one = agg.decide(&asset, vec![signal(RuleId::DailyPump, 1)]);
        assert!(!one.fires);
        assert_eq!(one.score, 1);
    }

    #[test]
    fn count_policy_ignores_large_cap() {
        let agg = Aggregator::new(AggregationPolicy::Count { min_signals: 2 });
        let decision = agg.decide(
            &AssetSnapshot::new("big"),
            vec![signal(RuleId::DailyPump, 1), signal(RuleId::LargeCap, 5)],
        );
        assert!(!decision.fires);
        assert_eq!(decision.score, 1);
        assert_eq!(decision.signals.len(), 2);
    }

    #[test]
    fn weighted_policy_threshold_is_inclusive() {
        let agg = Aggregator::new(AggregationPolicy::Weighted { threshold: 6 });
        let asset = AssetSnapshot::new("w");

        let exact = agg.decide(
            &asset,
            vec![
                signal(RuleId::WeeklyPump, 2),
                signal(RuleId::LargeCap, 3),
                signal(RuleId::HighVolume, 1),
            ],
        );
        assert_eq!(exact.score, 6);
        assert!(exact.fires);

        let short = agg.decide(
            &asset,
            vec![signal(RuleId::WeeklyPump, 2), signal(RuleId::LargeCap, 3)],
        );
        assert!(!short.fires);
    }

    #[test]
    fn no_signals_never_fire() {
        let asset = AssetSnapshot::new("none");
        let count = Aggregator::new(AggregationPolicy::Count { min_signals: 1 });
        let weighted = Aggregator::new(AggregationPolicy::Weighted { threshold: 1 });
        assert!(!count.decide(&asset, Vec::new()).fires);
        assert!(!weighted.decide(&asset, Vec::new()).fires);
    }

    #[test]
    fn embed_matches_alert_layout() {
        let agg = Aggregator::default();
        let mut asset = AssetSnapshot::new("xyz");
        asset.name = Some("Xyz Coin".to_string());
        asset.current_price = Some(dec!(1234.50));
        asset.market_cap = Some(dec!(500000000));

        let decision = agg.decide(
            &asset,
            vec![signal(RuleId::ShortTermPump, 1), signal(RuleId::DailyPump, 1)],
        );
        let embed = agg.embed(&decision);

        assert_eq!(embed.title, "🚀 Coin Alert: Xyz Coin (XYZ)");
        assert_eq!(embed.description.as_deref(), Some("Multiple signals aligned!"));
        assert_eq!(embed.color, COLOR_BULLISH);
        assert_eq!(embed.field_value("Price"), Some("$1,234.5"));
        assert_eq!(embed.field_value("Market Cap"), Some("$500,000,000"));
        assert_eq!(
            embed.field_value("Signals"),
            Some("Short-term pump, Daily pump")
        );
        assert!(embed.field_value("Score").is_none());
        assert!(!embed.fields[2].inline);
    }

    #[test]
    fn bearish_embed_is_red_and_weighted_shows_score() {
        let agg = Aggregator::new(AggregationPolicy::Weighted { threshold: 2 });
        let decision = agg.decide(
            &AssetSnapshot::new("dn"),
            vec![signal(RuleId::DailyDump, 1), signal(RuleId::HighVolume, 1)],
        );
        let embed = agg.embed(&decision);
        assert_eq!(embed.color, COLOR_BEARISH);
        assert_eq!(embed.field_value("Score"), Some("2/2"));
        assert_eq!(embed.field_value("Price"), Some("n/a"));
    }

    #[test]
    fn text_rendering() {
        let agg = Aggregator::default();
        let mut asset = AssetSnapshot::new("eth");
        asset.name = Some("Ethereum".to_string());
        asset.current_price = Some(dec!(2250));
        let decision = agg.decide(&asset, vec![signal(RuleId::DailyPump, 1)]);

        assert_eq!(
            agg.text(&decision),
            "Ethereum (ETH) price $2,250 cap n/a: Daily pump [score 1]"
        );
    }

    #[test]
    fn payload_follows_message_format() {
        let asset = AssetSnapshot::new("eth");
        let signals = vec![signal(RuleId::DailyPump, 1), signal(RuleId::HighVolume, 1)];

        let embedded = Aggregator::default();
        let payload = embedded.payload(&embedded.decide(&asset, signals.clone()));
        assert!(payload.content.is_none());
        assert_eq!(payload.embeds.len(), 1);

        let plain = Aggregator::default().with_format(MessageFormat::Text);
        let payload = plain.payload(&plain.decide(&asset, signals));
        assert!(payload.embeds.is_empty());
        assert_eq!(
            payload.content.as_deref(),
            Some("eth (ETH) price n/a cap n/a: Daily pump, High absolute volume [score 2]")
        );
    }

    #[test]
    fn money_formatting() {
        assert_eq!(format_money(Some(dec!(0))), "$0");
        assert_eq!(format_money(Some(dec!(999))), "$999");
        assert_eq!(format_money(Some(dec!(1000))), "$1,000");
        assert_eq!(format_money(Some(dec!(43250.12))), "$43,250.12");
        assert_eq!(format_money(Some(dec!(846000000000))), "$846,000,000,000");
        assert_eq!(format_money(Some(dec!(0.00001234))), "$0.00001234");
        assert_eq!(format_money(Some(dec!(-1234567.8))), "-$1,234,567.8");
        assert_eq!(format_money(None), "n/a");
    }
}
