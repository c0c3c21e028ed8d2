//! Per-asset market snapshots as returned by the CoinGecko
//! `/coins/markets` endpoint.

use rust_decimal::Decimal;
use serde::Deserialize;

/// One asset's state at poll time.
///
/// Every numeric field is optional: the feed routinely returns `null` for
/// thinly traded assets, and a missing value means a rule cannot fire.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AssetSnapshot {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub current_price: Option<Decimal>,
    #[serde(default)]
    pub market_cap: Option<Decimal>,
    #[serde(default)]
    pub total_volume: Option<Decimal>,
    #[serde(default, rename = "ath")]
    pub all_time_high: Option<Decimal>,
    #[serde(default, rename = "price_change_percentage_1h_in_currency")]
    pub price_change_pct_1h: Option<Decimal>,
    #[serde(default, rename = "price_change_percentage_24h_in_currency")]
    pub price_change_pct_24h: Option<Decimal>,
    #[serde(default, rename = "price_change_percentage_7d_in_currency")]
    pub price_change_pct_7d: Option<Decimal>,
    #[serde(default, rename = "market_cap_change_percentage_24h")]
    pub market_cap_change_pct_24h: Option<Decimal>,
}

impl AssetSnapshot {
    /// Creates a snapshot with only the symbol set.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// Upper-cased ticker symbol used for display.
    pub fn display_symbol(&self) -> String {
        self.symbol.to_uppercase()
    }

    /// Human-readable name, falling back to the symbol when absent.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.symbol)
    }
}

/// The ordered collection of snapshots returned by one poll.
///
/// Order is source-defined (market-cap descending for CoinGecko) and only
/// matters for cross-asset indicators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketBatch {
    pub assets: Vec<AssetSnapshot>,
}

impl MarketBatch {
    pub fn new(assets: Vec<AssetSnapshot>) -> Self {
        Self { assets }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AssetSnapshot> {
        self.assets.iter()
    }

    /// Current prices in batch order, skipping assets without a price.
    pub fn prices(&self) -> Vec<Decimal> {
        self.assets.iter().filter_map(|a| a.current_price).collect()
    }
}

impl<'a> IntoIterator for &'a MarketBatch {
    type Item = &'a AssetSnapshot;
    type IntoIter = std::slice::Iter<'a, AssetSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.assets.iter()
    }
}
