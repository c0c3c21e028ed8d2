//! Market data source.
//!
//! [`MarketSource`] is the seam the poller fetches batches through;
//! [`CoinGeckoClient`] implements it against the public
//! [`/coins/markets`](https://docs.coingecko.com/reference/coins-markets)
//! REST endpoint.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::Result;
use crate::models::{AssetSnapshot, MarketBatch};

/// Parameters of one market data request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketRequest {
    /// Quote currency, e.g. `usd`.
    pub currency: String,
    pub page_size: u32,
    pub page: u32,
    /// Periods for which percentage changes are requested (`1h`, `24h`, `7d`).
    pub price_change_periods: Vec<String>,
}

impl Default for MarketRequest {
    fn default() -> Self {
        Self {
            currency: "usd".to_string(),
            page_size: 50,
            page: 1,
            price_change_periods: vec!["1h".to_string(), "24h".to_string(), "7d".to_string()],
        }
    }
}

/// Anything that can produce one batch of asset snapshots per call.
pub trait MarketSource: Send + Sync {
    /// Fetches one batch.
    ///
    /// # Errors
    ///
    /// Implementations return an error for transport failures, non-success
    /// statuses, and payloads that are not a list of records.
    fn fetch(&self, request: &MarketRequest) -> impl Future<Output = Result<MarketBatch>> + Send;
}

/// HTTP client for the CoinGecko markets endpoint.
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    client: reqwest::Client,
    url: String,
}

impl CoinGeckoClient {
    /// Builds a client for `url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`CoinwatchError::Http`](crate::CoinwatchError::Http) if the
    /// underlying HTTP client cannot be constructed.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("coinwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl MarketSource for CoinGeckoClient {
    async fn fetch(&self, request: &MarketRequest) -> Result<MarketBatch> {
        let query = [
            ("vs_currency", request.currency.clone()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", request.page_size.to_string()),
            ("page", request.page.to_string()),
            ("sparkline", "false".to_string()),
            ("price_change_percentage", request.price_change_periods.join(",")),
        ];

        let response = self.client.get(&self.url).query(&query).send().await?;
        let response = response.error_for_status()?;
        let body: serde_json::Value = response.json().await?;

        let batch = parse_markets(body)?;
        debug!(assets = batch.len(), "Fetched market batch");
        Ok(batch)
    }
}

/// Converts a `/coins/markets` response body into a [`MarketBatch`].
///
/// Records that do not parse as an [`AssetSnapshot`] are skipped with a
/// warning; the rest of the batch is kept in source order.
///
/// # Errors
///
/// Returns [`CoinwatchError::MalformedPayload`](crate::CoinwatchError::MalformedPayload)
/// when the body is not a JSON array (CoinGecko answers rate limiting and
/// bad requests with an object).
pub fn parse_markets(body: serde_json::Value) -> Result<MarketBatch> {
    let items = match body {
        serde_json::Value::Array(items) => items,
        other => {
            return Err(crate::CoinwatchError::MalformedPayload(describe_non_list(
                &other,
            )));
        }
    };

    let mut assets = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<AssetSnapshot>(item) {
            Ok(asset) => assets.push(asset),
            Err(e) => warn!(index, "Skipping unparseable market record: {e}"),
        }
    }
    Ok(MarketBatch::new(assets))
}

/// Summarises a non-list body, surfacing the API's own error text if any.
fn describe_non_list(body: &serde_json::Value) -> String {
    let message = body["status"]["error_message"]
        .as_str()
        .or_else(|| body["error"].as_str());
    match message {
        Some(message) => format!("expected a list of markets, got error: {message}"),
        None => {
            let kind = match body {
                serde_json::Value::Null => "null",
                serde_json::Value::Bool(_) => "a boolean",
                serde_json::Value::Number(_) => "a number",
                serde_json::Value::String(_) => "a string",
                serde_json::Value::Object(_) => "an object",
                serde_json::Value::Array(_) => "a list",
            };
            format!("expected a list of markets, got {kind}")
        }
    }
}
