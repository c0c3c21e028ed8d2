//! Shared test doubles and builders.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use coinwatch::Result;
use coinwatch::market::{MarketRequest, MarketSource, parse_markets};
use coinwatch::models::{AssetSnapshot, MarketBatch, WebhookPayload};
use coinwatch::notify::Notifier;
use rust_decimal::Decimal;
use tokio::time::Instant;

/// Source that answers every fetch by parsing a fixed JSON body.
pub struct FixedSource {
    body: serde_json::Value,
    calls: Arc<Mutex<usize>>,
}

impl FixedSource {
    pub fn new(body: serde_json::Value) -> Self {
        Self {
            body,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<Mutex<usize>> {
        self.calls.clone()
    }
}

impl MarketSource for FixedSource {
    async fn fetch(&self, _request: &MarketRequest) -> Result<MarketBatch> {
        *self.calls.lock().unwrap() += 1;
        parse_markets(self.body.clone())
    }
}

/// Source that replays `bodies` in order, repeating the last one, and
/// records when each fetch started.
pub struct ScriptedSource {
    bodies: Mutex<VecDeque<serde_json::Value>>,
    last: serde_json::Value,
    delay: Duration,
    fetched_at: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedSource {
    pub fn new(bodies: Vec<serde_json::Value>) -> Self {
        let last = bodies.last().cloned().expect("at least one body");
        Self {
            bodies: Mutex::new(bodies.into()),
            last,
            delay: Duration::ZERO,
            fetched_at: Arc::default(),
        }
    }

    /// Makes every fetch take `delay` before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fetched_at(&self) -> Arc<Mutex<Vec<Instant>>> {
        self.fetched_at.clone()
    }
}

impl MarketSource for ScriptedSource {
    async fn fetch(&self, _request: &MarketRequest) -> Result<MarketBatch> {
        self.fetched_at.lock().unwrap().push(Instant::now());
        let body = {
            let mut bodies = self.bodies.lock().unwrap();
            bodies.pop_front().unwrap_or_else(|| self.last.clone())
        };
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        parse_markets(body)
    }
}

/// Source that never answers within any reasonable deadline.
pub struct StalledSource;

impl MarketSource for StalledSource {
    async fn fetch(&self, _request: &MarketRequest) -> Result<MarketBatch> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(MarketBatch::default())
    }
}

/// Sink that records every payload and fails for titles containing any of
/// `fail_for`.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<WebhookPayload>>>,
    pub fail_for: Vec<String>,
}

impl RecordingNotifier {
    pub fn failing_for(symbols: &[&str]) -> Self {
        Self {
            sent: Arc::default(),
            fail_for: symbols.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn titles(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .flat_map(|p| p.embeds.iter().map(|e| e.title.clone()))
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, payload: &WebhookPayload) -> Result<()> {
        let title = payload
            .embeds
            .first()
            .map(|e| e.title.clone())
            .unwrap_or_default();
        if self.fail_for.iter().any(|s| title.contains(s.as_str())) {
            return Err(coinwatch::CoinwatchError::Notify(format!(
                "rejected {title}"
            )));
        }
        self.sent.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

/// Snapshot with a symbol, a display name and a price.
pub fn asset(symbol: &str, price: Decimal) -> AssetSnapshot {
    AssetSnapshot {
        name: Some(symbol.to_uppercase()),
        current_price: Some(price),
        ..AssetSnapshot::new(symbol)
    }
}

/// Reads a file from `tests/fixtures`.
pub fn fixture(name: &str) -> String {
    let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(path).expect("failed to read fixture")
}
