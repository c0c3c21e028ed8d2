//! Poll cycle orchestration.
//!
//! [`Poller`] runs one fetch → evaluate → notify cycle per tick, never
//! overlapping cycles. Fetch failures skip the tick and stretch the wait
//! with exponential backoff; notification failures are logged per asset
//! and never stop the rest of the cycle. Nothing is kept between cycles.

use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::Result;
use crate::alert::{AlertDecision, Aggregator};
use crate::market::{MarketRequest, MarketSource};
use crate::models::MarketBatch;
use crate::notify::Notifier;
use crate::signals::RuleSet;

/// Upper bound on the wait after repeated fetch failures.
const MAX_BACKOFF: Duration = Duration::from_secs(60 * 60);

/// Timing and concurrency knobs for the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Time between the end of one cycle and the start of the next.
    pub interval: Duration,
    /// Deadline for each external call (fetch or one notification).
    pub request_timeout: Duration,
    /// Notifications dispatched concurrently within one cycle.
    pub max_in_flight: usize,
    /// How long an in-flight cycle may keep running after shutdown.
    pub shutdown_grace: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5 * 60),
            request_timeout: Duration::from_secs(10),
            max_in_flight: 4,
            shutdown_grace: Duration::from_secs(10),
        }
    }
}

/// Whether a cycle is currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Running,
}

/// Summary of one completed cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Assets evaluated.
    pub assets: usize,
    /// Decisions that fired.
    pub alerts: usize,
    /// Alerts the sink accepted.
    pub delivered: usize,
    /// Alerts the sink rejected or timed out on.
    pub failed: usize,
}

/// Drives the fetch → evaluate → notify loop.
pub struct Poller<S, N> {
    source: S,
    sink: N,
    rules: RuleSet,
    aggregator: Aggregator,
    request: MarketRequest,
    config: PollerConfig,
    state: PollState,
}

impl<S: MarketSource, N: Notifier> Poller<S, N> {
    /// Creates a poller in the [`PollState::Idle`] state.
    #[must_use]
    pub fn new(
        source: S,
        sink: N,
        rules: RuleSet,
        aggregator: Aggregator,
        request: MarketRequest,
        config: PollerConfig,
    ) -> Self {
        Self {
            source,
            sink,
            rules,
            aggregator,
            request,
            config,
            state: PollState::Idle,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Applies the rule set and aggregator to every asset, returning the
    /// firing decisions in batch order.
    pub fn evaluate(&self, batch: &MarketBatch) -> Vec<AlertDecision> {
        let ctx = self.rules.context(batch);
        batch
            .iter()
            .map(|asset| {
                let signals = self.rules.evaluate(asset, &ctx);
                self.aggregator.decide(asset, signals)
            })
            .filter(|decision| decision.fires)
            .collect()
    }

    /// Runs a single cycle.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when no batch could be obtained; in that case
    /// nothing was evaluated or sent. Notification failures are counted in
    /// the report, not returned.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        self.state = PollState::Running;
        let result = self.cycle().await;
        self.state = PollState::Idle;
        result
    }

    async fn cycle(&self) -> Result<CycleReport> {
        let batch = self.fetch().await?;
        let alerts = self.evaluate(&batch);

        let outcomes: Vec<bool> = stream::iter(alerts.iter())
            .map(|decision| self.dispatch(decision))
            .buffered(self.config.max_in_flight.max(1))
            .collect()
            .await;

        let delivered = outcomes.iter().filter(|ok| **ok).count();
        Ok(CycleReport {
            assets: batch.len(),
            alerts: alerts.len(),
            delivered,
            failed: outcomes.len() - delivered,
        })
    }

    async fn fetch(&self) -> Result<MarketBatch> {
        let after = self.config.request_timeout;
        match tokio::time::timeout(after, self.source.fetch(&self.request)).await {
            Ok(result) => result,
            Err(_) => Err(crate::CoinwatchError::Timeout {
                operation: "fetch",
                after,
            }),
        }
    }

    /// Sends one alert; returns whether the sink accepted it.
    async fn dispatch(&self, decision: &AlertDecision) -> bool {
        let payload = self.aggregator.payload(decision);
        let symbol = decision.asset.display_symbol();
        let after = self.config.request_timeout;

        let result = match tokio::time::timeout(after, self.sink.notify(&payload)).await {
            Ok(result) => result,
            Err(_) => Err(crate::CoinwatchError::Timeout {
                operation: "notify",
                after,
            }),
        };

        match result {
            Ok(()) => {
                info!(
                    symbol = %symbol,
                    score = decision.score,
                    signals = %decision.signal_names().join(", "),
                    "Alert sent"
                );
                true
            }
            Err(e) => {
                warn!(symbol = %symbol, "Notification failed: {e}");
                false
            }
        }
    }

    /// Runs cycles until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// The first cycle starts immediately. A shutdown that arrives mid-cycle
    /// lets the cycle finish within [`PollerConfig::shutdown_grace`], after
    /// which it is abandoned.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut backoff = self.config.interval;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let grace = self.config.shutdown_grace;
            let outcome = {
                let cycle = self.run_cycle();
                tokio::pin!(cycle);

                loop {
                    tokio::select! {
                        result = &mut cycle => break Some(result),
                        changed = shutdown.changed() => {
                            // a `false` write is not a stop request
                            if changed.is_ok() && !*shutdown.borrow() {
                                continue;
                            }
                            info!(grace_secs = grace.as_secs(), "Shutdown requested, finishing cycle");
                            match tokio::time::timeout(grace, &mut cycle).await {
                                Ok(result) => log_cycle(&result),
                                Err(_) => warn!("In-flight cycle abandoned after grace period"),
                            }
                            break None;
                        }
                    }
                }
            };

            let Some(result) = outcome else {
                self.state = PollState::Idle;
                break;
            };
            log_cycle(&result);

            let wait = match result {
                Ok(_) => {
                    backoff = self.config.interval;
                    self.config.interval
                }
                Err(_) => {
                    let wait = backoff;
                    backoff = next_backoff(backoff, self.config.interval);
                    info!(backoff_secs = wait.as_secs(), "Backing off before next fetch");
                    wait
                }
            };

            if stop_during(&mut shutdown, wait).await {
                break;
            }
        }

        info!("Poller stopped");
    }
}

/// Sleeps for `wait`; returns `true` early if a stop is requested meanwhile.
async fn stop_during(shutdown: &mut watch::Receiver<bool>, wait: Duration) -> bool {
    let sleep = tokio::time::sleep(wait);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            () = &mut sleep => return false,
            changed = shutdown.changed() => {
                // sender gone: nobody can ever request a stop, treat as one
                if changed.is_err() || *shutdown.borrow() {
                    return true;
                }
            }
        }
    }
}

fn log_cycle(result: &Result<CycleReport>) {
    match result {
        Ok(report) => info!(
            assets = report.assets,
            alerts = report.alerts,
            delivered = report.delivered,
            failed = report.failed,
            "Cycle complete"
        ),
        Err(e) => warn!("Fetch failed, skipping cycle: {e}"),
    }
}

/// Doubles `current`, capped at one hour or at `interval` when that is longer.
fn next_backoff(current: Duration, interval: Duration) -> Duration {
    let next = current.saturating_mul(2).min(MAX_BACKOFF.max(interval));
    debug!(next_secs = next.as_secs(), "Backoff increased");
    next
}
