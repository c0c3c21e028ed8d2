//! Application configuration loaded from environment variables.
//!
//! The notification endpoint **must** be provided via `DISCORD_WEBHOOK_URL`.
//! Everything else has a default:
//! - `COINGECKO_API_URL` — markets endpoint
//! - `COINWATCH_CURRENCY`, `COINWATCH_PAGE_SIZE`, `COINWATCH_PAGE` — request shape
//! - `COINWATCH_POLL_INTERVAL_SECS`, `COINWATCH_REQUEST_TIMEOUT_SECS`,
//!   `COINWATCH_MAX_IN_FLIGHT`, `COINWATCH_SHUTDOWN_GRACE_SECS` — loop timing
//! - `COINWATCH_POLICY` (`count` | `weighted`), `COINWATCH_MIN_SIGNALS`,
//!   `COINWATCH_SCORE_THRESHOLD` — aggregation
//! - `COINWATCH_RULES_PATH` — optional JSON file of rule tunables
//! - `COINWATCH_MESSAGE_FORMAT` (`embed` | `text`) — webhook message shape
//!
//! Configuration is read once at startup and passed down explicitly.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::alert::{AggregationPolicy, MessageFormat};
use crate::market::MarketRequest;
use crate::poller::PollerConfig;
use crate::signals::config::RulesConfig;

/// Default CoinGecko markets endpoint.
pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3/coins/markets";

const DEFAULT_MIN_SIGNALS: usize = 2;
const DEFAULT_SCORE_THRESHOLD: u32 = 6;

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub coingecko: CoinGeckoConfig,
    pub discord: DiscordConfig,
    pub poller: PollerConfig,
    pub policy: AggregationPolicy,
    pub format: MessageFormat,
    pub rules: RulesConfig,
}

/// Market data source settings.
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    pub api_url: String,
    pub request: MarketRequest,
}

/// Notification sink settings.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub webhook_url: String,
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`CoinwatchError::Config`](crate::CoinwatchError::Config) if the
/// webhook URL is missing, a numeric variable does not parse or is zero,
/// the policy name is unknown, or the rules file is invalid.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let webhook_url = non_empty_var("DISCORD_WEBHOOK_URL").ok_or_else(|| {
        crate::CoinwatchError::Config("DISCORD_WEBHOOK_URL must be set".to_string())
    })?;

    let api_url =
        non_empty_var("COINGECKO_API_URL").unwrap_or_else(|| DEFAULT_COINGECKO_URL.to_string());

    let defaults = MarketRequest::default();
    let request = MarketRequest {
        currency: non_empty_var("COINWATCH_CURRENCY").unwrap_or(defaults.currency),
        page_size: positive_var("COINWATCH_PAGE_SIZE", defaults.page_size)?,
        page: positive_var("COINWATCH_PAGE", defaults.page)?,
        price_change_periods: defaults.price_change_periods,
    };

    let poll_defaults = PollerConfig::default();
    let poller = PollerConfig {
        interval: secs_var("COINWATCH_POLL_INTERVAL_SECS", poll_defaults.interval)?,
        request_timeout: secs_var(
            "COINWATCH_REQUEST_TIMEOUT_SECS",
            poll_defaults.request_timeout,
        )?,
        max_in_flight: positive_var("COINWATCH_MAX_IN_FLIGHT", poll_defaults.max_in_flight)?,
        shutdown_grace: secs_var("COINWATCH_SHUTDOWN_GRACE_SECS", poll_defaults.shutdown_grace)?,
    };

    let policy = match non_empty_var("COINWATCH_POLICY").as_deref() {
        None | Some("count") => AggregationPolicy::Count {
            min_signals: positive_var("COINWATCH_MIN_SIGNALS", DEFAULT_MIN_SIGNALS)?,
        },
        Some("weighted") => AggregationPolicy::Weighted {
            threshold: positive_var("COINWATCH_SCORE_THRESHOLD", DEFAULT_SCORE_THRESHOLD)?,
        },
        Some(other) => {
            return Err(crate::CoinwatchError::Config(format!(
                "COINWATCH_POLICY must be \"count\" or \"weighted\", got \"{other}\""
            )));
        }
    };

    let format = match non_empty_var("COINWATCH_MESSAGE_FORMAT").as_deref() {
        None | Some("embed") => MessageFormat::Embed,
        Some("text") => MessageFormat::Text,
        Some(other) => {
            return Err(crate::CoinwatchError::Config(format!(
                "COINWATCH_MESSAGE_FORMAT must be \"embed\" or \"text\", got \"{other}\""
            )));
        }
    };

    let rules = match non_empty_var("COINWATCH_RULES_PATH") {
        Some(path) => RulesConfig::load(Path::new(&path))?,
        None => RulesConfig::default(),
    };

    Ok(AppConfig {
        coingecko: CoinGeckoConfig { api_url, request },
        discord: DiscordConfig { webhook_url },
        poller,
        policy,
        format,
        rules,
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Parses a strictly positive number, falling back to `default` when unset.
fn positive_var<T>(name: &str, default: T) -> crate::Result<T>
where
    T: FromStr + PartialEq + Default,
{
    let Some(raw) = non_empty_var(name) else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Ok(value),
        Ok(_) => Err(crate::CoinwatchError::Config(format!(
            "{name} must be greater than zero"
        ))),
        Err(_) => Err(crate::CoinwatchError::Config(format!(
            "{name} is not a valid number: \"{raw}\""
        ))),
    }
}

fn secs_var(name: &str, default: Duration) -> crate::Result<Duration> {
    positive_var(name, default.as_secs()).map(Duration::from_secs)
}
