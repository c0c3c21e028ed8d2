//! Crypto market signal monitor.
//!
//! Polls a market data feed, evaluates every asset against a configurable
//! set of signal rules, aggregates fired signals into alert decisions, and
//! posts firing alerts to a Discord webhook.

pub mod alert;
pub mod config;
pub mod error;
pub mod indicators;
pub mod market;
pub mod models;
pub mod notify;
pub mod poller;
pub mod signals;

pub use error::{CoinwatchError, Result};
