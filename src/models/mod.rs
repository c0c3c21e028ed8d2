//! Wire models for the market data feed and the notification webhook.

pub mod embed;
pub mod snapshot;

pub use embed::{Embed, EmbedField, WebhookPayload};
pub use snapshot::{AssetSnapshot, MarketBatch};
