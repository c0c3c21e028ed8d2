//! Notification sink.
//!
//! [`Notifier`] is a dumb transport: it receives a ready-made
//! [`WebhookPayload`] and delivers it. [`DiscordWebhook`] posts to a Discord
//! `Execute Webhook` URL.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::Result;
use crate::models::WebhookPayload;

/// Delivers preformatted alert messages.
pub trait Notifier: Send + Sync {
    /// Sends one message.
    ///
    /// # Errors
    ///
    /// Returns an error when the transport fails or the endpoint rejects
    /// the message. Callers log and continue.
    fn notify(&self, payload: &WebhookPayload) -> impl Future<Output = Result<()>> + Send;
}

/// Discord webhook client.
#[derive(Debug, Clone)]
pub struct DiscordWebhook {
    client: reqwest::Client,
    url: String,
}

impl DiscordWebhook {
    /// Builds a webhook client for `url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`CoinwatchError::Http`](crate::CoinwatchError::Http) if the
    /// underlying HTTP client cannot be constructed.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl Notifier for DiscordWebhook {
    async fn notify(&self, payload: &WebhookPayload) -> Result<()> {
        let response = self.client.post(&self.url).json(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(crate::CoinwatchError::Notify(format!(
                "webhook returned {status}: {}",
                body.trim()
            )));
        }

        debug!(%status, "Webhook delivered");
        Ok(())
    }
}
