pub mod embed;
pub mod sender;

use crate::model::{Listing, NotifyError, Severity};
use crate::notifier::Sink;
use chrono::Utc;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Delivers embeds to a Discord-compatible webhook.
pub struct DiscordNotifier {
    pub webhook_url: Url,
    pub client: Client,
    pub timeout: Duration,
}

impl DiscordNotifier {
    pub fn new(webhook_url: Url, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .build()
            .map_err(|e| NotifyError::ApiError(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            webhook_url,
            client,
            timeout,
        })
    }
}

#[async_trait::async_trait]
impl Sink for DiscordNotifier {
    async fn notify_listing(&self, listing: &Listing) -> Result<(), NotifyError> {
        let payload = embed::listing_payload(listing, Utc::now());
        sender::deliver(self, &payload).await
    }

    async fn notify_status(&self, message: &str, severity: Severity) -> Result<(), NotifyError> {
        let payload = embed::status_payload(message, severity, Utc::now());
        sender::deliver(self, &payload).await
    }
}
