// notifier/discord/sender.rs

use crate::model::NotifyError;
use crate::notifier::discord::embed::WebhookPayload;
use crate::notifier::discord::DiscordNotifier;
use reqwest::StatusCode;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Posts one payload; only 200 and 204 count as delivered.
pub async fn deliver(notifier: &DiscordNotifier, payload: &WebhookPayload) -> Result<(), NotifyError> {
    let response = match timeout(
        notifier.timeout,
        notifier.client.post(notifier.webhook_url.clone()).json(payload).send(),
    )
    .await
    {
        Ok(Ok(resp)) => resp,
        Ok(Err(e)) => {
            warn!("❌ Webhook send() failed: {:?}", e);
            return Err(NotifyError::ApiError(e.to_string()));
        }
        Err(_) => {
            warn!("⏳ Webhook send() timed out");
            return Err(NotifyError::Unreachable);
        }
    };

    let status = response.status();
    if status != StatusCode::OK && status != StatusCode::NO_CONTENT {
        let body = response.text().await.unwrap_or_else(|_| "unknown".into());
        warn!("❌ Webhook responded [{}]: {}", status, body);
        return Err(NotifyError::Rejected(status.as_u16()));
    }
    debug!("✅ Webhook accepted message [{}]", status);
    Ok(())
}
