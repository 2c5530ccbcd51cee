pub mod discord;

use crate::model::{Listing, NotifyError, Severity};

pub use discord::DiscordNotifier;

/// External message sink. Callers decide what a failed delivery means.
#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    async fn notify_listing(&self, listing: &Listing) -> Result<(), NotifyError>;
    async fn notify_status(&self, message: &str, severity: Severity) -> Result<(), NotifyError>;
}
