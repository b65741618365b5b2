//! Completion notifications for a scraping run

use async_trait::async_trait;
use tracing::info;

use crate::error::ScrapeError;

/// Emits a summary once a run has finished.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, count: usize, recipient: Option<&str>) -> Result<(), ScrapeError>;
}

/// Logs the count; ignores the recipient.
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, count: usize, _recipient: Option<&str>) -> Result<(), ScrapeError> {
        info!("Scraped {count} products.");
        Ok(())
    }
}

/// Addressed summary. No message transport is wired up; the addressed
/// line is logged in its place.
pub struct EmailNotifier;

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, count: usize, recipient: Option<&str>) -> Result<(), ScrapeError> {
        let recipient = recipient.ok_or_else(|| {
            ScrapeError::Validation("email notifier requires a recipient".to_string())
        })?;
        info!("Email notified to {recipient}: scraped {count} products.");
        Ok(())
    }
}
