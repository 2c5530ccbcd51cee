use crate::model::ScraperError;

/// Source of the raw search-results page.
#[async_trait::async_trait]
pub trait Scraper: Send + Sync {
    async fn fetch(&self) -> Result<String, ScraperError>;
}
