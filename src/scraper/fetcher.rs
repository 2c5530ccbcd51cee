use crate::model::ScraperError;
use crate::scraper::traits::Scraper;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, COOKIE};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";
const ACCEPT_LANGUAGE_VALUE: &str = "pl-PL,pl;q=0.9,en-US;q=0.8,en;q=0.7";
// Skips the cookie-consent interstitial.
const CONSENT_COOKIE: &str = "test=1";

pub struct HttpScraper {
    client: Client,
    url: Url,
    timeout: Duration,
}

impl HttpScraper {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
        headers.insert(COOKIE, HeaderValue::from_static(CONSENT_COOKIE));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ScraperError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            url,
            timeout,
        })
    }
}

#[async_trait::async_trait]
impl Scraper for HttpScraper {
    async fn fetch(&self) -> Result<String, ScraperError> {
        debug!("GET {}", self.url);
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::InvalidResponse(status.as_u16()));
        }

        response.text().await.map_err(|e| self.classify(e))
    }
}

impl HttpScraper {
    fn classify(&self, e: reqwest::Error) -> ScraperError {
        if e.is_timeout() {
            ScraperError::Timeout(self.timeout)
        } else {
            ScraperError::HttpError(e.to_string())
        }
    }
}
