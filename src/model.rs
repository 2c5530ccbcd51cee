// Core structs: Listing, Severity, component errors
use std::time::Duration;
use thiserror::Error;

pub const TITLE_PLACEHOLDER: &str = "No title";
pub const PRICE_PLACEHOLDER: &str = "Price not given";

/// One scraped classified ad. Lives for a single cycle; only `id` outlives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub price: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration value `{0}`")]
    Missing(&'static str),
    #[error("invalid value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("failed to read config file {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("source responded with status {0}")]
    InvalidResponse(u16),
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt identity state: {0}")]
    Json(#[from] serde_json::Error),
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    ApiError(String),
    #[error("webhook rejected message with status {0}")]
    Rejected(u16),
    #[error("webhook did not answer in time")]
    Unreachable,
}

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("failed to persist identities: {0}")]
    Storage(#[from] StorageError),
    #[error("cycle panicked: {0}")]
    Panicked(String),
}
