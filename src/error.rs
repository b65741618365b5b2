//! Error taxonomy for the scraping service

use thiserror::Error;

/// Everything that can go wrong during a scraping run.
///
/// Only `Http` is recoverable: the pipeline logs it and moves on to the
/// next page. The rest abort the request.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid settings: {0}")]
    Validation(String),

    #[error("unauthorized")]
    Auth,

    #[error("http request failed: {0}")]
    Http(#[from] reqwest_middleware::Error),

    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("migration failure: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failure: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cache failure: {0}")]
    Cache(#[from] redis::RedisError),
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(reqwest_middleware::Error::Reqwest(err))
    }
}

impl ScrapeError {
    /// True for per-page HTTP failures the scrape loop tolerates.
    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}
