//! HTTP session with bounded retry and optional proxy routing

use async_trait::async_trait;
use reqwest::{Client, Proxy, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
    policies::ExponentialBackoff, RetryTransientMiddleware, Retryable, RetryableStrategy,
};
use tracing::debug;

use crate::error::ScrapeError;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// HTTP access used by the pipeline for pages and images.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError>;
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ScrapeError>;
}

/// Retry only the server-error statuses a flaky origin recovers from;
/// transport errors are transient too, everything else fails immediately.
struct ServerErrorStrategy;

impl RetryableStrategy for ServerErrorStrategy {
    fn handle(
        &self,
        res: &Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Ok(response) => match response.status() {
                StatusCode::INTERNAL_SERVER_ERROR
                | StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT => Some(Retryable::Transient),
                _ => None,
            },
            Err(_) => Some(Retryable::Transient),
        }
    }
}

/// One connection-pooled session per run, so the retry policy and proxy
/// settings apply uniformly to every request.
pub struct HttpFetcher {
    client: ClientWithMiddleware,
}

impl HttpFetcher {
    pub fn new(proxy: Option<&str>) -> Result<Self, ScrapeError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(proxy_url) = proxy {
            builder = builder.proxy(Proxy::all(proxy_url)?);
        }
        let client = builder.build()?;

        // 2 retries on top of the initial attempt, doubling backoff
        let retry_policy = ExponentialBackoff::builder()
            .base(2)
            .build_with_max_retries(2);
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                retry_policy,
                ServerErrorStrategy,
            ))
            .build();

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        Ok(response.text().await?)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ScrapeError> {
        debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}
