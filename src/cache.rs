//! Last-seen price cache backed by Redis

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands};

use crate::error::ScrapeError;

/// Key-value record of the last persisted price per product title.
///
/// Purely a write filter: a cold or flushed cache causes redundant
/// storage writes, never wrong ones, since storage upserts by title.
#[async_trait]
pub trait ChangeCache: Send + Sync {
    async fn get_price(&self, title: &str) -> Result<Option<f64>, ScrapeError>;
    async fn set_price(&self, title: &str, price: f64) -> Result<(), ScrapeError>;
}

pub struct RedisChangeCache {
    conn: MultiplexedConnection,
}

impl RedisChangeCache {
    pub async fn connect(url: &str) -> Result<Self, ScrapeError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl ChangeCache for RedisChangeCache {
    async fn get_price(&self, title: &str) -> Result<Option<f64>, ScrapeError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(title).await?;
        // Values are written by us as plain decimal strings; anything else
        // reads as a miss and gets overwritten on the next persist.
        Ok(value.and_then(|v| v.parse::<f64>().ok()))
    }

    async fn set_price(&self, title: &str, price: f64) -> Result<(), ScrapeError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(title, price.to_string()).await?;
        Ok(())
    }
}
