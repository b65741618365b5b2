//! Environment-derived service configuration

use std::env;
use std::path::PathBuf;

/// Which persistence backend a run writes to.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// Whole-file JSON array, rewritten on every save.
    Json { path: PathBuf },
    /// SQLite table with an upsert keyed by product title.
    Sqlite { url: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Shared secret expected in the `token` request header.
    pub static_token: String,
    pub storage: StorageConfig,
    pub redis_url: String,
    pub images_dir: PathBuf,
    /// Stop an unbounded crawl after this many consecutive pages that
    /// yielded no products. `None` disables the policy.
    pub stop_after_empty: Option<u32>,
    pub bind_addr: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> Self {
        let storage = if env_or("STORAGE_TYPE", "json") == "sqlite" {
            StorageConfig::Sqlite {
                url: env_or("DATABASE_URL", "sqlite:database/products.db"),
            }
        } else {
            StorageConfig::Json {
                path: PathBuf::from(env_or("JSON_FILE_PATH", "products.json")),
            }
        };

        let redis_url = format!(
            "redis://{}:{}/{}",
            env_or("REDIS_HOST", "localhost"),
            env_or("REDIS_PORT", "6379"),
            env_or("REDIS_INDEX", "0"),
        );

        let stop_after_empty = match env_or("STOP_AFTER_EMPTY_PAGES", "3").parse::<u32>() {
            Ok(0) => None,
            Ok(n) => Some(n),
            Err(_) => Some(3),
        };

        Self {
            static_token: env_or("STATIC_TOKEN", "some-token"),
            storage,
            redis_url,
            images_dir: PathBuf::from(env_or("IMAGES_DIR", "images")),
            stop_after_empty,
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8000"),
        }
    }
}
