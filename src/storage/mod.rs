//! Pluggable persistence for scraped products

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use tokio::fs;
use tracing::info;

use crate::config::{Config, StorageConfig};
use crate::error::ScrapeError;
use crate::models::Product;

/// Persistence backend for one scraping run.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persists all given records; success is the absence of failure.
    async fn save(&self, products: &[Product]) -> Result<(), ScrapeError>;
}

/// Builds the backend selected by configuration.
pub async fn from_config(config: &Config) -> Result<Box<dyn Storage>, ScrapeError> {
    match &config.storage {
        StorageConfig::Json { path } => Ok(Box::new(JsonFileStorage::new(path.clone()))),
        StorageConfig::Sqlite { url } => Ok(Box::new(SqliteStorage::connect(url).await?)),
    }
}

/// Whole-file JSON array: load, append, rewrite.
///
/// Not safe under concurrent writers; there is no locking around the
/// read-modify-write.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn load(&self) -> Result<Vec<Product>, ScrapeError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Storage for JsonFileStorage {
    async fn save(&self, products: &[Product]) -> Result<(), ScrapeError> {
        let mut existing = self.load().await?;
        existing.extend_from_slice(products);
        fs::write(&self.path, serde_json::to_vec_pretty(&existing)?).await?;
        Ok(())
    }
}

/// SQLite table keyed by product title, one upsert per record.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub async fn connect(url: &str) -> Result<Self, ScrapeError> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            info!("creating database file");
            Sqlite::create_database(url).await?;
        }

        let pool = SqlitePool::connect(url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn save(&self, products: &[Product]) -> Result<(), ScrapeError> {
        // One transaction per save call, committing the whole batch.
        let mut tx = self.pool.begin().await?;
        for product in products {
            sqlx::query(
                r"
                INSERT INTO products (product_title, product_price, path_to_image)
                VALUES (?, ?, ?)
                ON CONFLICT(product_title) DO UPDATE
                SET product_price = excluded.product_price,
                    path_to_image = excluded.path_to_image
                ",
            )
            .bind(&product.title)
            .bind(product.price)
            .bind(&product.image_path)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::{sqlite::SqlitePoolOptions, Row};

    use super::*;

    fn product(title: &str, price: f64) -> Product {
        Product::new(title.to_string(), price, format!("images/{title}.jpg")).unwrap()
    }

    #[tokio::test]
    async fn json_saves_append_in_call_order() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("products.json"));

        let p1 = product("Scaler", 450.0);
        let p2 = product("Mirror", 120.0);
        storage.save(std::slice::from_ref(&p1)).await.unwrap();
        storage.save(std::slice::from_ref(&p2)).await.unwrap();

        let persisted = storage.load().await.unwrap();
        assert_eq!(persisted, vec![p1, p2]);
    }

    #[tokio::test]
    async fn json_save_starts_empty_when_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("absent.json"));

        storage.save(&[product("Scaler", 450.0)]).await.unwrap();

        assert_eq!(storage.load().await.unwrap().len(), 1);
    }

    async fn memory_storage() -> SqliteStorage {
        // A pool larger than one connection would hand out separate
        // in-memory databases.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        SqliteStorage { pool }
    }

    #[tokio::test]
    async fn sqlite_upsert_keeps_one_row_per_title() {
        let storage = memory_storage().await;

        storage.save(&[product("Scaler", 450.0)]).await.unwrap();
        let updated = Product::new(
            "Scaler".to_string(),
            399.0,
            "images/scaler-v2.jpg".to_string(),
        )
        .unwrap();
        storage.save(&[updated]).await.unwrap();

        let rows = sqlx::query("SELECT product_price, path_to_image FROM products")
            .fetch_all(&storage.pool)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get::<f64, _>("product_price"), 399.0);
        assert_eq!(
            rows[0].get::<String, _>("path_to_image"),
            "images/scaler-v2.jpg"
        );
    }

    #[tokio::test]
    async fn sqlite_save_commits_the_whole_batch() {
        let storage = memory_storage().await;

        storage
            .save(&[product("Scaler", 450.0), product("Mirror", 120.0)])
            .await
            .unwrap();

        let rows = sqlx::query("SELECT product_title FROM products ORDER BY product_title")
            .fetch_all(&storage.pool)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }
}
