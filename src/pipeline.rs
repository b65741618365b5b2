//! Scrape-parse-store-notify pipeline for one request

use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::{ChangeCache, RedisChangeCache};
use crate::config::Config;
use crate::error::ScrapeError;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::images::ImageDownloader;
use crate::models::{Product, ScrapingSettings};
use crate::notifier::{ConsoleNotifier, EmailNotifier, Notifier};
use crate::parser::PageParser;
use crate::storage::{self, Storage};

const SHOP_ROOT_URL: &str = "https://dentalstall.com/shop";

fn page_url(page: u32) -> String {
    if page == 1 {
        SHOP_ROOT_URL.to_string()
    } else {
        format!("{SHOP_ROOT_URL}/page/{page}/")
    }
}

/// One scraping run. Built per request, consumed by [`Scraper::run`].
pub struct Scraper {
    settings: ScrapingSettings,
    stop_after_empty: Option<u32>,
    fetcher: Arc<dyn Fetcher>,
    parser: PageParser,
    images: ImageDownloader,
    cache: Box<dyn ChangeCache>,
    storage: Box<dyn Storage>,
    notifier: Box<dyn Notifier>,
    products: Vec<Product>,
}

impl Scraper {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: ScrapingSettings,
        stop_after_empty: Option<u32>,
        fetcher: Arc<dyn Fetcher>,
        images: ImageDownloader,
        cache: Box<dyn ChangeCache>,
        storage: Box<dyn Storage>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            settings,
            stop_after_empty,
            fetcher,
            parser: PageParser::new(),
            images,
            cache,
            storage,
            notifier,
            products: Vec::new(),
        }
    }

    /// Wires up the production collaborators: retrying HTTP session with
    /// the request's proxy, Redis change cache, and the configured
    /// storage backend. The notifier follows the presence of an email.
    pub async fn from_config(
        config: &Config,
        settings: ScrapingSettings,
    ) -> Result<Self, ScrapeError> {
        settings.validate()?;

        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(settings.proxy.as_deref())?);
        let images = ImageDownloader::new(fetcher.clone(), config.images_dir.clone());
        let cache: Box<dyn ChangeCache> =
            Box::new(RedisChangeCache::connect(&config.redis_url).await?);
        let storage = storage::from_config(config).await?;
        let notifier: Box<dyn Notifier> = if settings.email.is_some() {
            Box::new(EmailNotifier)
        } else {
            Box::new(ConsoleNotifier)
        };

        Ok(Self::new(
            settings,
            config.stop_after_empty,
            fetcher,
            images,
            cache,
            storage,
            notifier,
        ))
    }

    /// Crawls the catalog, persists price changes, notifies, and returns
    /// the number of products scraped.
    pub async fn run(mut self) -> Result<usize, ScrapeError> {
        self.scrape().await?;
        self.save_changed().await?;
        self.notifier
            .notify(self.products.len(), self.settings.email.as_deref())
            .await?;
        Ok(self.products.len())
    }

    async fn scrape(&mut self) -> Result<(), ScrapeError> {
        let mut page = 1u32;
        let mut consecutive_empty = 0u32;

        loop {
            if let Some(limit) = self.settings.page_limit {
                if page > limit {
                    break;
                }
            }
            if let Some(max) = self.stop_after_empty {
                if consecutive_empty >= max {
                    info!("stopping after {consecutive_empty} consecutive unproductive pages");
                    break;
                }
            }

            match self.scrape_page(page).await {
                Ok(0) => consecutive_empty += 1,
                Ok(count) => {
                    info!("page {page}: {count} products");
                    consecutive_empty = 0;
                }
                // A failed page is lost, not retried; the loop moves on.
                Err(e) if e.is_http() => {
                    warn!("failed to retrieve page {page}: {e}");
                    consecutive_empty += 1;
                }
                Err(e) => return Err(e),
            }

            page += 1;
        }
        Ok(())
    }

    async fn scrape_page(&mut self, page: u32) -> Result<usize, ScrapeError> {
        let html = self.fetcher.fetch_page(&page_url(page)).await?;
        let found = self.parser.parse(&html, &self.images).await?;
        let count = found.len();
        self.products.extend(found);
        Ok(count)
    }

    /// Persists only products whose price is new or changed since the
    /// last run, then records the persisted prices in the cache.
    async fn save_changed(&self) -> Result<(), ScrapeError> {
        let mut changed = Vec::new();
        for product in &self.products {
            match self.cache.get_price(&product.title).await? {
                Some(cached) if cached == product.price => {}
                _ => changed.push(product.clone()),
            }
        }

        if changed.is_empty() {
            return Ok(());
        }
        self.storage.save(&changed).await?;
        for product in &changed {
            self.cache.set_price(&product.title, product.price).await?;
        }
        Ok(())
    }
}
