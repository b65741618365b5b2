//! Data models for scraping settings and product listings

use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;

/// Per-request scraping settings, deserialized from the endpoint's JSON body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapingSettings {
    /// Number of catalog pages to crawl; `None` means unbounded.
    pub page_limit: Option<u32>,
    /// Optional proxy URL routed through for every request of the run.
    pub proxy: Option<String>,
    /// Optional notification recipient; selects the email notifier when set.
    pub email: Option<String>,
}

impl ScrapingSettings {
    pub fn validate(&self) -> Result<(), ScrapeError> {
        if self.page_limit == Some(0) {
            return Err(ScrapeError::Validation(
                "page_limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// A product listing extracted from one catalog page.
///
/// Field names follow Rust conventions; the serde renames match the
/// flat-file keys and the relational column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "product_title")]
    pub title: String,
    #[serde(rename = "product_price")]
    pub price: f64,
    #[serde(rename = "path_to_image")]
    pub image_path: String,
}

impl Product {
    /// Validating constructor; the only way the rest of the crate builds one.
    pub fn new(title: String, price: f64, image_path: String) -> Result<Self, ScrapeError> {
        if title.trim().is_empty() {
            return Err(ScrapeError::Validation(
                "product_title must be non-empty".to_string(),
            ));
        }
        if price < 0.0 {
            return Err(ScrapeError::Validation(
                "product_price must be non-negative".to_string(),
            ));
        }
        Ok(Self {
            title,
            price,
            image_path,
        })
    }
}
