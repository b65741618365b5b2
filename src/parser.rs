//! HTML extraction of product listings from catalog pages

use scraper::{Html, Selector};
use tracing::warn;

use crate::error::ScrapeError;
use crate::images::ImageDownloader;
use crate::models::Product;

/// Site suffix appended to every image alt text; stripped from titles.
const TITLE_SUFFIX: &str = " - Dentalstall India";
const CURRENCY_SYMBOL: char = '₹';

/// Fields pulled out of one product card, before the image is fetched.
struct Listing {
    title: String,
    price: f64,
    image_url: String,
}

/// Extracts product listings from one page of the shop catalog.
///
/// The page structure is a WooCommerce grid: product cards with a lazy
/// thumbnail, the title in the image alt text, and a price box that holds
/// either a plain amount or a struck-through amount plus an `<ins>` sale
/// amount.
pub struct PageParser {
    card: Selector,
    thumbnail_img: Selector,
    price_box: Selector,
    sale_amount: Selector,
    amount: Selector,
}

impl PageParser {
    pub fn new() -> Self {
        Self {
            card: Selector::parse("div.product-inner.clearfix").unwrap(),
            thumbnail_img: Selector::parse("div.mf-product-thumbnail img").unwrap(),
            price_box: Selector::parse("div.mf-product-price-box span.price").unwrap(),
            sale_amount: Selector::parse("ins span.woocommerce-Price-amount.amount").unwrap(),
            amount: Selector::parse("span.woocommerce-Price-amount.amount").unwrap(),
        }
    }

    /// Parses one page of HTML into products, downloading each product's
    /// image and embedding the local path.
    ///
    /// A page without any product cards is not an error: it logs and
    /// yields an empty list so the caller can move on.
    pub async fn parse(
        &self,
        html: &str,
        images: &ImageDownloader,
    ) -> Result<Vec<Product>, ScrapeError> {
        let listings = self.extract(html);

        let mut products = Vec::with_capacity(listings.len());
        for listing in listings {
            let image_path = images.download(&listing.image_url).await?;
            match Product::new(listing.title, listing.price, image_path) {
                Ok(product) => products.push(product),
                Err(e) => warn!("discarding listing: {e}"),
            }
        }
        Ok(products)
    }

    // Synchronous extraction scope: `Html` is not Send, so it must be
    // dropped before any await point.
    fn extract(&self, html: &str) -> Vec<Listing> {
        let document = Html::parse_document(html);
        let mut listings = Vec::new();

        let mut cards = 0usize;
        for card in document.select(&self.card) {
            cards += 1;

            let Some(img) = card.select(&self.thumbnail_img).next() else {
                warn!("product card without thumbnail, skipping");
                continue;
            };
            let Some(image_url) = img
                .value()
                .attr("data-lazy-src")
                .or_else(|| img.value().attr("src"))
            else {
                warn!("thumbnail without image source, skipping");
                continue;
            };
            let Some(alt) = img.value().attr("alt") else {
                warn!("thumbnail without alt text, skipping");
                continue;
            };
            let title = alt.replace(TITLE_SUFFIX, "").trim().to_string();

            let Some(price_box) = card.select(&self.price_box).next() else {
                warn!("product card without price box, skipping");
                continue;
            };
            // Sale price wins over the regular (struck-through) price.
            let amount = price_box
                .select(&self.sale_amount)
                .next()
                .or_else(|| price_box.select(&self.amount).next());
            let Some(amount) = amount else {
                warn!("price box without amount, skipping");
                continue;
            };
            let raw = amount.text().collect::<String>();
            // WooCommerce renders thousands separators ("₹1,399.00").
            let raw = raw.trim().trim_matches(CURRENCY_SYMBOL).replace(',', "");
            let price = match raw.trim().parse::<f64>() {
                Ok(price) => price,
                Err(_) => {
                    warn!("unparsable price {raw:?}, skipping");
                    continue;
                }
            };

            listings.push(Listing {
                title,
                price,
                image_url: image_url.to_string(),
            });
        }

        if cards == 0 {
            warn!("no product cards found on page");
        }
        listings
    }
}

impl Default for PageParser {
    fn default() -> Self {
        Self::new()
    }
}
