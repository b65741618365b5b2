//! Image download into local content storage

use std::path::PathBuf;
use std::sync::Arc;

use tokio::fs;
use tracing::debug;

use crate::error::ScrapeError;
use crate::fetcher::Fetcher;

/// Fetches product images and writes them under a local directory.
///
/// Filenames reuse the URL basename, so a URL seen across runs overwrites
/// the earlier file. No dedup.
pub struct ImageDownloader {
    fetcher: Arc<dyn Fetcher>,
    dir: PathBuf,
}

impl ImageDownloader {
    pub fn new(fetcher: Arc<dyn Fetcher>, dir: PathBuf) -> Self {
        Self { fetcher, dir }
    }

    /// Downloads `image_url` and returns the local path as a string.
    pub async fn download(&self, image_url: &str) -> Result<String, ScrapeError> {
        let bytes = self.fetcher.fetch_bytes(image_url).await?;

        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(basename(image_url));
        fs::write(&path, &bytes).await?;

        debug!("saved image {}", path.display());
        Ok(path.to_string_lossy().into_owned())
    }
}

/// Last path segment of the URL, query string stripped.
fn basename(url: &str) -> &str {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("image")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticFetcher;

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch_page(&self, _url: &str) -> Result<String, ScrapeError> {
            unreachable!("images are fetched as bytes")
        }

        async fn fetch_bytes(&self, _url: &str) -> Result<Vec<u8>, ScrapeError> {
            Ok(b"png-bytes".to_vec())
        }
    }

    #[test]
    fn basename_strips_path_and_query() {
        assert_eq!(
            basename("https://cdn.example.com/uploads/scaler.jpg?w=300"),
            "scaler.jpg"
        );
        assert_eq!(basename("https://cdn.example.com/"), "image");
    }

    #[tokio::test]
    async fn download_writes_bytes_under_the_image_dir() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = ImageDownloader::new(Arc::new(StaticFetcher), dir.path().to_path_buf());

        let path = downloader
            .download("https://cdn.example.com/uploads/scaler.jpg")
            .await
            .unwrap();

        assert!(path.ends_with("scaler.jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), b"png-bytes");
    }

    #[tokio::test]
    async fn colliding_filenames_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = ImageDownloader::new(Arc::new(StaticFetcher), dir.path().to_path_buf());

        let first = downloader
            .download("https://a.example.com/scaler.jpg")
            .await
            .unwrap();
        let second = downloader
            .download("https://b.example.com/scaler.jpg")
            .await
            .unwrap();

        assert_eq!(first, second);
    }
}
