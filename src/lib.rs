// Re-export modules
pub mod cleanup;
pub mod config;
pub mod crawlers;
pub mod error;
pub mod feed;
pub mod markup;
pub mod paths;
pub mod safety;
pub mod token_info;
pub mod watch;

// Re-export commonly used types for convenience
pub use config::MirrorConfig;
pub use crawlers::MirrorStatus;
pub use error::MirrorError;

use crawlers::{BrowserSession, CrawlSession, HttpFetcher};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Builder for a single site-mirror job
pub struct Mirror {
    start_url: String,
    config: MirrorConfig,
    output_dir: Option<PathBuf>,
}

impl Mirror {
    /// Create a new mirror job for the given start URL
    pub fn new(start_url: &str) -> Self {
        Self {
            start_url: start_url.to_string(),
            config: MirrorConfig::default(),
            output_dir: None,
        }
    }

    /// Apply a full configuration
    pub fn with_config(mut self, config: MirrorConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the output directory (default: `<output_base_dir>/<host>`)
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    /// Override the WebDriver endpoint
    pub fn with_webdriver_url(mut self, webdriver_url: &str) -> Self {
        self.config.webdriver_url = webdriver_url.to_string();
        self
    }

    /// Override the per-page static-resource ceiling
    pub fn with_resource_limit(mut self, resource_limit: usize) -> Self {
        self.config.resource_limit = resource_limit;
        self
    }

    /// Runs the mirror job.
    ///
    /// An already-populated output directory skips the crawl entirely, so a
    /// re-run for the same site performs no network requests. The browser
    /// session is released on every exit path, abort included.
    pub async fn run(self) -> Result<MirrorStatus, MirrorError> {
        let start_url = Url::parse(&self.start_url)?;
        let host = start_url
            .host_str()
            .ok_or_else(|| MirrorError::Config(format!("start URL has no host: {}", start_url)))?;

        let output_dir = match self.output_dir {
            Some(dir) => dir,
            None => Path::new(&self.config.output_base_dir).join(host),
        };

        if dir_is_populated(&output_dir) {
            ::log::info!(
                "Output directory {} already exists and is not empty, skipping mirror",
                output_dir.display()
            );
            return Ok(MirrorStatus::Skipped);
        }

        ::log::info!("Starting mirror of {} into {}", start_url, output_dir.display());

        // Fetcher first: once the browser session exists, every return path
        // below must go through close()
        let fetcher = HttpFetcher::new(&self.config.user_agent)?;
        let mut browser =
            BrowserSession::launch(&self.config.webdriver_url, &self.config.user_agent).await?;

        let result = match CrawlSession::new(
            start_url,
            output_dir,
            self.config.resource_limit,
            &mut browser,
            &fetcher,
        ) {
            Ok(session) => session.run().await,
            Err(e) => Err(e),
        };

        browser.close().await;
        result
    }
}

fn dir_is_populated(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dir_is_populated() {
        let dir = TempDir::new().unwrap();
        assert!(!dir_is_populated(dir.path()));
        assert!(!dir_is_populated(&dir.path().join("missing")));

        fs::write(dir.path().join("index.html"), "x").unwrap();
        assert!(dir_is_populated(dir.path()));
    }

    #[tokio::test]
    async fn test_populated_output_dir_skips_mirror() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        // No WebDriver is running here; a skip must not try to connect.
        let status = Mirror::new("https://example.com/")
            .with_output_dir(dir.path())
            .run()
            .await
            .unwrap();

        assert_eq!(status, MirrorStatus::Skipped);
        let index = fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert_eq!(index, "<html></html>");
    }

    #[tokio::test]
    async fn test_unreachable_webdriver_surfaces_error() {
        let dir = TempDir::new().unwrap();

        // Nothing listens on the discard port; the launch failure must
        // propagate without having written anything into the mirror
        let result = Mirror::new("https://example.com/")
            .with_output_dir(dir.path())
            .with_webdriver_url("http://127.0.0.1:9")
            .run()
            .await;

        assert!(matches!(result, Err(MirrorError::Session(_))));
        assert!(!dir_is_populated(dir.path()));
    }
}
