use crate::error::MirrorError;
use fantoccini::{Client, ClientBuilder};
use serde_json::{Map, json};
use std::time::Duration;
use url::Url;

/// How long the in-flight network activity must stay flat before a page is
/// considered fully rendered
const STABILIZATION_WINDOW: Duration = Duration::from_millis(500);

/// Upper bound on stabilization polls per navigation
const MAX_QUIESCENCE_POLLS: u32 = 10;

/// Rendering capability used by the crawl session.
///
/// The session only needs "navigate and give me the rendered markup", so the
/// browser is injected behind this seam and tests drive the traversal with
/// canned pages instead of a live WebDriver.
pub trait Renderer {
    fn render(
        &mut self,
        url: &Url,
    ) -> impl std::future::Future<Output = Result<String, MirrorError>>;
}

/// One WebDriver-backed browser session, held for the duration of a single
/// crawl job.
pub struct BrowserSession {
    client: Client,
}

impl BrowserSession {
    /// Connects to the WebDriver endpoint and configures a page context.
    ///
    /// Sandboxing is disabled for containerized execution, a realistic
    /// desktop user agent is presented, and cross-origin restrictions are
    /// relaxed so third-party-embedded assets render for static mirroring.
    pub async fn launch(webdriver_url: &str, user_agent: &str) -> Result<Self, MirrorError> {
        let mut caps = Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": [
                    "--headless=new",
                    "--no-sandbox",
                    "--disable-setuid-sandbox",
                    "--disable-dev-shm-usage",
                    "--disable-web-security",
                    format!("--user-agent={}", user_agent),
                ]
            }),
        );
        caps.insert("acceptInsecureCerts".to_string(), json!(true));

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(webdriver_url)
            .await?;

        ::log::debug!("Connected to WebDriver at {}", webdriver_url);
        Ok(Self { client })
    }

    /// Releases the WebDriver session. Called on every exit path of a crawl
    /// job, success or abort.
    pub async fn close(self) {
        if let Err(e) = self.client.close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }
    }

    /// Waits until no new network activity has been observed for one
    /// stabilization window, so client-side-rendered content has settled
    /// before the markup is read.
    async fn wait_for_quiescence(&mut self) -> Result<(), MirrorError> {
        let mut last_count = -1i64;
        for _ in 0..MAX_QUIESCENCE_POLLS {
            let value = self
                .client
                .execute(
                    "return performance.getEntriesByType('resource').length;",
                    vec![],
                )
                .await?;
            let count = value.as_i64().unwrap_or(0);
            if count == last_count {
                return Ok(());
            }
            last_count = count;
            tokio::time::sleep(STABILIZATION_WINDOW).await;
        }
        ::log::debug!("Network never went quiescent, proceeding with current markup");
        Ok(())
    }
}

impl Renderer for BrowserSession {
    async fn render(&mut self, url: &Url) -> Result<String, MirrorError> {
        self.client.goto(url.as_str()).await?;
        self.wait_for_quiescence().await?;
        let source = self.client.source().await?;
        Ok(source)
    }
}
