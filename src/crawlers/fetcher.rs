use crate::error::MirrorError;
use reqwest::header::CONTENT_TYPE;
use url::Url;

/// A fetched resource body with its declared content type
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub content_type: String,
    pub body: Vec<u8>,
}

impl FetchedResource {
    /// Resource links can resolve to HTML documents, e.g. a redirected
    /// stylesheet URL. Those are handed back to the page-recursion path
    /// instead of being written as binary assets.
    pub fn is_html(&self) -> bool {
        self.content_type.contains("text/html")
    }
}

/// Retrieval capability for static resources, injected into the crawl
/// session so tests can serve canned bodies.
pub trait ResourceFetcher {
    fn fetch(
        &self,
        url: &Url,
    ) -> impl std::future::Future<Output = Result<FetchedResource, MirrorError>>;
}

/// reqwest-backed fetcher presenting the same user agent as the browser
/// session
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self, MirrorError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self { client })
    }
}

impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedResource, MirrorError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::FetchStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.bytes().await?.to_vec();

        Ok(FetchedResource { content_type, body })
    }
}
