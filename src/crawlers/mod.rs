pub mod browser;
pub mod fetcher;
pub mod session;

pub use browser::{BrowserSession, Renderer};
pub use fetcher::{FetchedResource, HttpFetcher, ResourceFetcher};
pub use session::{CrawlSession, MirrorStatus};
