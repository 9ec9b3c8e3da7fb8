use crate::crawlers::browser::Renderer;
use crate::crawlers::fetcher::ResourceFetcher;
use crate::error::MirrorError;
use crate::{markup, paths};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Marker file written into the mirror directory when the abort policy
/// triggers; its presence makes the mirror deletion-eligible for cleanup
pub const ABORT_MARKER: &str = "error.txt";

/// Outcome of one mirror job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorStatus {
    /// The full same-origin reachable set was processed
    Completed,
    /// The resource-count abort policy triggered; `error.txt` was written
    Aborted,
    /// The output directory was already populated, nothing was fetched
    Skipped,
}

/// The traversal boundary for recursive link-following
#[derive(Debug, Clone, PartialEq, Eq)]
struct Origin {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl Origin {
    fn of(url: &Url) -> Result<Self, MirrorError> {
        let host = url
            .host_str()
            .ok_or_else(|| MirrorError::Config(format!("start URL has no host: {url}")))?
            .to_string();
        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            port: url.port(),
        })
    }

    fn contains(&self, url: &Url) -> bool {
        url.scheme() == self.scheme
            && url.host_str() == Some(self.host.as_str())
            && url.port() == self.port
    }
}

/// One site-mirror job: owns the visited set, the output directory, the
/// origin boundary and the abort policy. The renderer and fetcher are
/// borrowed so the caller keeps control of their lifecycle on every exit
/// path.
pub struct CrawlSession<'a, R, F> {
    start_url: Url,
    origin: Origin,
    output_dir: PathBuf,
    resource_limit: usize,
    visited: HashSet<Url>,
    downloaded: HashSet<Url>,
    renderer: &'a mut R,
    fetcher: &'a F,
}

impl<'a, R: Renderer, F: ResourceFetcher> CrawlSession<'a, R, F> {
    pub fn new(
        start_url: Url,
        output_dir: PathBuf,
        resource_limit: usize,
        renderer: &'a mut R,
        fetcher: &'a F,
    ) -> Result<Self, MirrorError> {
        let origin = Origin::of(&start_url)?;
        Ok(Self {
            start_url,
            origin,
            output_dir,
            resource_limit,
            visited: HashSet::new(),
            downloaded: HashSet::new(),
            renderer,
            fetcher,
        })
    }

    /// Runs the crawl to completion or abort.
    ///
    /// Traversal is an explicit worklist stack rather than call-stack
    /// recursion, preserving depth-first order in the order references
    /// appear in the markup: within one page every static resource is
    /// fetched before any recursion into its links.
    pub async fn run(mut self) -> Result<MirrorStatus, MirrorError> {
        let mut stack = vec![self.start_url.clone()];

        while let Some(url) = stack.pop() {
            if !self.visited.insert(url.clone()) {
                continue;
            }

            let html = match self.renderer.render(&url).await {
                Ok(html) => html,
                Err(e) => {
                    // Transient page failure: log and move on to the next URL
                    ::log::error!("Failed to render {}: {}", url, e);
                    continue;
                }
            };

            let refs = markup::extract(&html, &url);
            let assets: Vec<_> = refs
                .resources
                .iter()
                .filter(|r| markup::is_static_asset(&r.resolved))
                .collect();

            if assets.len() > self.resource_limit {
                ::log::warn!(
                    "{} exposes {} static resources (limit {}), aborting mirror",
                    url,
                    assets.len(),
                    self.resource_limit
                );
                self.write_abort_marker()?;
                return Ok(MirrorStatus::Aborted);
            }

            let page_file = paths::page_path(&url, &self.output_dir, url == self.start_url);
            let depth = paths::page_dir_depth(&page_file, &self.output_dir);
            let rewritten = markup::rewrite(&html, &refs, depth);
            write_file(&page_file, rewritten.as_bytes())?;
            ::log::info!("Saved page {} as {}", url, page_file.display());

            // Static resources first, in discovery order. Resources that
            // turn out to be HTML are queued for page processing instead.
            let mut html_resources = Vec::new();
            for asset in assets {
                if !self.downloaded.insert(asset.resolved.clone()) {
                    continue;
                }
                match self.fetch_resource(&asset.resolved).await {
                    Ok(Some(page_url)) => html_resources.push(page_url),
                    Ok(None) => {}
                    Err(e) => {
                        // Best effort: one missing asset must not sacrifice
                        // the rest of the mirror
                        ::log::error!("Failed to download {}: {}", asset.resolved, e);
                    }
                }
            }

            // Stack discipline: the last push pops first, so links go on
            // before HTML-typed resources and each group is reversed.
            for link in refs.links.iter().rev() {
                let mut link = link.clone();
                link.set_fragment(None);
                if self.origin.contains(&link) && !self.visited.contains(&link) {
                    stack.push(link);
                }
            }
            for page_url in html_resources.into_iter().rev() {
                stack.push(page_url);
            }
        }

        Ok(MirrorStatus::Completed)
    }

    /// Downloads a single static resource. Returns the URL back when the
    /// response declares HTML, signalling delegation to the page path.
    async fn fetch_resource(&self, url: &Url) -> Result<Option<Url>, MirrorError> {
        let resource = self.fetcher.fetch(url).await?;

        if resource.is_html() {
            ::log::debug!("Resource {} is HTML, delegating to page processing", url);
            return Ok(Some(url.clone()));
        }

        let path = paths::local_path(url, &self.output_dir);
        write_file(&path, &resource.body)?;
        ::log::info!("Downloaded {} as {}", url, path.display());
        Ok(None)
    }

    fn write_abort_marker(&self) -> Result<(), MirrorError> {
        write_file(
            &self.output_dir.join(ABORT_MARKER),
            b"Too many resources to download.",
        )
    }
}

/// Writes a file, creating intermediate directories as needed
fn write_file(path: &Path, contents: &[u8]) -> Result<(), MirrorError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| MirrorError::io(parent.to_path_buf(), e))?;
    }
    fs::write(path, contents).map_err(|e| MirrorError::io(path.to_path_buf(), e))
}
