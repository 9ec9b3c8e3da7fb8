use crate::paths;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// Extensions treated as downloadable static assets
static ASSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(js|css|jpg|jpeg|png|gif|svg|ico|woff|woff2|ttf|otf|eot)$")
        .expect("asset extension pattern is valid")
});

/// A single resource reference discovered in a page
#[derive(Debug, Clone)]
pub struct ResourceRef {
    /// Attribute the reference was read from (`src` or `href`)
    pub attr: &'static str,
    /// Attribute value exactly as it appears in the markup
    pub raw: String,
    /// The value resolved against the page URL
    pub resolved: Url,
}

/// References extracted from one rendered page
#[derive(Debug, Default)]
pub struct PageRefs {
    /// Embedded resource references, in document order
    pub resources: Vec<ResourceRef>,
    /// Anchor targets resolved against the page URL, in document order
    pub links: Vec<Url>,
}

/// Extracts resource and link references from rendered markup.
///
/// Resources are the `src`/`href` attributes of `img`, `script`, stylesheet,
/// icon and preload `link` elements. Links are anchor `href`s; fragment-only
/// anchors are skipped. Every candidate is resolved against `base_url`
/// before classification, and unresolvable values are dropped.
pub fn extract(html: &str, base_url: &Url) -> PageRefs {
    let doc = Html::parse_document(html);

    let resource_selector = Selector::parse(
        r#"img, script, link[rel="stylesheet"], link[rel="icon"], link[rel="preload"]"#,
    )
    .expect("resource selector is valid");
    let anchor_selector = Selector::parse("a").expect("anchor selector is valid");

    let mut refs = PageRefs::default();

    for element in doc.select(&resource_selector) {
        let (attr, raw) = match element.value().attr("src") {
            Some(src) => ("src", src),
            None => match element.value().attr("href") {
                Some(href) => ("href", href),
                None => continue,
            },
        };
        if raw.is_empty() {
            continue;
        }
        match base_url.join(raw) {
            Ok(resolved) => refs.resources.push(ResourceRef {
                attr,
                raw: raw.to_string(),
                resolved,
            }),
            Err(e) => {
                ::log::debug!("Skipping unresolvable resource reference {}: {}", raw, e);
            }
        }
    }

    for element in doc.select(&anchor_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if href.is_empty() || href.starts_with('#') {
            continue;
        }
        match base_url.join(href) {
            Ok(resolved) => refs.links.push(resolved),
            Err(e) => {
                ::log::debug!("Skipping unresolvable link {}: {}", href, e);
            }
        }
    }

    ::log::debug!(
        "Extracted {} resource refs and {} links from {}",
        refs.resources.len(),
        refs.links.len(),
        base_url
    );

    refs
}

/// Rewrites each resource attribute in `html` to the reference its resolved
/// URL maps to from a page saved `page_dir_depth` directories below the
/// mirror root, so the persisted markup resolves locally wherever the page
/// lands in the tree.
///
/// Anchors are not extracted for rewriting, so cross-origin links stay
/// absolute. Replacement is textual over `attr="value"` pairs, though: an
/// anchor whose `href` is byte-identical to a resource element's raw value
/// is rewritten along with it, and its relative target still resolves
/// within the mirror.
pub fn rewrite(html: &str, refs: &PageRefs, page_dir_depth: usize) -> String {
    let mut rewritten = html.to_string();

    for resource in &refs.resources {
        let replacement = paths::relative_reference_from(&resource.resolved, page_dir_depth);
        if replacement.is_empty() || replacement == resource.raw {
            continue;
        }
        for quote in ['"', '\''] {
            let from = format!("{}={q}{}{q}", resource.attr, resource.raw, q = quote);
            let to = format!("{}={q}{}{q}", resource.attr, replacement, q = quote);
            rewritten = rewritten.replace(&from, &to);
        }
    }

    rewritten
}

/// Returns true when the URL path carries a known static-asset extension
pub fn is_static_asset(url: &Url) -> bool {
    ASSET_RE.is_match(url.path())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn test_extract_resources_and_links() {
        let html = r#"<html><head>
            <link rel="stylesheet" href="/s.css">
            <link rel="icon" href="/favicon.ico">
            <script src="/app.js"></script>
        </head><body>
            <img src="/a.png">
            <a href="/about">About</a>
            <a href="https://other.org/page">Other</a>
        </body></html>"#;

        let refs = extract(html, &base());

        let resolved: Vec<&str> = refs.resources.iter().map(|r| r.resolved.as_str()).collect();
        assert_eq!(
            resolved,
            vec![
                "https://example.com/s.css",
                "https://example.com/favicon.ico",
                "https://example.com/app.js",
                "https://example.com/a.png",
            ]
        );

        let links: Vec<&str> = refs.links.iter().map(|l| l.as_str()).collect();
        assert_eq!(
            links,
            vec!["https://example.com/about", "https://other.org/page"]
        );
    }

    #[test]
    fn test_fragment_links_are_excluded() {
        let html = r##"<body><a href="#top">Top</a><a href="/real">Real</a></body>"##;
        let refs = extract(html, &base());
        assert_eq!(refs.links.len(), 1);
        assert_eq!(refs.links[0].as_str(), "https://example.com/real");
    }

    #[test]
    fn test_rewrite_resource_attributes() {
        let html = r#"<img src="/a.png"><link rel="stylesheet" href="/s.css">"#;
        let refs = extract(html, &base());
        let rewritten = rewrite(html, &refs, 0);
        assert!(rewritten.contains(r#"src="a.png""#));
        assert!(rewritten.contains(r#"href="s.css""#));
    }

    #[test]
    fn test_rewrite_climbs_from_nested_pages() {
        let html = r#"<img src="/a.png">"#;
        let refs = extract(html, &Url::parse("https://example.com/about").unwrap());
        let rewritten = rewrite(html, &refs, 1);
        assert!(rewritten.contains(r#"src="../a.png""#));
    }

    #[test]
    fn test_rewrite_leaves_anchors_unchanged() {
        let html = r#"<a href="https://other.org/page">x</a><img src="/a.png">"#;
        let refs = extract(html, &base());
        let rewritten = rewrite(html, &refs, 0);
        assert!(rewritten.contains(r#"href="https://other.org/page""#));
    }

    #[test]
    fn test_anchor_sharing_a_resource_value_is_rewritten_with_it() {
        // Textual replacement cannot tell these two hrefs apart; the anchor
        // follows the stylesheet and still resolves inside the mirror.
        let html = r#"<link rel="stylesheet" href="/s.css"><a href="/s.css">css</a>"#;
        let refs = extract(html, &base());
        let rewritten = rewrite(html, &refs, 0);
        assert_eq!(rewritten.matches(r#"href="s.css""#).count(), 2);
    }

    #[test]
    fn test_static_asset_classification() {
        let asset = Url::parse("https://example.com/f/app.woff2").unwrap();
        let page = Url::parse("https://example.com/about").unwrap();
        let queried = Url::parse("https://example.com/site.css?v=2").unwrap();
        assert!(is_static_asset(&asset));
        assert!(!is_static_asset(&page));
        assert!(is_static_asset(&queried));
    }
}
