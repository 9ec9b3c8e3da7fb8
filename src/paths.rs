use std::path::{Path, PathBuf};
use url::Url;

/// Maps a resolved resource URL to its on-disk location under the mirror's
/// output directory.
///
/// The URL's path component is stripped of leading slashes and joined under
/// `output_dir`, preserving the nested directory structure the remote path
/// implies. Query strings and fragments are discarded from the path only;
/// the fetch itself still uses the full URL.
pub fn local_path(url: &Url, output_dir: &Path) -> PathBuf {
    output_dir.join(relative_reference(url))
}

/// The resource URL's path relative to the mirror root.
///
/// Pure function of the URL: identical URLs always map to identical
/// references, which keeps the rewritten markup and the on-disk tree
/// consistent with each other.
pub fn relative_reference(url: &Url) -> String {
    url.path().trim_start_matches('/').to_string()
}

/// The reference written into a page saved `page_dir_depth` directories
/// below the mirror root: one `../` per directory, then the root-relative
/// path. Depth 0 is the root page itself.
pub fn relative_reference_from(url: &Url, page_dir_depth: usize) -> String {
    let mut reference = String::new();
    for _ in 0..page_dir_depth {
        reference.push_str("../");
    }
    reference.push_str(url.path().trim_start_matches('/'));
    reference
}

/// Number of directories between a saved page file and the mirror root,
/// i.e. how far that page's references must climb to reach root-relative
/// resources.
pub fn page_dir_depth(page_file: &Path, output_dir: &Path) -> usize {
    page_file
        .strip_prefix(output_dir)
        .ok()
        .map(|rel| rel.components().count().saturating_sub(1))
        .unwrap_or(0)
}

/// Maps a page URL to the file its rendered markup is written to.
///
/// The session's start page always lands at `output_dir/index.html`. Pages
/// reached through recursion are written at their URL path, with
/// `index.html` appended when the path names a directory rather than a file
/// (empty path, trailing slash, or no file extension).
pub fn page_path(url: &Url, output_dir: &Path, is_start: bool) -> PathBuf {
    if is_start {
        return output_dir.join("index.html");
    }

    let rel = relative_reference(url);
    if rel.is_empty() {
        return output_dir.join("index.html");
    }

    if rel.ends_with('/') {
        return output_dir.join(rel).join("index.html");
    }

    let last_segment = rel.rsplit('/').next().unwrap_or(&rel);
    if last_segment.contains('.') {
        output_dir.join(rel)
    } else {
        output_dir.join(rel).join("index.html")
    }
}
