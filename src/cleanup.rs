use crate::crawlers::session::ABORT_MARKER;
use crate::error::MirrorError;
use std::fs;
use std::path::Path;

/// Deletes mirror directories that are incomplete or aborted.
///
/// A mirror is deletion-eligible when it lacks the `tokenInfo/` subtree,
/// lacks `index.html`, or contains the abort marker. Returns the number of
/// directories removed.
pub fn clean(base_dir: &Path) -> Result<usize, MirrorError> {
    if !base_dir.exists() {
        ::log::warn!("Cleanup directory does not exist: {}", base_dir.display());
        return Ok(0);
    }

    let mut removed = 0;
    let entries =
        fs::read_dir(base_dir).map_err(|e| MirrorError::io(base_dir.to_path_buf(), e))?;

    for entry in entries {
        let entry = entry.map_err(|e| MirrorError::io(base_dir.to_path_buf(), e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| MirrorError::io(entry.path(), e))?;
        if !file_type.is_dir() {
            continue;
        }

        let dir = entry.path();
        let missing_token_info = !dir.join("tokenInfo").exists();
        let missing_index = !dir.join("index.html").exists();
        let has_abort_marker = dir.join(ABORT_MARKER).exists();

        if missing_token_info || missing_index || has_abort_marker {
            fs::remove_dir_all(&dir).map_err(|e| MirrorError::io(dir.clone(), e))?;
            ::log::info!("Deleted invalid mirror: {}", dir.display());
            removed += 1;
        }
    }

    ::log::info!("Cleanup completed, removed {} directories", removed);
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_mirror(base: &Path, name: &str, index: bool, token_info: bool, error: bool) {
        let dir = base.join(name);
        fs::create_dir_all(&dir).unwrap();
        if index {
            fs::write(dir.join("index.html"), "<html></html>").unwrap();
        }
        if token_info {
            fs::create_dir_all(dir.join("tokenInfo")).unwrap();
        }
        if error {
            fs::write(dir.join(ABORT_MARKER), "Too many resources to download.").unwrap();
        }
    }

    #[test]
    fn test_valid_mirror_is_kept() {
        let base = TempDir::new().unwrap();
        make_mirror(base.path(), "good.example", true, true, false);
        assert_eq!(clean(base.path()).unwrap(), 0);
        assert!(base.path().join("good.example").exists());
    }

    #[test]
    fn test_missing_index_is_removed() {
        let base = TempDir::new().unwrap();
        make_mirror(base.path(), "noindex.example", false, true, false);
        assert_eq!(clean(base.path()).unwrap(), 1);
        assert!(!base.path().join("noindex.example").exists());
    }

    #[test]
    fn test_missing_token_info_is_removed() {
        let base = TempDir::new().unwrap();
        make_mirror(base.path(), "bare.example", true, false, false);
        assert_eq!(clean(base.path()).unwrap(), 1);
    }

    #[test]
    fn test_aborted_mirror_is_removed() {
        let base = TempDir::new().unwrap();
        make_mirror(base.path(), "aborted.example", true, true, true);
        assert_eq!(clean(base.path()).unwrap(), 1);
    }

    #[test]
    fn test_missing_base_dir_is_a_noop() {
        let base = TempDir::new().unwrap();
        let gone = base.path().join("nope");
        assert_eq!(clean(&gone).unwrap(), 0);
    }

    #[test]
    fn test_plain_files_are_ignored() {
        let base = TempDir::new().unwrap();
        fs::write(base.path().join("stray.txt"), "x").unwrap();
        assert_eq!(clean(base.path()).unwrap(), 0);
        assert!(base.path().join("stray.txt").exists());
    }
}
