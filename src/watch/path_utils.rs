// src/watch/path_utils.rs

//! Path helpers shared by the watcher, the classifier and the module namer.

use std::path::Path;

/// Render a path with forward slashes regardless of platform.
pub fn to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Tries a plain `strip_prefix` first, then retries on canonicalized paths
/// (symlinked temp dirs on macOS report a different prefix). Deleted files
/// cannot be canonicalized, so those only succeed on the first attempt.
///
/// Returns `None` if the path cannot be related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_forward_slashes(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    let path_canon = path.canonicalize().ok()?;
    path_canon
        .strip_prefix(&root_canon)
        .ok()
        .map(to_forward_slashes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_root_prefix() {
        assert_eq!(
            relative_str(Path::new("/proj"), Path::new("/proj/src/a.js")).as_deref(),
            Some("src/a.js")
        );
    }

    #[test]
    fn unrelated_path_is_none() {
        assert_eq!(
            relative_str(Path::new("/proj-that-does-not-exist"), Path::new("/elsewhere/a.js")),
            None
        );
    }
}
