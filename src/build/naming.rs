// src/build/naming.rs

//! Canonical module names as the bundler knows them.

use std::path::{Path, PathBuf};

use crate::watch::path_utils::to_forward_slashes;

/// Derive the bundler module name for `path` relative to `base_dir`.
///
/// Both paths are made absolute, `base_dir` is stripped, separators become
/// `/` and any leading `/` is dropped. HTML and CSS assets get the loader
/// suffix the bundler needs (`!text` / `!css`). A path outside `base_dir` is
/// passed through as-is (still normalized).
pub fn module_name(path: &Path, base_dir: &Path) -> String {
    let abs_path = absolute(path);
    let abs_base = absolute(base_dir);

    let rel = abs_path.strip_prefix(&abs_base).unwrap_or(&abs_path);
    let name = to_forward_slashes(rel);
    let name = name.trim_start_matches('/');

    match loader_suffix(name) {
        Some(suffix) => format!("{name}{suffix}"),
        None => name.to_string(),
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn loader_suffix(name: &str) -> Option<&'static str> {
    if name.ends_with(".html") {
        Some("!text")
    } else if name.ends_with(".css") {
        Some("!css")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_base_and_leading_slash() {
        assert_eq!(
            module_name(Path::new("/proj/src/widgets/button.js"), Path::new("/proj/src")),
            "widgets/button.js"
        );
    }

    #[test]
    fn adds_loader_suffixes() {
        let base = Path::new("/proj/src");
        assert_eq!(
            module_name(Path::new("/proj/src/views/list.html"), base),
            "views/list.html!text"
        );
        assert_eq!(
            module_name(Path::new("/proj/src/styles/main.css"), base),
            "styles/main.css!css"
        );
        assert_eq!(module_name(Path::new("/proj/src/main.js"), base), "main.js");
    }

    #[test]
    fn outside_base_passes_through() {
        assert_eq!(
            module_name(Path::new("/other/lib.js"), Path::new("/proj/src")),
            "other/lib.js"
        );
    }

    #[test]
    fn relative_paths_resolve_against_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(
            module_name(Path::new("src/a.js"), &cwd),
            "src/a.js"
        );
    }

    #[test]
    fn naming_is_idempotent() {
        let p = Path::new("/proj/test/foo.spec.js");
        let base = Path::new("/proj/test");
        assert_eq!(module_name(p, base), module_name(p, base));
    }
}
