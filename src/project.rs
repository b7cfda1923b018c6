// src/project.rs

//! Project layout as described by `package.json`.
//!
//! The bundler's dependency-configuration file, the source base directory and
//! the installed-packages directory all come from the `jspm` section:
//!
//! ```json
//! {
//!   "jspm": {
//!     "directories": { "baseURL": "public", "packages": "public/jspm_packages" },
//!     "configFile": "public/config.js"
//!   }
//! }
//! ```
//!
//! Every entry is optional. `packages` defaults to `<baseURL>/jspm_packages`
//! and `configFile` to `<baseURL>/config.js`; all paths are relative to the
//! directory holding `package.json`.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::errors::Result;
use crate::fs::FileSystem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    /// Dependency-resolution configuration file (absolute).
    pub config_file: PathBuf,
    /// Source base directory (absolute).
    pub base_dir: PathBuf,
    /// Installed-packages directory (absolute).
    pub packages_dir: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct PackageJson {
    #[serde(default)]
    jspm: Option<JspmSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JspmSection {
    #[serde(default)]
    directories: Directories,
    #[serde(default)]
    config_file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Directories {
    #[serde(default, rename = "baseURL")]
    base_url: Option<String>,
    #[serde(default)]
    packages: Option<String>,
}

impl ProjectLayout {
    /// Layout used when `package.json` is absent or has no `jspm` section.
    pub fn defaults(root: &Path) -> Self {
        Self::from_section(root, &JspmSection::default())
    }

    /// Read the layout from `package_json`.
    ///
    /// A missing file is not an error; malformed JSON is.
    pub fn load(fs: &dyn FileSystem, package_json: &Path) -> Result<Self> {
        let root = package_json
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        if !fs.exists(package_json) {
            debug!(path = ?package_json, "no package.json; using default project layout");
            return Ok(Self::defaults(&root));
        }

        let contents = fs.read_to_string(package_json)?;
        let parsed: PackageJson = serde_json::from_str(&contents)?;
        let layout = Self::from_section(&root, &parsed.jspm.unwrap_or_default());
        debug!(?layout, "loaded project layout");
        Ok(layout)
    }

    fn from_section(root: &Path, jspm: &JspmSection) -> Self {
        let base_url = jspm.directories.base_url.as_deref().unwrap_or(".");
        let base_dir = join_clean(root, base_url);

        let packages_dir = match &jspm.directories.packages {
            Some(p) => join_clean(root, p),
            None => base_dir.join("jspm_packages"),
        };

        let config_file = match &jspm.config_file {
            Some(p) => join_clean(root, p),
            None => base_dir.join("config.js"),
        };

        Self {
            config_file,
            base_dir,
            packages_dir,
        }
    }
}

/// Join `rel` onto `root`, dropping `.` components so equality checks against
/// watcher paths line up.
fn join_clean(root: &Path, rel: &str) -> PathBuf {
    let mut out = root.to_path_buf();
    for part in Path::new(rel).components() {
        match part {
            std::path::Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}
