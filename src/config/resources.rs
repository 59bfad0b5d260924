//! Resource file lookup
//!
//! Viewer resources are referenced by relative names such as
//! `web/css/globalstyles.css`. A name resolves to the user resource
//! directory when the file exists there and to the application directory
//! otherwise. Text reads fall back to the assets bundled into the binary.

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Assets compiled into the binary, keyed by resource name.
const BUNDLED_ASSETS: &[(&str, &str)] = &[
    (
        "web/markdown-viewer-template.html",
        include_str!("../../assets/web/markdown-viewer-template.html"),
    ),
    (
        "web/export-template.html",
        include_str!("../../assets/web/export-template.html"),
    ),
    (
        "web/css/globalstyles.css",
        include_str!("../../assets/web/css/globalstyles.css"),
    ),
];

/// Look up a bundled asset by resource name.
pub fn bundled_asset(name: &str) -> Option<&'static str> {
    BUNDLED_ASSETS
        .iter()
        .find(|(asset, _)| *asset == name)
        .map(|(_, content)| *content)
}

/// Resolves resource names against the user and application directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocator {
    user_dir: Option<PathBuf>,
    app_dir: PathBuf,
}

impl ResourceLocator {
    pub fn new(user_dir: Option<PathBuf>, app_dir: PathBuf) -> Self {
        Self { user_dir, app_dir }
    }

    /// Application directory next to the running executable.
    pub fn default_app_dir() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolve a resource name to a path.
    ///
    /// Absolute names are returned as-is. The returned path may not exist.
    pub fn resolve(&self, name: &str) -> PathBuf {
        let name_path = Path::new(name);
        if name_path.is_absolute() {
            return name_path.to_path_buf();
        }

        if let Some(user_dir) = &self.user_dir {
            let candidate = user_dir.join(name_path);
            if candidate.exists() {
                return candidate;
            }
        }

        self.app_dir.join(name_path)
    }

    /// Read a resource as text.
    ///
    /// Missing or unreadable files yield the bundled asset of the same name,
    /// or an empty string when there is none.
    pub fn read_text(&self, name: &str) -> String {
        if name.is_empty() {
            return String::new();
        }

        let path = self.resolve(name);
        match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => match bundled_asset(name) {
                Some(content) => {
                    debug!("Using bundled {} ({}: {})", name, path.display(), err);
                    content.to_string()
                }
                None => {
                    debug!("Resource {} unavailable: {}", path.display(), err);
                    String::new()
                }
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
