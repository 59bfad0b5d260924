//! File operations module for Quill
//!
//! This module provides the note document type, discovery of documents
//! under a folder or notebook, and conversions between file paths and
//! `file://` URLs used inside rendered pages.

mod document;

pub use document::{collect_documents, Document};

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use url::Url;

static IMG_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)(<img\b[^>]*?\bsrc\s*=\s*")([^"]*)(")"#).unwrap());
static CSS_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"url\(\s*(['"]?)([^'")]+)(['"]?)\s*\)"#).unwrap());

/// Convert a file path to a `file://` URL.
///
/// Relative paths are made absolute against the current directory.
pub fn path_to_url(path: &Path) -> Option<Url> {
    if path.as_os_str().is_empty() {
        return None;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };

    Url::from_file_path(absolute).ok()
}

/// Resolve a resource reference found in rendered markup to a local file.
///
/// `file://` URLs map to their path, relative references are joined to
/// `base_dir`, and remote, data, and fragment references yield `None`.
pub fn resolve_local_reference(reference: &str, base_dir: &Path) -> Option<PathBuf> {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with('#') || reference.starts_with("//") {
        return None;
    }

    if let Ok(url) = Url::parse(reference) {
        // Single-letter schemes are Windows drive letters, not URLs.
        if url.scheme().len() > 1 {
            return match url.scheme() {
                "file" => url.to_file_path().ok(),
                _ => None,
            };
        }
    }

    let path = reference.split(['?', '#']).next().unwrap_or(reference);
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    let candidate = Path::new(decoded.as_ref());
    if candidate.is_absolute() {
        Some(candidate.to_path_buf())
    } else {
        Some(base_dir.join(candidate))
    }
}

/// Rewrite the `src` of every `<img>` tag.
///
/// `rewrite` receives the current reference and returns its replacement,
/// or `None` to keep it.
pub fn rewrite_image_sources<F>(html: &str, mut rewrite: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    IMG_SRC
        .replace_all(html, |caps: &Captures| match rewrite(&caps[2]) {
            Some(src) => format!("{}{}{}", &caps[1], src, &caps[3]),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Rewrite the reference of every `url()` in a stylesheet.
pub fn rewrite_css_urls<F>(css: &str, mut rewrite: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    CSS_URL
        .replace_all(css, |caps: &Captures| match rewrite(&caps[2]) {
            Some(url) => format!("url({}{}{})", &caps[1], url, &caps[3]),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_image_sources() {
        let html = r#"<p><img alt="a" src="a.png"> <IMG SRC="http://x/b.png"></p>"#;
        let out = rewrite_image_sources(html, |src| {
            (!src.starts_with("http")).then(|| format!("files/{}", src))
        });
        assert_eq!(
            out,
            r#"<p><img alt="a" src="files/a.png"> <IMG SRC="http://x/b.png"></p>"#
        );
    }

    #[test]
    fn test_rewrite_css_urls_keeps_quotes() {
        let css = "a { background: url('bg.png'); } b { src: url(font.woff) }";
        let out = rewrite_css_urls(css, |url| Some(url.to_uppercase()));
        assert_eq!(out, "a { background: url('BG.PNG'); } b { src: url(FONT.WOFF) }");
    }

    #[test]
    fn test_path_to_url_absolute() {
        let base = std::env::temp_dir().join("notes dir").join("a.css");
        let url = path_to_url(&base).unwrap();
        assert_eq!(url.scheme(), "file");
        assert!(url.as_str().ends_with("notes%20dir/a.css"));
    }

    #[test]
    fn test_path_to_url_empty() {
        assert!(path_to_url(Path::new("")).is_none());
    }

    #[test]
    fn test_resolve_relative_reference() {
        let base = Path::new("/notes");
        assert_eq!(
            resolve_local_reference("images/cat%20one.png", base),
            Some(PathBuf::from("/notes/images/cat one.png"))
        );
        assert_eq!(
            resolve_local_reference("a.png?v=2", base),
            Some(PathBuf::from("/notes/a.png"))
        );
    }

    #[test]
    fn test_resolve_file_url_reference() {
        let file = std::env::temp_dir().join("pic.png");
        let url = path_to_url(&file).unwrap();
        assert_eq!(
            resolve_local_reference(url.as_str(), Path::new("/ignored")),
            Some(file)
        );
    }

    #[test]
    fn test_remote_references_are_not_local() {
        let base = Path::new("/notes");
        assert!(resolve_local_reference("https://example.com/a.png", base).is_none());
        assert!(resolve_local_reference("data:image/png;base64,AAAA", base).is_none());
        assert!(resolve_local_reference("//cdn.example.com/a.png", base).is_none());
        assert!(resolve_local_reference("#section", base).is_none());
        assert!(resolve_local_reference("", base).is_none());
    }
}
