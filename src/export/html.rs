//! HTML Export Writer
//!
//! Serializes the head, style and body fragments extracted from the engine
//! into an HTML file. Resources referenced by the fragments are either
//! embedded as data URIs or copied into a `<basename>_files` folder next to
//! the output file.

use super::{ExportError, ExportHtmlOption};
use crate::engine::ExtractedContent;
use crate::files::{resolve_local_reference, rewrite_css_urls, rewrite_image_sources};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::{debug, warn};
use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const HEAD_TITLE_PLACEHOLDER: &str = "<!-- VX_HEAD_TITLE_PLACEHOLDER -->";
pub const STYLE_PLACEHOLDER: &str = "/* VX_STYLE_PLACEHOLDER */";
pub const HEAD_PLACEHOLDER: &str = "<!-- VX_HEAD_PLACEHOLDER -->";
pub const BODY_PLACEHOLDER: &str = "<!-- VX_BODY_PLACEHOLDER -->";

/// Suffix of the generated page title.
const TITLE_SUFFIX: &str = " - Quill";

/// Characters escaped in relocated resource names.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?');

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h([1-6])\b[^>]*>(.*?)</h[1-6]>").unwrap());
static ID_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\bid\s*=\s*"([^"]+)""#).unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

// ─────────────────────────────────────────────────────────────────────────────
// HTML Writer
// ─────────────────────────────────────────────────────────────────────────────

/// Writes extracted content into the export wrapper page.
pub struct HtmlWriter {
    page_template: String,
}

impl HtmlWriter {
    pub fn new(page_template: impl Into<String>) -> Self {
        Self {
            page_template: page_template.into(),
        }
    }

    /// Write `content` to `output_path`.
    ///
    /// The parent directory must exist. Returns the path of the written file.
    pub fn write(
        &self,
        output_path: &Path,
        content: &ExtractedContent,
        option: &ExportHtmlOption,
    ) -> Result<PathBuf, ExportError> {
        let parent = output_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        if !parent.is_dir() {
            return Err(ExportError::io(
                parent,
                io::Error::new(io::ErrorKind::NotFound, "output directory does not exist"),
            ));
        }

        let basename = output_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string());
        let mut resources = ResourceFolder::new(parent, &basename);

        if option.complete_page || !option.embed_styles {
            resources.create()?;
        }

        let result = self.write_page(output_path, &basename, content, option, &mut resources);
        if result.is_err() {
            resources.discard();
        }
        resources.remove_if_empty();
        result.map(|()| output_path.to_path_buf())
    }

    fn write_page(
        &self,
        output_path: &Path,
        basename: &str,
        content: &ExtractedContent,
        option: &ExportHtmlOption,
        resources: &mut ResourceFolder,
    ) -> Result<(), ExportError> {
        let mut head = content.head.clone();
        let mut style = String::new();

        if !content.style.trim().is_empty() {
            if option.embed_styles {
                style = embed_css_urls(&content.style);
            } else {
                let css = rewrite_css_urls(&content.style, |reference| {
                    let path = resolve_local_reference(reference, &resources.dir)?;
                    resources.copy_in(&path).map(|name| encode_segment(&name))
                });
                let sheet = format!("{}.css", basename);
                resources.write_file(&sheet, &css)?;
                if !head.is_empty() {
                    head.push('\n');
                }
                head.push_str(&format!(
                    "<link rel=\"stylesheet\" type=\"text/css\" href=\"{}\">",
                    resources.href(&sheet)
                ));
            }
        }

        let mut body = content.body.clone();
        if option.complete_page {
            let base_dir = resources.parent.clone();
            body = rewrite_image_sources(&body, |src| {
                let path = resolve_local_reference(src, &base_dir)?;
                if option.embed_images {
                    data_uri(&path)
                } else {
                    resources.copy_in(&path).map(|name| resources.href(&name))
                }
            });

            if option.add_outline_panel {
                let outline = build_outline(&body);
                if !outline.is_empty() {
                    body = format!("{}\n{}", outline, body);
                }
            }
        }

        let title = html_escape(&format!("{}{}", basename, TITLE_SUFFIX));
        let page = self
            .page_template
            .replacen(HEAD_TITLE_PLACEHOLDER, &title, 1)
            .replacen(STYLE_PLACEHOLDER, &style, 1)
            .replacen(HEAD_PLACEHOLDER, &head, 1)
            .replacen(BODY_PLACEHOLDER, &body, 1);

        write_atomically(output_path, &page)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resource Folder
// ─────────────────────────────────────────────────────────────────────────────

/// The `<basename>_files` folder relocated resources are copied into.
struct ResourceFolder {
    parent: PathBuf,
    name: String,
    dir: PathBuf,
    /// Source file to its name inside the folder
    copied: HashMap<PathBuf, String>,
    /// Files generated into the folder
    written: Vec<String>,
}

impl ResourceFolder {
    fn new(parent: &Path, basename: &str) -> Self {
        let name = format!("{}_files", basename);
        Self {
            parent: parent.to_path_buf(),
            dir: parent.join(&name),
            name,
            copied: HashMap::new(),
            written: Vec::new(),
        }
    }

    fn create(&self) -> Result<(), ExportError> {
        fs::create_dir_all(&self.dir).map_err(|err| ExportError::io(&self.dir, err))
    }

    fn href(&self, file_name: &str) -> String {
        format!(
            "{}/{}",
            encode_segment(&self.name),
            encode_segment(file_name)
        )
    }

    fn write_file(&mut self, file_name: &str, text: &str) -> Result<(), ExportError> {
        let path = self.dir.join(file_name);
        fs::write(&path, text).map_err(|err| ExportError::io(path, err))?;
        self.written.push(file_name.to_string());
        Ok(())
    }

    /// Copy `source` into the folder, returning its file name there.
    fn copy_in(&mut self, source: &Path) -> Option<String> {
        if let Some(name) = self.copied.get(source) {
            return Some(name.clone());
        }

        let file_name = source.file_name()?.to_string_lossy().into_owned();
        let name = unused_name(&self.dir, &file_name);
        match fs::copy(source, self.dir.join(&name)) {
            Ok(_) => {
                debug!("Copied {} into {}", source.display(), self.dir.display());
                self.copied.insert(source.to_path_buf(), name.clone());
                Some(name)
            }
            Err(err) => {
                warn!("Cannot copy resource {}: {}", source.display(), err);
                None
            }
        }
    }

    /// Remove everything this export put into the folder.
    fn discard(&mut self) {
        let names = self.copied.drain().map(|(_, name)| name);
        for name in names.chain(self.written.drain(..)) {
            let path = self.dir.join(&name);
            if let Err(err) = fs::remove_file(&path) {
                debug!("Cannot remove {}: {}", path.display(), err);
            }
        }
    }

    fn remove_if_empty(&self) {
        let empty = fs::read_dir(&self.dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if empty {
            if let Err(err) = fs::remove_dir(&self.dir) {
                debug!("Cannot remove {}: {}", self.dir.display(), err);
            }
        }
    }
}

/// `file_name`, or `stem_N.ext` if that name is taken in `dir`.
fn unused_name(dir: &Path, file_name: &str) -> String {
    if !dir.join(file_name).exists() {
        return file_name.to_string();
    }

    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|n| format!("{}_{}{}", stem, n, ext))
        .find(|candidate| !dir.join(candidate).exists())
        .unwrap_or_else(|| file_name.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Embedding
// ─────────────────────────────────────────────────────────────────────────────

/// Read a file into a `data:` URI.
fn data_uri(path: &Path) -> Option<String> {
    match fs::read(path) {
        Ok(bytes) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            Some(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
        }
        Err(err) => {
            warn!("Cannot embed {}: {}", path.display(), err);
            None
        }
    }
}

fn embed_css_urls(css: &str) -> String {
    rewrite_css_urls(css, |reference| {
        // Stylesheet references are absolute once extracted.
        let path = resolve_local_reference(reference, Path::new("."))?;
        data_uri(&path)
    })
}

/// Navigation list of the headings that carry an id.
fn build_outline(body: &str) -> String {
    let items: Vec<String> = HEADING
        .captures_iter(body)
        .filter_map(|caps| {
            let id = ID_ATTR.captures(&caps[0])?[1].to_string();
            let text = TAG.replace_all(&caps[2], "");
            let text = text.trim();
            (!text.is_empty()).then(|| {
                format!(
                    "<li class=\"vx-outline-h{}\"><a href=\"#{}\">{}</a></li>",
                    &caps[1], id, text
                )
            })
        })
        .collect();

    if items.is_empty() {
        return String::new();
    }
    format!(
        "<nav class=\"vx-outline\">\n<ul>\n{}\n</ul>\n</nav>",
        items.join("\n")
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Utility Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Write through a temporary sibling so a failed write leaves no output.
fn write_atomically(path: &Path, text: &str) -> Result<(), ExportError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{}.tmp", file_name));

    fs::write(&temp, text).map_err(|err| ExportError::io(&temp, err))?;
    if let Err(err) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(ExportError::io(path, err));
    }
    Ok(())
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// HTML-escape a string.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
