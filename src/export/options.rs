//! Export Options and Configuration
//!
//! This module defines the parameters of one export operation: what to
//! export, into which format, and how HTML output treats its resources.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Export Source
// ─────────────────────────────────────────────────────────────────────────────

/// Which documents an export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExportSource {
    /// The single document given as source
    #[default]
    CurrentBuffer,
    /// Markdown files of a folder
    CurrentFolder,
    /// Every markdown file of a notebook root
    CurrentNotebook,
}

impl ExportSource {
    /// Get the display label for this source.
    pub fn label(&self) -> &'static str {
        match self {
            ExportSource::CurrentBuffer => "Current Buffer",
            ExportSource::CurrentFolder => "Current Folder",
            ExportSource::CurrentNotebook => "Current Notebook",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Export Format
// ─────────────────────────────────────────────────────────────────────────────

/// Supported export formats for documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Copy the markdown source unchanged
    Markdown,
    /// Render into an HTML file
    #[default]
    Html,
    /// Render into a PDF document
    Pdf,
    /// Hand the rendered page to an external command
    Custom,
}

impl ExportFormat {
    /// Get the display label for this format.
    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "Markdown",
            ExportFormat::Html => "HTML",
            ExportFormat::Pdf => "PDF",
            ExportFormat::Custom => "Custom",
        }
    }

    /// Get the file extension for this format (if applicable).
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            ExportFormat::Markdown => Some("md"),
            ExportFormat::Html => Some("html"),
            ExportFormat::Pdf => Some("pdf"),
            ExportFormat::Custom => None,
        }
    }

    /// Whether this build can produce the format.
    pub fn is_supported(&self) -> bool {
        matches!(self, ExportFormat::Markdown | ExportFormat::Html)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Format Options
// ─────────────────────────────────────────────────────────────────────────────

/// How HTML output treats styles, images and page structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportHtmlOption {
    /// Inline styles instead of writing them into the resource folder
    pub embed_styles: bool,
    /// Wrap the body into a full page and process its resources
    pub complete_page: bool,
    /// Embed images as data URIs instead of copying them
    pub embed_images: bool,
    /// Produce a single MIME HTML archive
    pub use_mime_html_format: bool,
    /// Add a navigation list of the document headings
    pub add_outline_panel: bool,
}

impl Default for ExportHtmlOption {
    fn default() -> Self {
        Self {
            embed_styles: true,
            complete_page: true,
            embed_images: true,
            use_mime_html_format: false,
            add_outline_panel: false,
        }
    }
}

/// Options of the PDF format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportPdfOption {
    pub page_layout: String,
    pub use_wkhtmltopdf: bool,
    pub add_table_of_contents: bool,
}

impl Default for ExportPdfOption {
    fn default() -> Self {
        Self {
            page_layout: "A4".to_string(),
            use_wkhtmltopdf: false,
            add_table_of_contents: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Export Option
// ─────────────────────────────────────────────────────────────────────────────

/// Parameters of one export operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOption {
    pub source: ExportSource,
    pub format: ExportFormat,
    /// Render with a transparent page background
    pub transparent_background: bool,
    /// Rendering stylesheet overriding the configured one
    pub render_style: Option<PathBuf>,
    /// Highlight stylesheet overriding the configured one
    pub highlight_style: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// Descend into sub-directories for folder and notebook exports
    pub recursive: bool,
    /// Copy note attachments alongside the output
    pub export_attachments: bool,
    pub html: ExportHtmlOption,
    pub pdf: ExportPdfOption,
}

impl Default for ExportOption {
    fn default() -> Self {
        Self {
            source: ExportSource::default(),
            format: ExportFormat::default(),
            transparent_background: false,
            render_style: None,
            highlight_style: None,
            output_dir: PathBuf::from("."),
            recursive: true,
            export_attachments: false,
            html: ExportHtmlOption::default(),
            pdf: ExportPdfOption::default(),
        }
    }
}

impl ExportOption {
    /// Create options for HTML file export.
    pub fn html_file(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            format: ExportFormat::Html,
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    /// Set the source scope.
    pub fn with_source(mut self, source: ExportSource) -> Self {
        self.source = source;
        self
    }

    /// Set the target format.
    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the HTML options.
    pub fn with_html(mut self, html: ExportHtmlOption) -> Self {
        self.html = html;
        self
    }

    /// Override the theme stylesheets.
    pub fn with_styles(mut self, render: Option<PathBuf>, highlight: Option<PathBuf>) -> Self {
        self.render_style = render;
        self.highlight_style = highlight;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_default() {
        assert_eq!(ExportFormat::default(), ExportFormat::Html);
    }

    #[test]
    fn test_export_format_extension() {
        assert_eq!(ExportFormat::Html.extension(), Some("html"));
        assert_eq!(ExportFormat::Markdown.extension(), Some("md"));
        assert_eq!(ExportFormat::Custom.extension(), None);
    }

    #[test]
    fn test_supported_formats() {
        assert!(ExportFormat::Html.is_supported());
        assert!(ExportFormat::Markdown.is_supported());
        assert!(!ExportFormat::Pdf.is_supported());
        assert!(!ExportFormat::Custom.is_supported());
    }

    #[test]
    fn test_html_option_default() {
        let html = ExportHtmlOption::default();
        assert!(html.embed_styles);
        assert!(html.complete_page);
        assert!(html.embed_images);
        assert!(!html.use_mime_html_format);
        assert!(!html.add_outline_panel);
    }

    #[test]
    fn test_builder() {
        let option = ExportOption::html_file("/out")
            .with_source(ExportSource::CurrentFolder)
            .with_recursive(false);
        assert_eq!(option.output_dir, PathBuf::from("/out"));
        assert_eq!(option.source, ExportSource::CurrentFolder);
        assert!(!option.recursive);
    }

    #[test]
    fn test_partial_html_option_deserializes_with_defaults() {
        let html: ExportHtmlOption = serde_json::from_str(r#"{"embed_images": false}"#).unwrap();
        assert!(!html.embed_images);
        assert!(html.embed_styles);
    }
}
