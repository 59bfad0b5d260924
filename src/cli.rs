//! Command line arguments

use crate::config::ExportSettings;
use crate::export::{ExportFormat, ExportOption, ExportSource};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Export markdown notes to HTML.
#[derive(Parser, Debug)]
#[command(name = "quill", version, about)]
pub struct Cli {
    /// Note file, folder or notebook root to export
    pub source: PathBuf,

    /// Which documents to export
    #[arg(long, value_enum, default_value_t = Scope::Buffer)]
    pub scope: Scope,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Html)]
    pub format: Format,

    /// Output directory, defaults to the last one used
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Only export the top level of a folder
    #[arg(long)]
    pub no_recursive: bool,

    /// Write styles into the resource folder instead of inlining them
    #[arg(long)]
    pub no_embed_styles: bool,

    /// Write the body fragment without processing its resources
    #[arg(long)]
    pub fragment: bool,

    /// Copy images into the resource folder instead of embedding them
    #[arg(long)]
    pub no_embed_images: bool,

    /// Add a navigation list of the headings
    #[arg(long)]
    pub outline: bool,

    /// Rendering stylesheet
    #[arg(long, value_name = "FILE")]
    pub style: Option<PathBuf>,

    /// Syntax highlight stylesheet
    #[arg(long, value_name = "FILE")]
    pub highlight_style: Option<PathBuf>,

    /// Open the exported file afterwards
    #[arg(long)]
    pub open: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Buffer,
    Folder,
    Notebook,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Markdown,
    Html,
    Pdf,
    Custom,
}

impl From<Scope> for ExportSource {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Buffer => ExportSource::CurrentBuffer,
            Scope::Folder => ExportSource::CurrentFolder,
            Scope::Notebook => ExportSource::CurrentNotebook,
        }
    }
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Markdown => ExportFormat::Markdown,
            Format::Html => ExportFormat::Html,
            Format::Pdf => ExportFormat::Pdf,
            Format::Custom => ExportFormat::Custom,
        }
    }
}

impl Cli {
    /// Build the export option, starting from the saved preferences.
    pub fn export_option(&self, saved: &ExportSettings) -> ExportOption {
        let output_dir = self
            .output
            .clone()
            .or_else(|| saved.last_output_directory.clone())
            .unwrap_or_else(|| PathBuf::from("."));

        let mut html = saved.html.clone();
        if self.no_embed_styles {
            html.embed_styles = false;
        }
        if self.fragment {
            html.complete_page = false;
        }
        if self.no_embed_images {
            html.embed_images = false;
        }
        if self.outline {
            html.add_outline_panel = true;
        }

        ExportOption::html_file(output_dir)
            .with_source(self.scope.into())
            .with_format(self.format.into())
            .with_recursive(!self.no_recursive)
            .with_styles(self.style.clone(), self.highlight_style.clone())
            .with_html(html)
    }
}
