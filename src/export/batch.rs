//! Batch export
//!
//! Expands an export source into documents and exports them one by one
//! through a single coordinator, mirroring the source directory layout
//! under the output directory.

use super::coordinator::{ExportOutcome, PageExporter, StopHandle};
use super::{ExportError, ExportFormat, ExportOption, ExportSource};
use crate::config::ConfigService;
use crate::files::{collect_documents, Document};
use log::{info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What a batch export produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub exported: Vec<PathBuf>,
    /// Source document and failure reason
    pub failed: Vec<(PathBuf, String)>,
    pub cancelled: bool,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.cancelled
    }
}

pub struct Exporter {
    pages: PageExporter,
}

impl Exporter {
    pub fn new(config: Arc<ConfigService>) -> Self {
        Self::with_page_exporter(PageExporter::with_markdown_engine(config))
    }

    pub fn with_page_exporter(pages: PageExporter) -> Self {
        Self { pages }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.pages.stop_handle()
    }

    /// Export every document `option.source` selects from `source`.
    pub fn export(&self, option: &ExportOption, source: &Path) -> Result<ExportReport, ExportError> {
        if !option.format.is_supported() {
            return Err(ExportError::UnsupportedFormat(option.format.label()));
        }
        if option.format == ExportFormat::Html && option.html.use_mime_html_format {
            return Err(ExportError::MimeHtmlUnsupported);
        }

        let jobs = plan(option, source)?;
        info!(
            "Exporting {} document(s) of the {} as {} into {}",
            jobs.len(),
            option.source.label().to_lowercase(),
            option.format.label(),
            option.output_dir.display()
        );

        let stop = self.stop_handle();
        let mut report = ExportReport::default();
        for (document, target_dir) in jobs {
            if stop.is_stopped() {
                report.cancelled = true;
                break;
            }

            match self.export_document(option, &document, &target_dir) {
                Ok(ExportOutcome::Exported(path)) => report.exported.push(path),
                Ok(ExportOutcome::Cancelled) => {
                    report.cancelled = true;
                    break;
                }
                Err(err) => {
                    warn!("Skipping {}: {}", document.path().display(), err);
                    report
                        .failed
                        .push((document.path().to_path_buf(), err.to_string()));
                }
            }
        }

        self.pages.clear();
        info!(
            "Export finished: {} exported, {} failed{}",
            report.exported.len(),
            report.failed.len(),
            if report.cancelled { ", cancelled" } else { "" }
        );
        Ok(report)
    }

    fn export_document(
        &self,
        option: &ExportOption,
        document: &Document,
        target_dir: &Path,
    ) -> Result<ExportOutcome, ExportError> {
        fs::create_dir_all(target_dir).map_err(|err| ExportError::io(target_dir, err))?;

        let extension = option.format.extension().unwrap_or("html");
        let output = unique_output_path(target_dir, &document.stem(), extension);

        match option.format {
            ExportFormat::Markdown => {
                fs::copy(document.path(), &output)
                    .map_err(|err| ExportError::io(document.path(), err))?;
                Ok(ExportOutcome::Exported(output))
            }
            _ => self.pages.export_one(option, document, &output),
        }
    }
}

/// Documents to export with the directory each is written into.
fn plan(option: &ExportOption, source: &Path) -> Result<Vec<(Document, PathBuf)>, ExportError> {
    match option.source {
        ExportSource::CurrentBuffer => {
            let document = Document::new(source);
            if !document.content_type().is_markdown() {
                return Err(ExportError::UnsupportedContentType(source.to_path_buf()));
            }
            Ok(vec![(document, option.output_dir.clone())])
        }
        ExportSource::CurrentFolder | ExportSource::CurrentNotebook => {
            if !source.is_dir() {
                return Err(ExportError::io(
                    source,
                    io::Error::new(io::ErrorKind::NotFound, "not a directory"),
                ));
            }

            let recursive = option.recursive || option.source == ExportSource::CurrentNotebook;
            let root_name = source
                .canonicalize()
                .ok()
                .and_then(|path| path.file_name().map(|name| name.to_os_string()))
                .unwrap_or_else(|| "export".into());
            let root_out = option.output_dir.join(root_name);

            Ok(collect_documents(source, recursive)
                .into_iter()
                .map(|document| {
                    let relative = document
                        .path()
                        .parent()
                        .and_then(|dir| dir.strip_prefix(source).ok())
                        .map(Path::to_path_buf)
                        .unwrap_or_default();
                    let target = root_out.join(relative);
                    (document, target)
                })
                .collect())
        }
    }
}

/// `<dir>/<stem>.<ext>`, or `<stem>_N.<ext>` if that already exists.
fn unique_output_path(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    let candidate = dir.join(format!("{}.{}", stem, extension));
    if !candidate.exists() {
        return candidate;
    }

    (1..)
        .map(|n| dir.join(format!("{}_{}.{}", stem, n, extension)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
