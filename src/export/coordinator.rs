//! Export coordinator
//!
//! Drives a single document through template assembly, rendering and
//! writing. One coordinator runs one export at a time: the rendering
//! session is held as a lease for the duration of `export_one`, and a
//! second caller fails fast instead of sharing the engine.

use super::html::HtmlWriter;
use super::session::{RenderingSession, WaitConfig, Waited};
use super::{ExportError, ExportFormat, ExportOption};
use crate::config::ConfigService;
use crate::engine::{EngineEvent, EngineFactory, MarkdownEngine, RenderEngine};
use crate::files::Document;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError, TryLockError};

/// How an export ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Exported(PathBuf),
    Cancelled,
}

/// Requests cooperative cancellation of a running export.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct PageExporter {
    config: Arc<ConfigService>,
    factory: Box<EngineFactory>,
    session: Mutex<Option<RenderingSession>>,
    stop: Arc<AtomicBool>,
}

impl PageExporter {
    pub fn new(config: Arc<ConfigService>, factory: Box<EngineFactory>) -> Self {
        Self {
            config,
            factory,
            session: Mutex::new(None),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Coordinator rendering through the bundled markdown engine.
    pub fn with_markdown_engine(config: Arc<ConfigService>) -> Self {
        Self::new(
            config,
            Box::new(|events: Sender<EngineEvent>| {
                Box::new(MarkdownEngine::new(events)) as Box<dyn RenderEngine>
            }),
        )
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop))
    }

    /// Destroy the session and its engine, and withdraw any stop request.
    pub fn clear(&self) {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if session.take().is_some() {
            debug!("Rendering session destroyed");
        }
        self.stop.store(false, Ordering::SeqCst);
    }

    /// Export `document` as HTML to `output_path`.
    ///
    /// A stop requested before the call cancels it; the request stays in
    /// effect until `clear`.
    pub fn export_one(
        &self,
        option: &ExportOption,
        document: &Document,
        output_path: &Path,
    ) -> Result<ExportOutcome, ExportError> {
        if !document.content_type().is_markdown() {
            return Err(ExportError::UnsupportedContentType(
                document.path().to_path_buf(),
            ));
        }
        if option.format != ExportFormat::Html {
            return Err(ExportError::UnsupportedFormat(option.format.label()));
        }
        if option.html.use_mime_html_format {
            return Err(ExportError::MimeHtmlUnsupported);
        }

        let mut lease = match self.session.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(ExportError::ExportInProgress),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        let result = self.run(&mut lease, option, document, output_path);
        match &result {
            Ok(ExportOutcome::Exported(path)) => info!("Exported {}", path.display()),
            Ok(ExportOutcome::Cancelled) => info!("Export of {} cancelled", document.path().display()),
            Err(err) => warn!("Export of {} failed: {}", document.path().display(), err),
        }
        result
    }

    fn run(
        &self,
        lease: &mut Option<RenderingSession>,
        option: &ExportOption,
        document: &Document,
        output_path: &Path,
    ) -> Result<ExportOutcome, ExportError> {
        let settings = self.config.settings();
        let wait = WaitConfig::from_settings(&settings.export);
        let text = document
            .read()
            .map_err(|err| ExportError::io(document.path(), err))?;
        let template = self.config.markdown_viewer_template(
            option.render_style.as_deref(),
            option.highlight_style.as_deref(),
        );

        let session = lease.get_or_insert_with(|| RenderingSession::new(self.factory.as_ref()));
        info!("Rendering {}", document.path().display());
        session.start(&template, document.path(), &text);

        if session.wait_until_ready(&wait, &self.stop)? == Waited::Cancelled {
            return Ok(ExportOutcome::Cancelled);
        }
        if session.settle(&wait, &self.stop)? == Waited::Cancelled {
            return Ok(ExportOutcome::Cancelled);
        }
        let content = match session.request_content(&wait, &self.stop)? {
            Waited::Done(content) => content,
            Waited::Cancelled => return Ok(ExportOutcome::Cancelled),
        };

        if self.stop.load(Ordering::SeqCst) {
            return Ok(ExportOutcome::Cancelled);
        }
        if content.body.trim().is_empty() {
            return Err(ExportError::Render("rendered body is empty".to_string()));
        }

        let page_template = self
            .config
            .locator()
            .read_text(&settings.export.page_template);
        HtmlWriter::new(page_template)
            .write(output_path, &content, &option.html)
            .map(ExportOutcome::Exported)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
