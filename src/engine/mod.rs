//! Rendering engine abstraction
//!
//! A rendering engine is an event-driven component: every request returns
//! immediately and its completion is reported later as an [`EngineEvent`]
//! on the channel handed to the engine at construction. Events carry the
//! [`Ticket`] of the request that caused them so that late events from an
//! abandoned render can be told apart from the current one.
//!
//! # Architecture
//!
//! - `page.rs` - Parsing of the loaded viewer page (options, styles, head)
//! - `markdown.rs` - Bundled engine rendering markdown on a worker thread

mod markdown;
mod page;
#[cfg(test)]
pub mod scripted;

pub use markdown::MarkdownEngine;

use std::path::Path;
use std::sync::mpsc::Sender;

/// Identifies one render started by a session.
pub type Ticket = u64;

/// Head, style and body fragments extracted from the rendered page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedContent {
    pub head: String,
    pub style: String,
    pub body: String,
}

/// What happened inside the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEventKind {
    /// The page handed to `set_html` finished loading
    LoadFinished,
    /// Rendering of the text handed to `set_text` finished
    WorkFinished,
    /// Extraction requested by `save_content` finished
    ContentReady(ExtractedContent),
    /// The engine cannot continue this render
    Failed(String),
}

/// An event posted by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEvent {
    pub ticket: Ticket,
    pub kind: EngineEventKind,
}

impl EngineEvent {
    pub fn new(ticket: Ticket, kind: EngineEventKind) -> Self {
        Self { ticket, kind }
    }
}

/// An asynchronous, event-driven rendering engine.
///
/// Implementations must post exactly one `LoadFinished` per `set_html` and
/// one `WorkFinished` per `set_text`, in any order, or `Failed`.
pub trait RenderEngine: Send {
    /// Load a page whose relative references resolve against `base_dir`.
    fn set_html(&mut self, ticket: Ticket, html: &str, base_dir: &Path);

    /// Push the raw document text to be rendered into the loaded page.
    fn set_text(&mut self, ticket: Ticket, text: &str);

    /// Ask for the rendered head, style and body fragments.
    fn save_content(&mut self, ticket: Ticket);
}

/// Creates an engine bound to the sender its events are posted to.
pub type EngineFactory = dyn Fn(Sender<EngineEvent>) -> Box<dyn RenderEngine> + Send + Sync;
