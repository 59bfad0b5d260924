//! Document Export Module for Quill
//!
//! This module drives markdown notes through the rendering engine and
//! writes the rendered result as HTML.
//!
//! # Architecture
//!
//! - `options.rs` - Export configuration and options
//! - `error.rs` - Export error taxonomy
//! - `session.rs` - Rendering session state machine and blocking waits
//! - `coordinator.rs` - Single-document export with session lease and cancellation
//! - `html.rs` - HTML file writer with resource embedding and relocation
//! - `batch.rs` - Folder and notebook exports on top of the coordinator

mod batch;
mod coordinator;
mod error;
mod html;
mod options;
mod session;

pub use batch::Exporter;
pub use error::ExportError;
pub use options::{ExportFormat, ExportHtmlOption, ExportOption, ExportSource};
