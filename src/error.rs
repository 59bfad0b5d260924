//! Centralized error handling for Quill
//!
//! Errors that end a run of the command line: configuration problems,
//! exports that could not start, and batches that did not export every
//! document.

use crate::export::ExportError;
use log::warn;
use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;

// ─────────────────────────────────────────────────────────────────────────────
// Custom Result Type Alias
// ─────────────────────────────────────────────────────────────────────────────

/// A specialized `Result` type for the application.
pub type Result<T> = std::result::Result<T, Error>;

/// Exit status for requests Quill cannot serve, such as an unsupported format.
const EXIT_UNSUPPORTED: u8 = 2;

/// Exit status after an interrupt.
const EXIT_CANCELLED: u8 = 130;

#[derive(Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// The configuration file exists but cannot be read
    ConfigLoad { path: PathBuf, source: std::io::Error },

    /// The configuration file cannot be written
    ConfigSave {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The configuration file is not valid JSON
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// No platform configuration directory
    ConfigDirNotFound,

    // ─────────────────────────────────────────────────────────────────────────
    // Export Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// The batch could not start
    Export(ExportError),

    /// The batch was stopped before every document was exported
    Cancelled { exported: usize },

    /// Some documents failed to export
    Incomplete { failed: usize, total: usize },
}

impl Error {
    /// Process exit status reported for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Error::Export(err) if err.is_contract_violation() => ExitCode::from(EXIT_UNSUPPORTED),
            Error::Cancelled { .. } => ExitCode::from(EXIT_CANCELLED),
            _ => ExitCode::FAILURE,
        }
    }
}

impl From<ExportError> for Error {
    fn from(err: ExportError) -> Self {
        Error::Export(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConfigLoad { path, source } => write!(
                f,
                "Failed to load configuration from '{}': {}",
                path.display(),
                source
            ),
            Error::ConfigSave { path, source } => write!(
                f,
                "Failed to save configuration to '{}': {}",
                path.display(),
                source
            ),
            Error::ConfigParse { path, source } => write!(
                f,
                "Invalid configuration in '{}': {}",
                path.display(),
                source
            ),
            Error::ConfigDirNotFound => write!(f, "Configuration directory not found"),

            Error::Export(err) if err.is_contract_violation() => {
                write!(f, "Cannot export: {}", err)
            }
            Error::Export(err) => write!(f, "Export failed: {}", err),
            Error::Cancelled { exported } => {
                write!(f, "Export cancelled after {} document(s)", exported)
            }
            Error::Incomplete { failed, total } => {
                write!(f, "{} of {} document(s) failed to export", failed, total)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ConfigLoad { source, .. } => Some(source),
            Error::ConfigSave { source, .. } => Some(source.as_ref()),
            Error::ConfigParse { source, .. } => Some(source),
            Error::Export(err) => Some(err),
            Error::ConfigDirNotFound | Error::Cancelled { .. } | Error::Incomplete { .. } => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Graceful Degradation Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for Result to support graceful degradation.
pub trait ResultExt<T> {
    /// If the result is an error, log it at warning level and return the provided default.
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T;
}

impl<T> ResultExt<T> for Result<T> {
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                warn!("{}: {}. Using default.", context, err);
                default
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
