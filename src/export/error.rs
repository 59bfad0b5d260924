//! Export error types

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors that can occur while exporting a document.
///
/// Cancellation is not an error; see `ExportOutcome::Cancelled`.
#[derive(Debug)]
pub enum ExportError {
    /// The rendering engine failed or never became ready
    Render(String),
    /// Reading or writing a file failed
    Io { path: PathBuf, source: io::Error },

    // ─────────────────────────────────────────────────────────────────────────
    // Caller errors
    // ─────────────────────────────────────────────────────────────────────────
    /// The document is not markdown
    UnsupportedContentType(PathBuf),
    /// The target format cannot be produced
    UnsupportedFormat(&'static str),
    /// MIME HTML archives cannot be produced
    MimeHtmlUnsupported,
    /// Another export holds the rendering session
    ExportInProgress,
}

impl ExportError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ExportError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error stems from a caller mistake rather than a runtime failure.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            ExportError::UnsupportedContentType(_)
                | ExportError::UnsupportedFormat(_)
                | ExportError::MimeHtmlUnsupported
                | ExportError::ExportInProgress
        )
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Render(reason) => write!(f, "Rendering failed: {}", reason),
            ExportError::Io { path, source } => {
                write!(f, "I/O error on '{}': {}", path.display(), source)
            }
            ExportError::UnsupportedContentType(path) => {
                write!(f, "Not a markdown document: {}", path.display())
            }
            ExportError::UnsupportedFormat(format) => {
                write!(f, "Export format {} is not supported", format)
            }
            ExportError::MimeHtmlUnsupported => write!(f, "MIME HTML export is not supported"),
            ExportError::ExportInProgress => write!(f, "Another export is already in progress"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_violations() {
        assert!(ExportError::ExportInProgress.is_contract_violation());
        assert!(ExportError::MimeHtmlUnsupported.is_contract_violation());
        assert!(ExportError::UnsupportedFormat("PDF").is_contract_violation());
        assert!(!ExportError::Render("x".into()).is_contract_violation());
        let io = ExportError::io("/x", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(!io.is_contract_violation());
    }

    #[test]
    fn test_display() {
        let err = ExportError::io("/out/a.html", io::Error::new(io::ErrorKind::Other, "disk full"));
        assert_eq!(err.to_string(), "I/O error on '/out/a.html': disk full");
        assert!(std::error::Error::source(&err).is_some());
    }
}
