//! Error types for the seed recovery pipeline.
//!
//! Per-file failures fall into a small taxonomy: timeouts, decode failures
//! on recognized formats, I/O errors, and everything else. A file that is
//! simply not the expected format ("not applicable") is not an error at all;
//! extractors model that case with `Option` so it never reaches the error
//! counters.

use thiserror::Error;

/// Main error type for scan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Per-file time budget exceeded.
    #[error("Operation timed out (>{seconds:.1} seconds)")]
    Timeout { seconds: f64 },

    /// Recognized format but corrupted or truncated content.
    #[error("Decode error: {0}")]
    Decode(String),

    /// File I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ScanError {
    /// Short label used for error-sheet rows.
    pub fn kind_label(&self) -> &'static str {
        match self {
            ScanError::Timeout { .. } => "Timeout",
            ScanError::Decode(_) => "DecodeError",
            ScanError::Io(_) => "IOError",
            ScanError::Unexpected(_) => "Unexpected",
        }
    }
}

/// Result type alias for scan operations.
pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_carries_budget() {
        let err = ScanError::Timeout { seconds: 2.4 };
        assert_eq!(err.to_string(), "Operation timed out (>2.4 seconds)");
        assert_eq!(err.kind_label(), "Timeout");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ScanError = io.into();
        assert_eq!(err.kind_label(), "IOError");
    }
}
