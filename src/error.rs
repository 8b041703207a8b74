//! Error types and handling infrastructure for multiseek.
//!
//! This module provides a centralized error handling system using `thiserror` for
//! the library error type. The binary layers `anyhow` context on top of it.
//!
//! ## Design Principles
//!
//! - **Context preservation**: source failures always carry the source index and
//!   the operation that failed
//! - **Interoperability**: every error converts into `std::io::Error` so the
//!   stream can implement `Read` and `Seek` without losing the typed cause
//! - **Consistency**: standardized Result type across all modules

use std::fmt;
use std::io;
use thiserror::Error;

/// Operation that was being performed on an underlying source when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOp {
    /// Seeking to the end to measure the source size during construction
    SeekEnd,
    /// Seeking back to the start after measuring, or before crossing into it
    Rewind,
    /// Reading bytes
    Read,
    /// Positioning the source at a local offset for a stream seek
    Seek,
    /// Closing the source
    Close,
}

impl fmt::Display for SourceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SeekEnd => "seeking to end of",
            Self::Rewind => "seeking to start of",
            Self::Read => "reading",
            Self::Seek => "seeking within",
            Self::Close => "closing",
        };
        f.write_str(name)
    }
}

/// The main error type for multiseek operations.
#[derive(Error, Debug)]
pub enum MultiSeekError {
    /// The stream cannot be built from what it was given (empty source list,
    /// unusable settings)
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Bad seek origin, positive offset from the end, or an unreachable target
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// An underlying source failed
    #[error("Failed {op} source #{index} (0-based)")]
    SourceError {
        index: usize,
        op: SourceOp,
        #[source]
        source: io::Error,
    },

    /// The stream was closed, or entered a failed state after a fatal source error
    #[error("Stream is closed")]
    Closed,

    /// Every failure collected while closing the sources
    #[error("{} source(s) failed to close: {}", .0.len(), join_messages(.0))]
    Close(Vec<MultiSeekError>),

    /// File system related errors while opening segments
    #[error("File operation failed: {message}")]
    FileError {
        message: String,
        #[source]
        source: io::Error,
    },

    /// Compression format detection or decompression errors
    #[error("Compression error: {message}")]
    CompressionError { message: String },
}

/// Standard Result type for multiseek operations.
pub type Result<T> = std::result::Result<T, MultiSeekError>;

fn join_messages(errors: &[MultiSeekError]) -> String {
    errors
        .iter()
        .map(|e| match e {
            MultiSeekError::SourceError { source, .. } => format!("{e}: {source}"),
            _ => e.to_string(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl MultiSeekError {
    /// Create a ConfigurationError with a descriptive message
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Create an InvalidArgument error with a descriptive message
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Wrap a failure of source `index` during `op`
    pub fn source(index: usize, op: SourceOp, source: io::Error) -> Self {
        Self::SourceError { index, op, source }
    }

    /// Create a FileError from an io::Error with additional context
    pub fn file_error(message: impl Into<String>, source: io::Error) -> Self {
        Self::FileError {
            message: message.into(),
            source,
        }
    }

    /// Create a CompressionError with a descriptive message
    pub fn compression(message: impl Into<String>) -> Self {
        Self::CompressionError {
            message: message.into(),
        }
    }

    /// Index of the failing source, for source errors
    pub fn source_index(&self) -> Option<usize> {
        match self {
            Self::SourceError { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Kind used when this error crosses into `std::io`
    fn io_kind(&self) -> io::ErrorKind {
        match self {
            Self::InvalidArgument { .. } | Self::ConfigurationError { .. } => {
                io::ErrorKind::InvalidInput
            }
            Self::SourceError { source, .. } | Self::FileError { source, .. } => source.kind(),
            Self::CompressionError { .. } => io::ErrorKind::InvalidData,
            Self::Closed | Self::Close(_) => io::ErrorKind::Other,
        }
    }
}

// Conversion used by the `Read` and `Seek` impls; the typed error stays
// reachable through `io::Error::get_ref` / `into_inner`.
impl From<MultiSeekError> for io::Error {
    fn from(err: MultiSeekError) -> Self {
        io::Error::new(err.io_kind(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let config = MultiSeekError::configuration("at least one source is required");
        assert_eq!(
            config.to_string(),
            "Configuration error: at least one source is required"
        );

        let source = MultiSeekError::source(
            2,
            SourceOp::Close,
            io::Error::new(io::ErrorKind::Other, "disk gone"),
        );
        assert_eq!(source.to_string(), "Failed closing source #2 (0-based)");

        let seek_end = MultiSeekError::source(
            0,
            SourceOp::SeekEnd,
            io::Error::new(io::ErrorKind::Other, "nope"),
        );
        assert_eq!(
            seek_end.to_string(),
            "Failed seeking to end of source #0 (0-based)"
        );
    }

    #[test]
    fn test_aggregate_close_message() {
        let err = MultiSeekError::Close(vec![
            MultiSeekError::source(0, SourceOp::Close, io::Error::new(io::ErrorKind::Other, "a")),
            MultiSeekError::source(3, SourceOp::Close, io::Error::new(io::ErrorKind::Other, "b")),
        ]);
        let message = err.to_string();
        assert!(message.starts_with("2 source(s) failed to close"));
        assert!(message.contains("source #0 (0-based): a"));
        assert!(message.contains("source #3 (0-based): b"));
    }

    #[test]
    fn test_source_index() {
        let err = MultiSeekError::source(
            4,
            SourceOp::Read,
            io::Error::new(io::ErrorKind::UnexpectedEof, "short"),
        );
        assert_eq!(err.source_index(), Some(4));
        assert_eq!(MultiSeekError::Closed.source_index(), None);
    }

    #[test]
    fn test_io_error_conversion_keeps_kind_and_cause() {
        let err = MultiSeekError::invalid_argument("offset must be <= 0");
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidInput);

        let inner = io_err
            .get_ref()
            .and_then(|e| e.downcast_ref::<MultiSeekError>())
            .expect("typed error preserved");
        assert!(matches!(inner, MultiSeekError::InvalidArgument { .. }));

        let io_err: io::Error = MultiSeekError::source(
            1,
            SourceOp::Read,
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        )
        .into();
        assert_eq!(io_err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<String> {
            Ok("success".to_string())
        }

        let result = returns_result();
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "success");
    }
}
