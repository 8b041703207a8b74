//! Path validation for segment files.
//!
//! Segments are checked before they are opened so the caller gets a message
//! naming the offending path rather than a bare I/O error.

use crate::error::{MultiSeekError, Result};
use std::fs::File;
use std::path::Path;

/// Validate that a path can be opened as a segment
///
/// # Validations Performed
/// - Path exists and is a regular file (not a directory)
/// - File is readable by the current process
///
/// Empty files are accepted: they become zero-length segments, which the
/// stream skips over.
pub fn validate_segment_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(MultiSeekError::file_error(
            format!("Segment does not exist: {}", path.display()),
            std::io::Error::new(std::io::ErrorKind::NotFound, "File not found"),
        ));
    }

    let metadata = std::fs::metadata(path)
        .map_err(|e| MultiSeekError::file_error("Failed to read segment metadata", e))?;

    if !metadata.is_file() {
        return Err(MultiSeekError::file_error(
            format!("Segment is not a file: {}", path.display()),
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "Not a file"),
        ));
    }

    File::open(path).map_err(|e| {
        MultiSeekError::file_error(
            format!("Cannot open segment for reading: {}", path.display()),
            e,
        )
    })?;

    Ok(())
}
