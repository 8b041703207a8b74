//! # multiseek - Concatenated Seekable Streams
//!
//! Presents an ordered sequence of independently seekable sources (files,
//! pieces of a split archive, in-memory buffers) as one continuous byte range
//! that can be read and seeked without tracking which source holds the cursor.
//!
//! ## Features
//!
//! - **Boundary-crossing reads**: a single `read` fills the buffer across as
//!   many sources as needed
//! - **Full seek support**: absolute, relative, and from-end seeks resolved to
//!   the owning source
//! - **Any source**: anything implementing `Read + Seek` plus `close`
//! - **Segment files**: in-memory, memory-mapped, or transparently
//!   decompressed (gzip, bzip2, xz, zstd)
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`source`] - Source capability trait and the boundary table
//! - [`stream`] - The concatenated stream itself
//! - [`segment`] - File-backed sources and the factory that opens them
//! - [`config`] - Thresholds and buffer sizes
//!
//! ## Example
//!
//! ```
//! use multiseek::{MultiReadSeeker, Origin};
//! use std::io::{Cursor, Read};
//!
//! let mut stream = MultiReadSeeker::new(vec![
//!     Cursor::new(b"ABCDE".to_vec()),
//!     Cursor::new(b"FGH".to_vec()),
//!     Cursor::new(b"IJKL".to_vec()),
//! ])?;
//!
//! stream.seek_from(4, Origin::Start)?;
//! let mut buf = [0u8; 3];
//! stream.read_exact(&mut buf)?;
//! assert_eq!(&buf, b"EFG");
//!
//! stream.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod source;
pub mod stream;

// File-backed sources and their settings
pub mod config;
pub mod segment;

// Re-export commonly used types for convenience
pub use error::{MultiSeekError, Result, SourceOp};

// Public API surface for external usage
pub use config::Settings;
pub use segment::{Segment, SegmentFactory};
pub use source::{BoundaryTable, Source};
pub use stream::{MultiReadSeeker, Origin};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
