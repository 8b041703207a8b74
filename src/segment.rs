//! File-backed segments that can be concatenated into a stream.
//!
//! A [`Segment`] is the crate's concrete [`Source`]: the bytes of one file,
//! held in memory, memory-mapped, or decompressed into a memory-mapped
//! temporary file. Segments are created by the [`SegmentFactory`], which
//! picks the storage strategy from the file's size and compression.

pub mod compression;
pub mod factory;
pub mod validation;

pub use compression::{detect_compression, CompressionType};
pub use factory::SegmentFactory;
pub use validation::validate_segment_path;

use crate::source::Source;
use memmap2::Mmap;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Storage strategy behind a segment
#[derive(Debug)]
pub enum SegmentBytes {
    /// Content loaded entirely into memory (small files)
    InMemory(Vec<u8>),
    /// Content accessed via memory mapping (large files)
    MemoryMapped(Mmap),
    /// Compressed file decompressed to a temp file and memory-mapped.
    /// The temp file is kept alive until the segment is closed.
    Decompressed { mmap: Mmap, temp_file: NamedTempFile },
}

impl SegmentBytes {
    /// Get the underlying bytes as a slice regardless of storage strategy
    fn as_bytes(&self) -> &[u8] {
        match self {
            SegmentBytes::InMemory(vec) => vec.as_slice(),
            SegmentBytes::MemoryMapped(mmap) => &mmap[..],
            SegmentBytes::Decompressed { mmap, .. } => &mmap[..],
        }
    }

    fn strategy(&self) -> &'static str {
        match self {
            SegmentBytes::InMemory(_) => "in-memory",
            SegmentBytes::MemoryMapped(_) => "memory-mapped",
            SegmentBytes::Decompressed { .. } => "decompressed",
        }
    }
}

/// One readable, seekable, closable piece of a concatenated stream
#[derive(Debug)]
pub struct Segment {
    /// `None` once the segment has been closed
    bytes: Option<SegmentBytes>,
    position: u64,
    path: PathBuf,
}

impl Segment {
    /// Wrap already-loaded bytes as a segment positioned at 0
    pub fn new(bytes: SegmentBytes, path: impl Into<PathBuf>) -> Self {
        Self {
            bytes: Some(bytes),
            position: 0,
            path: path.into(),
        }
    }

    /// Path of the file this segment was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the segment content in bytes (0 once closed)
    pub fn size(&self) -> u64 {
        self.bytes
            .as_ref()
            .map_or(0, |bytes| bytes.as_bytes().len() as u64)
    }

    /// Name of the storage strategy, or `"closed"`
    pub fn strategy(&self) -> &'static str {
        self.bytes.as_ref().map_or("closed", SegmentBytes::strategy)
    }

    fn content(&self) -> io::Result<&[u8]> {
        self.bytes.as_ref().map(SegmentBytes::as_bytes).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::Other,
                format!("segment is closed: {}", self.path.display()),
            )
        })
    }
}

impl Read for Segment {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let content = self.content()?;
        let start = usize::try_from(self.position)
            .unwrap_or(usize::MAX)
            .min(content.len());
        let count = buf.len().min(content.len() - start);
        buf[..count].copy_from_slice(&content[start..start + count]);
        self.position += count as u64;
        Ok(count)
    }
}

impl Seek for Segment {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let size = self.content()?.len() as u64;
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(offset) => size.checked_add_signed(offset),
            SeekFrom::Current(offset) => self.position.checked_add_signed(offset),
        };

        match target {
            Some(position) => {
                self.position = position;
                Ok(position)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}

impl Source for Segment {
    fn close(&mut self) -> io::Result<()> {
        match self.bytes.take() {
            Some(SegmentBytes::Decompressed { mmap, temp_file }) => {
                drop(mmap);
                temp_file.close()
            }
            Some(_) | None => Ok(()),
        }
    }
}
