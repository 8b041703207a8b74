//! Factory for opening segment files.
//!
//! This module provides the SegmentFactory which turns paths into [`Segment`]s,
//! choosing the storage strategy from the file's size and compression, and
//! assembles ordered paths into a [`MultiReadSeeker`].

use crate::config::Settings;
use crate::error::{MultiSeekError, Result};
use crate::segment::compression::{
    decompress_to_memory, decompress_to_temp_file, detect_compression,
};
use crate::segment::validation::validate_segment_path;
use crate::segment::{Segment, SegmentBytes};
use crate::source::close_abandoned;
use crate::stream::MultiReadSeeker;
use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Factory for creating Segment instances
///
/// # Strategy Selection
/// - Empty files and files < `memory_threshold`: in-memory (`SegmentBytes::InMemory`)
/// - Files ≥ `memory_threshold`: memory mapping (`SegmentBytes::MemoryMapped`)
/// - Compressed files: decompressed to memory below
///   `compressed_memory_threshold`, otherwise to a memory-mapped temp file
#[derive(Debug, Clone, Default)]
pub struct SegmentFactory {
    settings: Settings,
}

impl SegmentFactory {
    /// Create a factory using the given settings
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Settings this factory opens segments with
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Open one segment with the optimal strategy for the given file
    ///
    /// # Process
    /// 1. Validate the path (existence, regular file, readable)
    /// 2. Detect and handle compression transparently
    /// 3. Select the `SegmentBytes` strategy based on size
    ///
    /// # Errors
    /// * File validation errors (non-existent, directory, not readable)
    /// * Compression detection/decompression errors
    /// * Memory mapping failures
    pub async fn open(&self, path: &Path) -> Result<Segment> {
        validate_segment_path(path)?;

        let compression = detect_compression(path).await?;

        let bytes = if compression.is_compressed() {
            let compressed_size = tokio::fs::metadata(path)
                .await
                .map_err(|e| MultiSeekError::file_error("Failed to read segment metadata", e))?
                .len();

            if compressed_size < self.settings.compressed_memory_threshold {
                SegmentBytes::InMemory(decompress_to_memory(path, compression).await?)
            } else {
                let temp_file = decompress_to_temp_file(path, compression).await?;
                let handle = temp_file
                    .reopen()
                    .map_err(|e| MultiSeekError::file_error("Failed to reopen temp file", e))?;
                let mmap = map_file(&handle, temp_file.path())?;
                SegmentBytes::Decompressed { mmap, temp_file }
            }
        } else {
            let file = File::open(path).map_err(|e| {
                MultiSeekError::file_error(format!("Failed to open segment: {}", path.display()), e)
            })?;
            let file_size = file
                .metadata()
                .map_err(|e| MultiSeekError::file_error("Failed to get segment metadata", e))?
                .len();

            if file_size == 0 || file_size < self.settings.memory_threshold {
                read_into_memory(file, file_size)?
            } else {
                SegmentBytes::MemoryMapped(map_file(&file, path)?)
            }
        };

        let segment = Segment::new(bytes, path);
        log::debug!(
            "opened segment {} ({} bytes, {}, compression: {})",
            path.display(),
            segment.size(),
            segment.strategy(),
            compression.name()
        );
        Ok(segment)
    }

    /// Open every path, in order, and concatenate them into one stream
    ///
    /// # Errors
    /// * `ConfigurationError` if `paths` is empty
    /// * Any error from [`SegmentFactory::open`] for the first failing path;
    ///   segments already opened are closed first
    pub async fn open_all<P>(&self, paths: &[P]) -> Result<MultiReadSeeker<Segment>>
    where
        P: AsRef<Path>,
    {
        if paths.is_empty() {
            return Err(MultiSeekError::configuration(
                "at least one segment path is required",
            ));
        }

        let mut segments = Vec::with_capacity(paths.len());
        for path in paths {
            match self.open(path.as_ref()).await {
                Ok(segment) => segments.push(segment),
                Err(err) => {
                    close_abandoned(&mut segments);
                    return Err(err);
                }
            }
        }

        MultiReadSeeker::new(segments)
    }

    /// Open an uncompressed segment with an explicit strategy (for testing)
    ///
    /// # Arguments
    /// * `path` - Path to the file to open
    /// * `force_mmap` - If true, use `SegmentBytes::MemoryMapped`; if false, use `SegmentBytes::InMemory`
    #[cfg(test)]
    pub async fn open_with_strategy(path: &Path, force_mmap: bool) -> Result<Segment> {
        validate_segment_path(path)?;

        let file = File::open(path).map_err(|e| {
            MultiSeekError::file_error(format!("Failed to open segment: {}", path.display()), e)
        })?;
        let file_size = file
            .metadata()
            .map_err(|e| MultiSeekError::file_error("Failed to get segment metadata", e))?
            .len();

        let bytes = if force_mmap {
            SegmentBytes::MemoryMapped(map_file(&file, path)?)
        } else {
            read_into_memory(file, file_size)?
        };
        Ok(Segment::new(bytes, path))
    }
}

fn read_into_memory(mut file: File, file_size: u64) -> Result<SegmentBytes> {
    let mut content = Vec::with_capacity(usize::try_from(file_size).unwrap_or(0));
    file.read_to_end(&mut content)
        .map_err(|e| MultiSeekError::file_error("Failed to read segment", e))?;
    Ok(SegmentBytes::InMemory(content))
}

fn map_file(file: &File, path: &Path) -> Result<Mmap> {
    // SAFETY: segments are only read; they must not be truncated while open.
    unsafe { Mmap::map(file) }.map_err(|e| {
        MultiSeekError::file_error(format!("Failed to memory map segment: {}", path.display()), e)
    })
}
