//! Compression format detection and decompression for segment files.
//!
//! Compressed segments cannot be seeked directly, so they are decompressed
//! up front: into memory when small, into a temporary file otherwise.

use crate::error::{MultiSeekError, Result};
use async_compression::tokio::bufread::{BzDecoder, GzipDecoder, XzDecoder, ZstdDecoder};
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};

/// Supported compression formats for segment files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// No compression
    None,
    /// Gzip compression (.gz files)
    Gzip,
    /// Bzip2 compression (.bz2 files)
    Bzip2,
    /// XZ compression (.xz files)
    Xz,
    /// Zstandard compression (.zst, .zstd files)
    Zstd,
}

impl CompressionType {
    /// Get human-readable name for the compression type
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Xz => "xz",
            Self::Zstd => "zstd",
        }
    }

    /// Check if this type represents a compressed format
    pub fn is_compressed(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Detect compression type from magic numbers, falling back to the extension
///
/// # Magic Numbers Used
/// - Gzip: `1f 8b` (RFC 1952)
/// - Bzip2: `42 5a 68` ("BZh" with block size)
/// - XZ: `fd 37 7a 58 5a 00` (XZ format specification)
/// - Zstd: `28 b5 2f fd` (Zstandard frame format)
pub async fn detect_compression(path: &Path) -> Result<CompressionType> {
    if let Ok(mut file) = File::open(path).await {
        let mut buffer = [0u8; 8];
        let bytes_read = file.read(&mut buffer).await.unwrap_or(0);

        if let Some(format) = detect_by_magic(&buffer[..bytes_read]) {
            return Ok(format);
        }
    }

    Ok(detect_by_extension(path).unwrap_or(CompressionType::None))
}

/// Detect compression format from magic bytes
fn detect_by_magic(magic: &[u8]) -> Option<CompressionType> {
    if magic.starts_with(&[0x1f, 0x8b]) {
        Some(CompressionType::Gzip)
    } else if magic.starts_with(&[0x42, 0x5a, 0x68]) {
        Some(CompressionType::Bzip2)
    } else if magic.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
        Some(CompressionType::Zstd)
    } else if magic.starts_with(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00]) {
        Some(CompressionType::Xz)
    } else {
        None
    }
}

/// Detect compression format from file extension
fn detect_by_extension(path: &Path) -> Option<CompressionType> {
    let ext = path.extension()?.to_str()?;
    match ext.to_lowercase().as_str() {
        "gz" => Some(CompressionType::Gzip),
        "bz2" => Some(CompressionType::Bzip2),
        "xz" => Some(CompressionType::Xz),
        "zst" | "zstd" => Some(CompressionType::Zstd),
        _ => None,
    }
}

async fn decoder_for(
    path: &Path,
    compression: CompressionType,
) -> Result<Box<dyn AsyncRead + Unpin + Send>> {
    let file = File::open(path)
        .await
        .map_err(|e| MultiSeekError::file_error("Failed to open compressed segment", e))?;
    let file = BufReader::new(file);

    let decoder: Box<dyn AsyncRead + Unpin + Send> = match compression {
        CompressionType::Gzip => Box::new(GzipDecoder::new(file)),
        CompressionType::Bzip2 => Box::new(BzDecoder::new(file)),
        CompressionType::Xz => Box::new(XzDecoder::new(file)),
        CompressionType::Zstd => Box::new(ZstdDecoder::new(file)),
        CompressionType::None => {
            return Err(MultiSeekError::compression(format!(
                "segment is not compressed: {}",
                path.display()
            )))
        }
    };
    Ok(decoder)
}

/// Decompress a segment entirely into memory
pub async fn decompress_to_memory(path: &Path, compression: CompressionType) -> Result<Vec<u8>> {
    let mut decoder = decoder_for(path, compression).await?;

    let mut data = Vec::new();
    decoder.read_to_end(&mut data).await.map_err(|e| {
        MultiSeekError::compression(format!(
            "Failed to decompress {} segment {}: {e}",
            compression.name(),
            path.display()
        ))
    })?;

    Ok(data)
}

/// Decompress a segment to a temporary file
pub async fn decompress_to_temp_file(
    path: &Path,
    compression: CompressionType,
) -> Result<NamedTempFile> {
    let mut decoder = decoder_for(path, compression).await?;

    let temp_file = NamedTempFile::new()
        .map_err(|e| MultiSeekError::file_error("Failed to create temp file", e))?;
    let temp_file_handle = tokio::fs::File::create(temp_file.path())
        .await
        .map_err(|e| MultiSeekError::file_error("Failed to open temp file for writing", e))?;
    let mut temp_writer = BufWriter::new(temp_file_handle);

    tokio::io::copy(&mut decoder, &mut temp_writer)
        .await
        .map_err(|e| {
            MultiSeekError::compression(format!(
                "Failed to decompress {} segment {}: {e}",
                compression.name(),
                path.display()
            ))
        })?;

    temp_writer
        .flush()
        .await
        .map_err(|e| MultiSeekError::file_error("Failed to flush temp file", e))?;

    Ok(temp_file)
}
