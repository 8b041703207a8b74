//! Source abstraction for the concatenated stream.
//!
//! A source is any readable, seekable, closable resource that contributes one
//! contiguous range of bytes to a [`MultiReadSeeker`](crate::stream::MultiReadSeeker).
//! The stream never looks inside a source: it measures it with an end-seek,
//! reads from it, positions it, and closes it.

pub mod boundary;

pub use boundary::BoundaryTable;

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek};

/// Capability set the stream needs from each underlying source.
///
/// `Read` and `Seek` come from `std::io`; `close` releases the resource and
/// reports any failure doing so. Sources are owned by the stream and closed
/// exactly once, when the stream is closed or dropped.
pub trait Source: Read + Seek {
    /// Release the underlying resource
    ///
    /// # Returns
    /// * `Ok(())` if the resource was released cleanly
    /// * The I/O error reported while releasing it otherwise
    fn close(&mut self) -> io::Result<()>;
}

/// Files release their descriptor when dropped; there is nothing to flush
/// on a read-only handle.
impl Source for File {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: AsRef<[u8]>> Source for Cursor<T> {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: Source> Source for BufReader<S> {
    fn close(&mut self) -> io::Result<()> {
        self.get_mut().close()
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Close every source after giving up on building a stream from them
///
/// Failures are logged, not returned: the caller already has an error to
/// report.
pub(crate) fn close_abandoned<S: Source>(sources: &mut [S]) {
    for (index, source) in sources.iter_mut().enumerate() {
        if let Err(e) = source.close() {
            log::warn!("closing abandoned source #{index}: {e}");
        }
    }
}
