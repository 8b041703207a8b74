//! Concatenated seekable stream over an ordered list of sources.
//!
//! [`MultiReadSeeker`] presents N sources as one continuous byte range. It
//! owns the sources and a [`BoundaryTable`] computed once at construction;
//! reads and seeks translate the logical cursor into the source that holds it
//! and cross source boundaries as needed.
//!
//! The stream is a single-cursor adapter: every operation takes `&mut self`,
//! so sharing one stream between threads requires external synchronization.

use crate::error::{MultiSeekError, Result, SourceOp};
use crate::source::{close_abandoned, BoundaryTable, Source};
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};

/// Anchor a seek offset is measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Origin {
    /// Absolute logical offset
    Start = 0,
    /// Relative to the current logical position
    Current = 1,
    /// Relative to the total size; offsets must be <= 0
    End = 2,
}

impl TryFrom<i32> for Origin {
    type Error = MultiSeekError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Start),
            1 => Ok(Self::Current),
            2 => Ok(Self::End),
            other => Err(MultiSeekError::invalid_argument(format!(
                "seek origin must be 0, 1, or 2 (got {other})"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Open,
    /// A local seek failed; the cursor no longer matches any source
    Failed,
    Closed,
}

/// An ordered sequence of sources read and seeked as one stream
pub struct MultiReadSeeker<S: Source> {
    sources: Vec<S>,
    table: BoundaryTable,
    /// Index of the source the next read addresses
    current: usize,
    /// Logical cursor, always `<= table.total_size()`
    position: u64,
    state: StreamState,
    /// Read error hit after some bytes were already returned
    pending_error: Option<MultiSeekError>,
}

impl<S: Source> MultiReadSeeker<S> {
    /// Build a stream over `sources`, in order
    ///
    /// Every source is seeked to its end to measure it and then rewound to
    /// its own position 0. The stream starts at logical offset 0.
    ///
    /// # Errors
    /// * `ConfigurationError` if `sources` is empty
    /// * `SourceError` if measuring or rewinding a source fails; all sources
    ///   are closed before the error is returned
    pub fn new(mut sources: Vec<S>) -> Result<Self> {
        let table = match BoundaryTable::survey(&mut sources) {
            Ok(table) => table,
            Err(err) => {
                close_abandoned(&mut sources);
                return Err(err);
            }
        };

        log::debug!(
            "concatenated {} source(s) into {} bytes",
            table.len(),
            table.total_size()
        );

        Ok(Self {
            sources,
            table,
            current: 0,
            position: 0,
            state: StreamState::Open,
            pending_error: None,
        })
    }

    /// Build a stream from any ordered collection of sources
    pub fn from_sources<I>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
    {
        Self::new(sources.into_iter().collect())
    }

    /// Total size of the concatenated stream in bytes
    pub fn len(&self) -> u64 {
        self.table.total_size()
    }

    /// True if every source is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current logical position (never touches a source)
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Index of the source the cursor currently addresses
    pub fn current_source(&self) -> usize {
        self.current
    }

    /// Number of sources the stream was built from
    pub fn source_count(&self) -> usize {
        self.table.len()
    }

    /// Logical ranges of every source
    pub fn boundaries(&self) -> &BoundaryTable {
        &self.table
    }

    /// True once `close` ran or a fatal seek failure put the stream in a
    /// failed state
    pub fn is_closed(&self) -> bool {
        self.state != StreamState::Open
    }

    /// Move the cursor to `offset` relative to `origin`
    ///
    /// # Returns
    /// * The new absolute logical position
    ///
    /// # Clamping
    /// * A target past the end clamps to the end of the last source
    /// * A target before 0 clamps to the start of the first source
    ///
    /// # Errors
    /// * `Closed` if the stream is closed or failed
    /// * `InvalidArgument` for a positive offset from `End`
    /// * `SourceError` if positioning the target source fails; the stream is
    ///   unusable afterwards
    pub fn seek_from(&mut self, offset: i64, origin: Origin) -> Result<u64> {
        self.ensure_open()?;

        let candidate = match origin {
            Origin::Start => i128::from(offset),
            Origin::Current => {
                if offset == 0 {
                    return Ok(self.position);
                }
                i128::from(self.position) + i128::from(offset)
            }
            Origin::End => {
                if offset > 0 {
                    return Err(MultiSeekError::invalid_argument(format!(
                        "seek offset from end must be <= 0 (got {offset})"
                    )));
                }
                i128::from(self.table.total_size()) + i128::from(offset)
            }
        };

        self.reposition(candidate, origin)
    }

    /// Close every source
    ///
    /// All sources are closed even if some fail. Calling `close` again is a
    /// no-op returning `Ok(())`.
    ///
    /// # Errors
    /// * `Close` aggregating one `SourceError` per source that failed to close
    pub fn close(&mut self) -> Result<()> {
        if self.state == StreamState::Closed {
            return Ok(());
        }
        self.state = StreamState::Closed;
        self.pending_error = None;

        let errors: Vec<MultiSeekError> = self
            .sources
            .iter_mut()
            .enumerate()
            .filter_map(|(index, source)| {
                source
                    .close()
                    .err()
                    .map(|e| MultiSeekError::source(index, SourceOp::Close, e))
            })
            .collect();
        self.sources.clear();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(MultiSeekError::Close(errors))
        }
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            StreamState::Open => Ok(()),
            StreamState::Failed | StreamState::Closed => Err(MultiSeekError::Closed),
        }
    }

    /// Resolve `candidate` to a source, apply the clamp policy for `origin`,
    /// and position that source
    fn reposition(&mut self, candidate: i128, origin: Origin) -> Result<u64> {
        let total = self.table.total_size();

        let (index, target) = if candidate < 0 {
            (0, 0)
        } else {
            let resolved = u64::try_from(candidate)
                .ok()
                .and_then(|target| self.table.resolve(target).map(|index| (index, target)));
            resolved.unwrap_or((self.table.len() - 1, total))
        };

        let local = target - self.table.start_offset(index);
        if let Err(e) = self.sources[index].seek(SeekFrom::Start(local)) {
            self.state = StreamState::Failed;
            return Err(MultiSeekError::source(index, SourceOp::Seek, e));
        }

        log::trace!("seek {origin:?} -> logical {target} (source #{index}, local {local})");
        self.current = index;
        self.position = target;
        self.pending_error = None;
        Ok(target)
    }

    /// Fill `buf` from the current source onwards
    fn read_across(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.ensure_open()?;
        if let Some(err) = self.pending_error.take() {
            return Err(err);
        }

        let mut filled = 0;
        match self.fill(buf, &mut filled) {
            Ok(()) => Ok(filled),
            Err(err) if filled > 0 => {
                self.pending_error = Some(err);
                Ok(filled)
            }
            Err(err) => Err(err),
        }
    }

    fn fill(&mut self, buf: &mut [u8], filled: &mut usize) -> Result<()> {
        while *filled < buf.len() {
            let span = self.table.range(self.current);
            if self.position >= span.end {
                if !self.advance()? {
                    break;
                }
                continue;
            }

            // Never read past the surveyed extent, even if the source grew.
            let left_in_source = usize::try_from(span.end - self.position).unwrap_or(usize::MAX);
            let want = (buf.len() - *filled).min(left_in_source);

            match self.sources[self.current].read(&mut buf[*filled..*filled + want]) {
                Ok(0) => {
                    log::warn!(
                        "source #{} ended {} bytes before its surveyed size",
                        self.current,
                        span.end - self.position
                    );
                    if !self.advance()? {
                        break;
                    }
                }
                Ok(n) => {
                    *filled += n;
                    self.position += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(MultiSeekError::source(self.current, SourceOp::Read, e)),
            }
        }
        Ok(())
    }

    /// Step to the next non-empty source and rewind it
    ///
    /// Returns `false` when no further source holds data.
    fn advance(&mut self) -> Result<bool> {
        let Some(next) = self.table.next_non_empty(self.current) else {
            return Ok(false);
        };

        self.sources[next]
            .seek(SeekFrom::Start(0))
            .map_err(|e| MultiSeekError::source(next, SourceOp::Rewind, e))?;

        log::debug!("crossing from source #{} into source #{next}", self.current);
        self.current = next;
        self.position = self.table.start_offset(next);
        Ok(true)
    }
}

impl<S: Source> Read for MultiReadSeeker<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_across(buf)?)
    }
}

impl<S: Source> Seek for MultiReadSeeker<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let position = match pos {
            SeekFrom::Start(offset) => {
                self.ensure_open()?;
                self.reposition(i128::from(offset), Origin::Start)?
            }
            SeekFrom::Current(offset) => self.seek_from(offset, Origin::Current)?,
            SeekFrom::End(offset) => self.seek_from(offset, Origin::End)?,
        };
        Ok(position)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }
}

/// A stream can itself be one source of an outer stream.
impl<S: Source> Source for MultiReadSeeker<S> {
    fn close(&mut self) -> io::Result<()> {
        Ok(MultiReadSeeker::close(self)?)
    }
}

impl<S: Source> Drop for MultiReadSeeker<S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("closing stream on drop: {e}");
        }
    }
}

impl<S: Source> fmt::Debug for MultiReadSeeker<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiReadSeeker")
            .field("table", &self.table)
            .field("current", &self.current)
            .field("position", &self.position)
            .field("state", &self.state)
            .finish()
    }
}
