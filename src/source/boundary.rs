//! Boundary table mapping each source to its logical byte range.
//!
//! The table is computed once when a stream is built and never changes.
//! Source `i` owns the logical bytes `start_offset(i)..=end_offset(i)`; the
//! ranges are contiguous, non-overlapping and cover `0..total_size()`.

use crate::error::{MultiSeekError, Result, SourceOp};
use crate::source::Source;
use std::io::SeekFrom;
use std::ops::Range;

/// Per-source logical ranges of a concatenated stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryTable {
    /// Half-open logical range of each source, in order. A zero-length
    /// source has an empty range starting where its successor starts.
    spans: Vec<Range<u64>>,
}

impl BoundaryTable {
    /// Build a table from source sizes, in order
    ///
    /// # Errors
    /// * `ConfigurationError` if `sizes` is empty or the total overflows `u64`
    pub fn from_sizes<I>(sizes: I) -> Result<Self>
    where
        I: IntoIterator<Item = u64>,
    {
        let mut spans = Vec::new();
        let mut next_start = 0u64;

        for (index, size) in sizes.into_iter().enumerate() {
            let end = next_start.checked_add(size).ok_or_else(|| {
                MultiSeekError::configuration(format!(
                    "total size overflows at source #{index} (0-based)"
                ))
            })?;
            spans.push(next_start..end);
            next_start = end;
        }

        if spans.is_empty() {
            return Err(MultiSeekError::configuration(
                "at least one source is required",
            ));
        }

        Ok(Self { spans })
    }

    /// Measure every source and build its table
    ///
    /// Each source is seeked to its end to learn its size and then rewound,
    /// so every source is left at its own position 0.
    ///
    /// # Errors
    /// * `ConfigurationError` if `sources` is empty
    /// * `SourceError` naming the first source whose end-seek or rewind failed
    pub fn survey<S: Source>(sources: &mut [S]) -> Result<Self> {
        if sources.is_empty() {
            return Err(MultiSeekError::configuration(
                "at least one source is required",
            ));
        }

        let mut sizes = Vec::with_capacity(sources.len());
        for (index, source) in sources.iter_mut().enumerate() {
            let size = source
                .seek(SeekFrom::End(0))
                .map_err(|e| MultiSeekError::source(index, SourceOp::SeekEnd, e))?;
            source
                .seek(SeekFrom::Start(0))
                .map_err(|e| MultiSeekError::source(index, SourceOp::Rewind, e))?;
            log::trace!("source #{index} measured at {size} bytes");
            sizes.push(size);
        }

        Self::from_sizes(sizes)
    }

    /// Number of sources described by the table
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Always false: a table describes at least one source
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Sum of all source sizes
    pub fn total_size(&self) -> u64 {
        self.spans.last().map_or(0, |span| span.end)
    }

    /// First logical byte belonging to source `index`
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn start_offset(&self, index: usize) -> u64 {
        self.spans[index].start
    }

    /// Last logical byte belonging to source `index` (inclusive)
    ///
    /// Returns `None` for a zero-length source, which owns no byte.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn end_offset(&self, index: usize) -> Option<u64> {
        let span = &self.spans[index];
        if span.is_empty() {
            None
        } else {
            Some(span.end - 1)
        }
    }

    /// Size in bytes of source `index`
    pub fn size(&self, index: usize) -> u64 {
        let span = &self.spans[index];
        span.end - span.start
    }

    /// Half-open logical range of source `index`
    pub fn range(&self, index: usize) -> Range<u64> {
        self.spans[index].clone()
    }

    /// Iterate over the half-open ranges of all sources, in order
    pub fn iter(&self) -> impl Iterator<Item = Range<u64>> + '_ {
        self.spans.iter().cloned()
    }

    /// Find the source holding logical byte `position`
    ///
    /// # Returns
    /// * `Some(index)` of the unique source with
    ///   `start_offset(index) <= position <= end_offset(index)`
    /// * `None` if `position >= total_size()`
    ///
    /// Zero-length sources are never returned.
    pub fn resolve(&self, position: u64) -> Option<usize> {
        // Span ends are non-decreasing, so the first span ending after
        // `position` is the one containing it.
        let index = self.spans.partition_point(|span| span.end <= position);
        (index < self.spans.len()).then_some(index)
    }

    /// Next source after `index` that owns at least one byte
    pub fn next_non_empty(&self, index: usize) -> Option<usize> {
        (index + 1..self.spans.len()).find(|&i| !self.spans[i].is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::{self, Cursor, Read, Seek};

    #[test]
    fn test_from_sizes_builds_contiguous_ranges() {
        let table = BoundaryTable::from_sizes([5, 3, 4]).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.total_size(), 12);
        assert_eq!(table.start_offset(0), 0);
        assert_eq!(table.end_offset(0), Some(4));
        assert_eq!(table.start_offset(1), 5);
        assert_eq!(table.end_offset(1), Some(7));
        assert_eq!(table.start_offset(2), 8);
        assert_eq!(table.end_offset(2), Some(11));
    }

    #[test]
    fn test_empty_size_list_is_configuration_error() {
        let result = BoundaryTable::from_sizes(std::iter::empty::<u64>());
        assert!(matches!(
            result,
            Err(MultiSeekError::ConfigurationError { .. })
        ));
    }

    #[test]
    fn test_total_size_overflow_is_rejected() {
        let result = BoundaryTable::from_sizes([u64::MAX, 1]);
        match result {
            Err(MultiSeekError::ConfigurationError { message }) => {
                assert!(message.contains("#1"));
            }
            other => panic!("Expected ConfigurationError, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_boundaries() {
        let table = BoundaryTable::from_sizes([5, 3, 4]).unwrap();

        assert_eq!(table.resolve(0), Some(0));
        assert_eq!(table.resolve(4), Some(0));
        assert_eq!(table.resolve(5), Some(1));
        assert_eq!(table.resolve(7), Some(1));
        assert_eq!(table.resolve(8), Some(2));
        assert_eq!(table.resolve(11), Some(2));
        assert_eq!(table.resolve(12), None);
        assert_eq!(table.resolve(u64::MAX), None);
    }

    #[test]
    fn test_zero_length_sources_are_never_resolved() {
        let table = BoundaryTable::from_sizes([0, 2, 0, 0, 3, 0]).unwrap();

        assert_eq!(table.total_size(), 5);
        assert_eq!(table.end_offset(0), None);
        assert_eq!(table.start_offset(2), 2);
        assert_eq!(table.end_offset(2), None);

        assert_eq!(table.resolve(0), Some(1));
        assert_eq!(table.resolve(1), Some(1));
        assert_eq!(table.resolve(2), Some(4));
        assert_eq!(table.resolve(4), Some(4));
        assert_eq!(table.resolve(5), None);

        assert_eq!(table.next_non_empty(1), Some(4));
        assert_eq!(table.next_non_empty(4), None);
    }

    #[test]
    fn test_all_zero_length_sources() {
        let table = BoundaryTable::from_sizes([0, 0]).unwrap();
        assert_eq!(table.total_size(), 0);
        assert_eq!(table.resolve(0), None);
        assert_eq!(table.next_non_empty(0), None);
    }

    #[test]
    fn test_survey_measures_and_rewinds() {
        let mut sources = vec![
            Cursor::new(b"ABCDE".to_vec()),
            Cursor::new(b"FGH".to_vec()),
            Cursor::new(b"IJKL".to_vec()),
        ];
        sources[0].set_position(3);
        sources[2].set_position(4);

        let table = BoundaryTable::survey(&mut sources).unwrap();

        assert_eq!(table, BoundaryTable::from_sizes([5, 3, 4]).unwrap());
        assert!(sources.iter().all(|s| s.position() == 0));
    }

    #[test]
    fn test_survey_names_failing_source() {
        struct Unseekable;

        impl Read for Unseekable {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Ok(0)
            }
        }

        impl Seek for Unseekable {
            fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
                Err(io::Error::new(io::ErrorKind::Unsupported, "pipe"))
            }
        }

        impl Source for Unseekable {
            fn close(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut sources: Vec<Box<dyn Source>> = vec![
            Box::new(Cursor::new(vec![1u8, 2, 3])),
            Box::new(Unseekable),
        ];

        match BoundaryTable::survey(&mut sources) {
            Err(MultiSeekError::SourceError { index, op, source }) => {
                assert_eq!(index, 1);
                assert_eq!(op, SourceOp::SeekEnd);
                assert_eq!(source.kind(), io::ErrorKind::Unsupported);
            }
            other => panic!("Expected SourceError, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn prop_ranges_are_contiguous(sizes in prop::collection::vec(0u64..10_000, 1..16)) {
            let table = BoundaryTable::from_sizes(sizes.iter().copied()).unwrap();

            prop_assert_eq!(table.total_size(), sizes.iter().sum::<u64>());
            prop_assert_eq!(table.start_offset(0), 0);
            let ranges: Vec<_> = table.iter().collect();
            for pair in ranges.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
            }
            for (index, size) in sizes.iter().enumerate() {
                prop_assert_eq!(table.size(index), *size);
            }
        }

        #[test]
        fn prop_resolve_finds_owning_source(
            sizes in prop::collection::vec(0u64..64, 1..12),
            offset in 0u64..1024,
        ) {
            let table = BoundaryTable::from_sizes(sizes.iter().copied()).unwrap();

            match table.resolve(offset) {
                Some(index) => {
                    prop_assert!(table.range(index).contains(&offset));
                }
                None => prop_assert!(offset >= table.total_size()),
            }
        }
    }
}
