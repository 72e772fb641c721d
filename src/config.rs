//! Reader configuration.
//!
//! Options are fixed when a source is created and read on every record, so
//! they are plain values rather than global state.

use crate::streaming::buffers::{input_buffer_size, DEFAULT_LINE_BUFFER};

/// How a record is matched against a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapMode {
    /// Any base of the record's reference span lies in the region.
    #[default]
    Record,
    /// The record's POS lies in the region.
    Position,
}

impl OverlapMode {
    /// Whether a record spanning `start..=end` falls in `region_start..=region_end`.
    #[inline]
    pub fn matches(self, start: u64, end: u64, region_start: u64, region_end: u64) -> bool {
        match self {
            OverlapMode::Record => start <= region_end && region_start <= end,
            OverlapMode::Position => region_start <= start && start <= region_end,
        }
    }
}

/// Options shared by every source of a reader.
///
/// # Example
///
/// ```
/// use varsync::config::{OverlapMode, ReaderOptions};
///
/// let options = ReaderOptions::new()
///     .low_memory(true)
///     .validate_sort(true)
///     .overlap(OverlapMode::Position);
/// assert!(options.validates_sort());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    input_buffer: usize,
    line_buffer: usize,
    require_index: bool,
    validate_sort: bool,
    overlap: OverlapMode,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            input_buffer: input_buffer_size(false),
            line_buffer: DEFAULT_LINE_BUFFER,
            require_index: false,
            validate_sort: false,
            overlap: OverlapMode::Record,
        }
    }
}

impl ReaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input buffer size per source, in bytes.
    pub fn input_buffer(mut self, bytes: usize) -> Self {
        self.input_buffer = bytes.max(1);
        self
    }

    /// Use the small buffer preset.
    pub fn low_memory(mut self, enabled: bool) -> Self {
        self.input_buffer = input_buffer_size(enabled);
        self
    }

    /// Fail with `MissingIndex` even when no region restriction is requested.
    pub fn require_index(mut self, enabled: bool) -> Self {
        self.require_index = enabled;
        self
    }

    /// Check sort order while reading; out-of-order records fail with `Unsorted`.
    pub fn validate_sort(mut self, enabled: bool) -> Self {
        self.validate_sort = enabled;
        self
    }

    /// How records are matched against regions.
    pub fn overlap(mut self, mode: OverlapMode) -> Self {
        self.overlap = mode;
        self
    }

    /// Read buffer size in bytes.
    pub fn input_buffer_size(&self) -> usize {
        self.input_buffer
    }

    /// Initial capacity of the per-line buffer.
    pub fn line_buffer_size(&self) -> usize {
        self.line_buffer
    }

    /// Whether opening fails without an index sidecar.
    pub fn requires_index(&self) -> bool {
        self.require_index
    }

    /// Whether records are checked for coordinate order.
    pub fn validates_sort(&self) -> bool {
        self.validate_sort
    }

    pub fn overlap_mode(&self) -> OverlapMode {
        self.overlap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::buffers::{DEFAULT_INPUT_BUFFER, LOW_MEMORY_INPUT_BUFFER};

    #[test]
    fn test_defaults() {
        let options = ReaderOptions::default();
        assert_eq!(options.input_buffer_size(), DEFAULT_INPUT_BUFFER);
        assert!(!options.requires_index());
        assert!(!options.validates_sort());
        assert_eq!(options.overlap_mode(), OverlapMode::Record);
    }

    #[test]
    fn test_low_memory() {
        let options = ReaderOptions::new().low_memory(true);
        assert_eq!(options.input_buffer_size(), LOW_MEMORY_INPUT_BUFFER);
        assert_eq!(options.input_buffer(0).input_buffer_size(), 1);
    }

    #[test]
    fn test_overlap_modes() {
        // Deletion at 95 spanning 95..=104 against region 100..=200.
        assert!(OverlapMode::Record.matches(95, 104, 100, 200));
        assert!(!OverlapMode::Position.matches(95, 104, 100, 200));
        assert!(OverlapMode::Position.matches(100, 100, 100, 200));
        assert!(!OverlapMode::Record.matches(201, 201, 100, 200));
    }
}
