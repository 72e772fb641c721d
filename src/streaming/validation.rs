//! Sort validation for streaming operations.
//!
//! Synchronized reading requires every input to be sorted by contig (in header
//! declaration order) and then by position. Validation is done inline, on the
//! records as they are read, so the file is never read twice.

use crate::error::{Result, VcfError};
use crate::interval::Locus;
use std::path::Path;

/// Inline header-order validator for use within streaming loops.
///
/// Validates that:
/// 1. Contigs appear in the order they are declared in the header
/// 2. Within a contig, positions are non-decreasing
#[derive(Debug, Default, Clone)]
pub struct SortValidator {
    prev: Option<Locus>,
    record_count: usize,
}

impl SortValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `locus` does not come before the previously validated one.
    ///
    /// `contig` is the name of `locus.contig_id`, used only in the error message.
    #[inline]
    pub fn validate(&mut self, locus: Locus, contig: &str, path: &Path) -> Result<()> {
        self.record_count += 1;

        if let Some(prev) = self.prev {
            if locus.contig_id < prev.contig_id {
                return Err(VcfError::Unsorted {
                    path: path.to_path_buf(),
                    message: format!(
                        "contig '{}' at record {} is declared before the previous record's contig",
                        contig, self.record_count
                    ),
                });
            }
            if locus.contig_id == prev.contig_id && locus.position < prev.position {
                return Err(VcfError::Unsorted {
                    path: path.to_path_buf(),
                    message: format!(
                        "position {} at record {} comes after {} on {}",
                        locus.position, self.record_count, prev.position, contig
                    ),
                });
            }
        }

        self.prev = Some(locus);
        Ok(())
    }

    /// Number of records validated so far.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Last validated coordinate.
    pub fn last(&self) -> Option<Locus> {
        self.prev
    }
}
