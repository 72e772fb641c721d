//! Position-synchronized iteration over several sorted variant files.
//!
//! Each step takes the smallest pending coordinate across all sources and
//! consumes one record from every source positioned there. Sources with
//! nothing at that coordinate are reported as missing in the row.

use crate::config::ReaderOptions;
use crate::error::{Result, VcfError};
use crate::header::VariantHeader;
use crate::interval::{parse_regions, Locus, Region};
use crate::record::VariantRecord;
use crate::source::{RecordSource, SourceState};
use std::path::Path;
use std::rc::Rc;
use tracing::debug;

/// One synchronized coordinate: a slot per source, `None` where the source has
/// no record at this coordinate.
#[derive(Debug, Clone)]
pub struct SyncedRow {
    locus: Locus,
    records: Vec<Option<VariantRecord>>,
}

impl SyncedRow {
    /// Coordinate shared by every present record.
    pub fn locus(&self) -> Locus {
        self.locus
    }

    /// Contig index in the shared header order.
    pub fn contig_id(&self) -> usize {
        self.locus.contig_id
    }

    /// Contig name, from the first present record.
    pub fn contig(&self) -> &str {
        self.records
            .iter()
            .flatten()
            .next()
            .map(VariantRecord::contig)
            .unwrap_or_default()
    }

    /// 1-based position.
    pub fn position(&self) -> u64 {
        self.locus.position
    }

    /// Number of sources (present or missing).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record of source `i`, if present.
    pub fn get(&self, i: usize) -> Option<&VariantRecord> {
        self.records.get(i).and_then(Option::as_ref)
    }

    /// Whether source `i` has no record at this coordinate.
    pub fn is_missing(&self, i: usize) -> bool {
        self.get(i).is_none()
    }

    /// Present records with their source index.
    pub fn present(&self) -> impl Iterator<Item = (usize, &VariantRecord)> {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().map(|r| (i, r)))
    }

    /// Number of sources with a record at this coordinate.
    pub fn present_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_some()).count()
    }

    /// One slot per source, in source order.
    pub fn records(&self) -> &[Option<VariantRecord>] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Option<VariantRecord>> {
        self.records
    }
}

/// K-way coordinate merge over opened [`RecordSource`]s.
///
/// # Example
///
/// ```no_run
/// use varsync::SyncedReader;
///
/// let reader = SyncedReader::open(&["a.vcf", "b.vcf"], "chr1:1000-2000")?;
/// for row in reader {
///     let row = row?;
///     println!("{}:{} in {} files", row.contig(), row.position(), row.present_count());
/// }
/// # Ok::<(), varsync::VcfError>(())
/// ```
#[derive(Debug)]
pub struct SyncedReader {
    sources: Vec<RecordSource>,
    finished: bool,
    rows: u64,
}

impl SyncedReader {
    /// Open every path with the comma-separated `regions` restriction (empty
    /// for none).
    pub fn open<P: AsRef<Path>>(paths: &[P], regions: &str) -> Result<Self> {
        Self::with_options(paths, regions, ReaderOptions::default())
    }

    /// Open `paths` with custom reader options.
    pub fn with_options<P: AsRef<Path>>(paths: &[P], regions: &str, options: ReaderOptions) -> Result<Self> {
        let regions = parse_regions(regions)?;
        Self::with_regions(paths, &regions, options)
    }

    /// Open `paths` restricted to already parsed regions.
    pub fn with_regions<P: AsRef<Path>>(paths: &[P], regions: &[Region], options: ReaderOptions) -> Result<Self> {
        let sources = paths
            .iter()
            .map(|p| RecordSource::open_path(p, regions, options))
            .collect::<Result<Vec<_>>>()?;
        Self::from_sources(sources)
    }

    /// Synchronize already opened sources. Fails with `HeaderMismatch` when
    /// the sources disagree on their contigs; no record is read.
    pub fn from_sources(sources: Vec<RecordSource>) -> Result<Self> {
        for source in &sources {
            if source.state() != SourceState::Positioned {
                return Err(VcfError::InvalidState {
                    path: source.path().to_path_buf(),
                    state: source.state(),
                });
            }
        }
        if let Some((first, rest)) = sources.split_first() {
            let Some(first_header) = first.header() else {
                return Err(VcfError::InvalidState {
                    path: first.path().to_path_buf(),
                    state: first.state(),
                });
            };
            for other in rest {
                let mismatch = other
                    .header()
                    .and_then(|h| first_header.contigs().mismatch(h.contigs()));
                if let Some(message) = mismatch {
                    return Err(VcfError::HeaderMismatch {
                        first: first.path().to_path_buf(),
                        other: other.path().to_path_buf(),
                        message,
                    });
                }
            }
        }
        debug!(sources = sources.len(), "synchronizing sources");
        Ok(Self {
            sources,
            finished: false,
            rows: 0,
        })
    }

    /// The underlying sources, in input order.
    pub fn sources(&self) -> &[RecordSource] {
        &self.sources
    }

    /// Number of input files; every row has this many slots.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Header of the first source.
    pub fn header(&self) -> Option<&Rc<VariantHeader>> {
        self.sources.first().and_then(RecordSource::header)
    }

    /// Rows emitted so far.
    pub fn rows_emitted(&self) -> u64 {
        self.rows
    }

    /// The next synchronized row, or `None` once every source is exhausted.
    /// After an error no further rows are produced.
    pub fn next_row(&mut self) -> Result<Option<SyncedRow>> {
        if self.finished {
            return Ok(None);
        }
        let step = self.step();
        match &step {
            Ok(Some(_)) => self.rows += 1,
            Ok(None) => {
                self.finished = true;
                debug!(rows = self.rows, "synchronized reading finished");
            }
            Err(_) => self.finished = true,
        }
        step
    }

    fn step(&mut self) -> Result<Option<SyncedRow>> {
        let heads = self
            .sources
            .iter_mut()
            .map(RecordSource::current_coordinate)
            .collect::<Result<Vec<_>>>()?;
        let Some(min) = heads.iter().flatten().min().copied() else {
            return Ok(None);
        };

        let mut records = Vec::with_capacity(self.sources.len());
        for (source, head) in self.sources.iter_mut().zip(&heads) {
            let record = if *head == Some(min) {
                source.next_record()?
            } else {
                None
            };
            records.push(record);
        }
        Ok(Some(SyncedRow { locus: min, records }))
    }
}

impl Iterator for SyncedReader {
    type Item = Result<SyncedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}
