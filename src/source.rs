//! One sorted variant file read in coordinate order.
//!
//! A [`RecordSource`] moves through `Unopened -> Positioned -> AtRecord`, ending
//! in `Exhausted` or, after any fatal error, `Errored`. With a region
//! restriction it seeks through the file's [`GenomicIndex`] to the first
//! candidate record of each region and yields only overlapping records, each
//! at most once.

use crate::config::ReaderOptions;
use crate::error::{Result, VcfError};
use crate::header::VariantHeader;
use crate::index::{read_index, GenomicIndex};
use crate::interval::{resolve_regions, Locus, Region, ResolvedRegion};
use crate::record::VariantRecord;
use crate::streaming::parsing::{should_skip_line, trim_line_end};
use crate::streaming::SortValidator;
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, warn};

/// Lifecycle of a [`RecordSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Unopened,
    Positioned,
    AtRecord,
    Exhausted,
    Errored,
}

/// Where a record lies relative to the current region.
enum Placement {
    Before,
    Inside,
    After,
}

/// Sequential, optionally region-restricted reader over one file.
#[derive(Debug)]
pub struct RecordSource {
    path: PathBuf,
    options: ReaderOptions,
    state: SourceState,
    reader: Option<BufReader<File>>,
    header: Option<Rc<VariantHeader>>,
    index: Option<GenomicIndex>,
    file_len: u64,
    /// Offset of the next unread byte.
    cursor: u64,
    line: Vec<u8>,
    /// `None` reads the whole file.
    regions: Option<Vec<ResolvedRegion>>,
    region_idx: usize,
    region_positioned: bool,
    /// Record read past the end of the previous region.
    lookahead: Option<VariantRecord>,
    /// Next record to hand out.
    head: Option<VariantRecord>,
    last_emitted: Option<u64>,
    validator: SortValidator,
}

impl RecordSource {
    /// A source for `path`; nothing is read until [`RecordSource::open`].
    pub fn new(path: impl AsRef<Path>, options: ReaderOptions) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            options,
            state: SourceState::Unopened,
            reader: None,
            header: None,
            index: None,
            file_len: 0,
            cursor: 0,
            line: Vec::with_capacity(options.line_buffer_size()),
            regions: None,
            region_idx: 0,
            region_positioned: false,
            lookahead: None,
            head: None,
            last_emitted: None,
            validator: SortValidator::new(),
        }
    }

    /// Create and open a source in one step.
    pub fn open_path(path: impl AsRef<Path>, regions: &[Region], options: ReaderOptions) -> Result<Self> {
        let mut source = Self::new(path, options);
        source.open(regions)?;
        Ok(source)
    }

    /// Open the file, read its header and position at the first record.
    ///
    /// A non-empty `regions` restricts reading and requires an index.
    pub fn open(&mut self, regions: &[Region]) -> Result<()> {
        if self.state != SourceState::Unopened {
            return Err(self.invalid_state());
        }
        let opened = self.open_inner(regions);
        self.track(opened)
    }

    fn open_inner(&mut self, regions: &[Region]) -> Result<()> {
        let file = File::open(&self.path).map_err(|e| self.open_error(e.to_string()))?;
        self.file_len = file.metadata()?.len();
        let mut reader = BufReader::with_capacity(self.options.input_buffer_size(), file);
        let (header, data_offset) = VariantHeader::read_from(&mut reader)
            .map_err(|e| self.open_error(format!("not a readable VCF file: {}", e)))?;
        self.cursor = data_offset;

        self.index = read_index(&self.path)?;
        if self.index.is_none() && (!regions.is_empty() || self.options.requires_index()) {
            return Err(VcfError::MissingIndex {
                path: self.path.clone(),
            });
        }

        if regions.is_empty() {
            if let Some(start) = self.index.as_ref().map(GenomicIndex::query_all) {
                self.check_offset(start)?;
                if start != self.cursor {
                    reader.seek(SeekFrom::Start(start))?;
                    self.cursor = start;
                }
            }
        } else {
            for region in regions.iter().filter(|r| !header.contigs().contains(&r.contig)) {
                warn!(path = %self.path.display(), region = %region, "region contig not in header");
            }
            let resolved = match &self.index {
                Some(index) if index.query_regions(regions).is_empty() => {
                    debug!(path = %self.path.display(), "no indexed records in any region");
                    Vec::new()
                }
                _ => resolve_regions(regions, header.contigs()),
            };
            self.regions = Some(resolved);
        }

        debug!(
            path = %self.path.display(),
            samples = header.sample_count(),
            regions = regions.len(),
            indexed = self.index.is_some(),
            "opened record source"
        );
        self.reader = Some(reader);
        self.header = Some(Rc::new(header));
        self.state = SourceState::Positioned;
        Ok(())
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SourceState {
        self.state
    }

    /// The header, once opened.
    pub fn header(&self) -> Option<&Rc<VariantHeader>> {
        self.header.as_ref()
    }

    /// The loaded index sidecar, if the file has one.
    pub fn index(&self) -> Option<&GenomicIndex> {
        self.index.as_ref()
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// The next record in coordinate order, or `None` once exhausted.
    pub fn next_record(&mut self) -> Result<Option<VariantRecord>> {
        self.ensure_readable()?;
        let filled = self.fill_head();
        self.track(filled)?;
        match self.head.take() {
            Some(record) => {
                self.state = SourceState::AtRecord;
                Ok(Some(record))
            }
            None => {
                self.state = SourceState::Exhausted;
                Ok(None)
            }
        }
    }

    /// The next record without consuming it.
    pub fn peek(&mut self) -> Result<Option<&VariantRecord>> {
        self.ensure_readable()?;
        let filled = self.fill_head();
        self.track(filled)?;
        if self.head.is_none() {
            self.state = SourceState::Exhausted;
        }
        Ok(self.head.as_ref())
    }

    /// Coordinate of the next record without consuming it.
    pub fn current_coordinate(&mut self) -> Result<Option<Locus>> {
        Ok(self.peek()?.map(VariantRecord::locus))
    }

    fn ensure_readable(&self) -> Result<()> {
        match self.state {
            SourceState::Unopened | SourceState::Errored => Err(self.invalid_state()),
            _ => Ok(()),
        }
    }

    fn fill_head(&mut self) -> Result<()> {
        if self.head.is_some() || self.state == SourceState::Exhausted {
            return Ok(());
        }
        let record = if self.regions.is_some() {
            self.next_in_regions()?
        } else {
            self.read_record()?
        };
        if let Some(record) = &record {
            if self.options.validates_sort() {
                self.validator
                    .validate(record.locus(), record.contig(), &self.path)?;
            }
            self.last_emitted = record.offset();
        }
        self.head = record;
        Ok(())
    }

    fn next_in_regions(&mut self) -> Result<Option<VariantRecord>> {
        loop {
            let Some(region) = self
                .regions
                .as_ref()
                .and_then(|r| r.get(self.region_idx))
                .copied()
            else {
                self.lookahead = None;
                return Ok(None);
            };

            if !self.region_positioned && !self.position_at(&region)? {
                self.region_idx += 1;
                continue;
            }

            let record = match self.lookahead.take() {
                Some(record) => record,
                None => match self.read_record()? {
                    Some(record) => record,
                    None => return Ok(None),
                },
            };
            if matches!((record.offset(), self.last_emitted), (Some(o), Some(last)) if o <= last) {
                continue;
            }
            match self.place(&record, &region) {
                Placement::Before => continue,
                Placement::Inside => return Ok(Some(record)),
                Placement::After => {
                    self.lookahead = Some(record);
                    self.region_idx += 1;
                    self.region_positioned = false;
                }
            }
        }
    }

    /// Seek to the first candidate record of `region`. Returns false when the
    /// index has no candidate for it.
    fn position_at(&mut self, region: &ResolvedRegion) -> Result<bool> {
        let candidate = match (&self.index, &self.header) {
            (Some(index), Some(header)) => header
                .contigs()
                .name(region.contig_id)
                .and_then(|name| index.query(&Region::new(name, region.start, region.end)).first().copied()),
            _ => None,
        };
        let Some(candidate) = candidate else {
            return Ok(false);
        };
        self.check_offset(candidate)?;

        // A record already read past the previous region is reused when the
        // candidate does not lie after it.
        let reuse = matches!(self.lookahead.as_ref().and_then(VariantRecord::offset), Some(o) if o >= candidate);
        if !reuse {
            self.lookahead = None;
            if candidate != self.cursor {
                if let Some(reader) = self.reader.as_mut() {
                    reader.seek(SeekFrom::Start(candidate))?;
                }
                debug!(path = %self.path.display(), offset = candidate, "seek");
                self.cursor = candidate;
            }
        }
        self.region_positioned = true;
        Ok(true)
    }

    fn place(&self, record: &VariantRecord, region: &ResolvedRegion) -> Placement {
        match region.compare(record.locus()) {
            Ordering::Greater => Placement::After,
            Ordering::Equal => Placement::Inside,
            Ordering::Less if record.contig_id() != region.contig_id => Placement::Before,
            Ordering::Less => {
                if self
                    .options
                    .overlap_mode()
                    .matches(record.position(), record.end(), region.start, region.end)
                {
                    Placement::Inside
                } else {
                    Placement::Before
                }
            }
        }
    }

    /// Read and decode the next record line.
    fn read_record(&mut self) -> Result<Option<VariantRecord>> {
        let header = match &self.header {
            Some(header) => Rc::clone(header),
            None => return Err(self.invalid_state()),
        };
        let Some(reader) = self.reader.as_mut() else {
            return Err(self.invalid_state());
        };
        loop {
            self.line.clear();
            let start = self.cursor;
            let n = reader.read_until(b'\n', &mut self.line)?;
            if n == 0 {
                return Ok(None);
            }
            self.cursor += n as u64;
            let line = trim_line_end(&self.line);
            if should_skip_line(line) {
                continue;
            }
            return VariantRecord::parse(line, &header, start).map(Some);
        }
    }

    fn check_offset(&self, offset: u64) -> Result<()> {
        if offset > self.file_len {
            return Err(VcfError::malformed(
                offset,
                format!(
                    "index points past the end of {} ({} bytes)",
                    self.path.display(),
                    self.file_len
                ),
            ));
        }
        Ok(())
    }

    /// Move to `Errored` when `result` is a fatal error.
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_fatal() {
                self.state = SourceState::Errored;
                self.head = None;
                self.lookahead = None;
            }
        }
        result
    }

    fn invalid_state(&self) -> VcfError {
        VcfError::InvalidState {
            path: self.path.clone(),
            state: self.state,
        }
    }

    fn open_error(&self, message: String) -> VcfError {
        VcfError::FileOpen {
            path: self.path.clone(),
            message,
        }
    }
}

/// Yields records until exhausted; a fatal error is yielded once, then the
/// iterator ends.
impl Iterator for RecordSource {
    type Item = Result<VariantRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == SourceState::Errored {
            return None;
        }
        self.next_record().transpose()
    }
}
