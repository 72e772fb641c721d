//! Linear coordinate index for seeking into sorted variant files.
//!
//! Each contig is cut into fixed windows of `1 << LINEAR_SHIFT` bases. A window
//! stores the smallest byte offset of any record whose reference span overlaps
//! it, so a query only has to look at the window holding its start.
//! Indexes are persisted as a JSON sidecar next to the data file.

use crate::error::{Result, VcfError};
use crate::header::VariantHeader;
use crate::interval::{Locus, Region};
use crate::streaming::parsing::{parse_record_span, should_skip_line, trim_line_end};
use crate::streaming::SortValidator;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Window size is `1 << LINEAR_SHIFT` bases (16 kbp).
pub const LINEAR_SHIFT: u32 = 14;

/// Extension appended to the data file name for the sidecar.
pub const INDEX_EXTENSION: &str = "vsi";

/// Sidecar format version.
pub const INDEX_VERSION: &str = "1";

/// One record as seen by the index builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub contig: String,
    /// 1-based first reference base.
    pub start: u64,
    /// 1-based last reference base.
    pub end: u64,
    /// Byte offset of the record line.
    pub offset: u64,
}

/// Linear index of one contig.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContigIndex {
    pub name: String,
    /// Smallest first base of any record.
    pub min_start: u64,
    /// Largest last base of any record.
    pub max_end: u64,
    /// Per-window smallest record offset; empty windows inherit the previous one.
    pub windows: Vec<u64>,
}

impl ContigIndex {
    fn new(name: String) -> Self {
        Self {
            name,
            min_start: u64::MAX,
            max_end: 0,
            windows: Vec::new(),
        }
    }

    /// Seek offset for a query starting at `start`, if any record can overlap
    /// `start..=end`.
    pub fn candidate(&self, start: u64, end: u64) -> Option<u64> {
        if self.windows.is_empty() || end < self.min_start || start > self.max_end {
            return None;
        }
        let window = window_of(start.max(self.min_start)).min(self.windows.len() - 1);
        Some(self.windows[window])
    }
}

#[inline]
fn window_of(position: u64) -> usize {
    (position.saturating_sub(1) >> LINEAR_SHIFT) as usize
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexData {
    version: String,
    data_offset: u64,
    contigs: Vec<ContigIndex>,
}

/// Queryable index of one sorted variant file.
///
/// Read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct GenomicIndex {
    data_offset: u64,
    contigs: Vec<ContigIndex>,
    by_name: FxHashMap<String, usize>,
}

impl GenomicIndex {
    /// Build from record entries in file order. `data_offset` is the offset of
    /// the first byte after the header.
    pub fn build(entries: impl IntoIterator<Item = IndexEntry>, data_offset: u64) -> Self {
        let mut index = Self {
            data_offset,
            ..Self::default()
        };
        let mut slots: Vec<Vec<Option<u64>>> = Vec::new();

        for entry in entries {
            let id = match index.by_name.get(&entry.contig) {
                Some(&id) => id,
                None => {
                    let id = index.contigs.len();
                    index.by_name.insert(entry.contig.clone(), id);
                    index.contigs.push(ContigIndex::new(entry.contig));
                    slots.push(Vec::new());
                    id
                }
            };
            let contig = &mut index.contigs[id];
            contig.min_start = contig.min_start.min(entry.start);
            contig.max_end = contig.max_end.max(entry.end);

            let windows = &mut slots[id];
            let last = window_of(entry.end.max(entry.start));
            if windows.len() <= last {
                windows.resize(last + 1, None);
            }
            for slot in &mut windows[window_of(entry.start)..=last] {
                *slot = Some(slot.map_or(entry.offset, |o| o.min(entry.offset)));
            }
        }

        for (contig, windows) in index.contigs.iter_mut().zip(slots) {
            let first = windows.iter().flatten().copied().next().unwrap_or(data_offset);
            let mut previous = first;
            contig.windows = windows
                .into_iter()
                .map(|slot| {
                    previous = slot.unwrap_or(previous);
                    previous
                })
                .collect();
        }
        index
    }

    /// Index a file with one sequential scan. Fails with `Unsorted` if records
    /// are out of header order.
    pub fn scan(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| VcfError::FileOpen {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut reader = BufReader::new(file);
        let (header, data_offset) = VariantHeader::read_from(&mut reader)?;

        let mut validator = SortValidator::new();
        let mut entries = Vec::new();
        let mut offset = data_offset;
        let mut line = Vec::with_capacity(1024);
        loop {
            line.clear();
            let n = reader.read_until(b'\n', &mut line)?;
            if n == 0 {
                break;
            }
            let record = trim_line_end(&line);
            if !should_skip_line(record) {
                let (chrom, start, end) = parse_record_span(record)
                    .ok_or_else(|| VcfError::malformed(offset, "cannot read CHROM, POS and REF, or POS out of range"))?;
                let chrom = std::str::from_utf8(chrom)
                    .map_err(|_| VcfError::malformed(offset, "CHROM is not UTF-8"))?;
                let contig_id = header.contigs().id(chrom).ok_or_else(|| {
                    VcfError::malformed(offset, format!("contig '{}' is not declared in the header", chrom))
                })?;
                validator.validate(Locus::new(contig_id, start), chrom, path)?;
                entries.push(IndexEntry {
                    contig: chrom.to_string(),
                    start,
                    end,
                    offset,
                });
            }
            offset += n as u64;
        }

        let index = Self::build(entries, data_offset);
        info!(
            path = %path.display(),
            records = validator.record_count(),
            contigs = index.contigs.len(),
            "built index"
        );
        Ok(index)
    }

    /// Offset of the first record.
    pub fn query_all(&self) -> u64 {
        self.data_offset
    }

    /// Candidate seek offsets for `region`, ascending. Empty when the contig is
    /// not indexed or no record can overlap.
    pub fn query(&self, region: &Region) -> Vec<u64> {
        self.contig(&region.contig)
            .and_then(|c| c.candidate(region.start, region.end))
            .into_iter()
            .collect()
    }

    /// Union of the candidate offsets of every region, ascending and deduplicated.
    pub fn query_regions(&self, regions: &[Region]) -> Vec<u64> {
        let mut offsets: Vec<u64> = regions.iter().flat_map(|r| self.query(r)).collect();
        offsets.sort_unstable();
        offsets.dedup();
        offsets
    }

    /// Index of contig `name`.
    pub fn contig(&self, name: &str) -> Option<&ContigIndex> {
        self.by_name.get(name).map(|&id| &self.contigs[id])
    }

    /// Indexed contigs in file order.
    pub fn contigs(&self) -> &[ContigIndex] {
        &self.contigs
    }

    /// Serialize to the sidecar format.
    pub fn to_json(&self) -> Result<String> {
        let data = IndexData {
            version: INDEX_VERSION.to_string(),
            data_offset: self.data_offset,
            contigs: self.contigs.clone(),
        };
        Ok(serde_json::to_string(&data)?)
    }

    /// Load from sidecar text. A version mismatch is logged, not rejected.
    pub fn from_json(json: &str) -> Result<Self> {
        let data: IndexData = serde_json::from_str(json)?;
        if data.version != INDEX_VERSION {
            tracing::warn!(
                expected = INDEX_VERSION,
                found = %data.version,
                "index version mismatch"
            );
        }
        let by_name = data
            .contigs
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Ok(Self {
            data_offset: data.data_offset,
            contigs: data.contigs,
            by_name,
        })
    }

    /// Write the index to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(self.to_json()?.as_bytes())?;
        out.flush()?;
        debug!(path = %path.display(), "wrote index");
        Ok(())
    }
}

/// Sidecar path for a data file: `<file>.vsi`.
pub fn index_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(INDEX_EXTENSION);
    PathBuf::from(name)
}

/// Load the sidecar index of `path`; `None` when there is none.
pub fn read_index(path: &Path) -> Result<Option<GenomicIndex>> {
    let sidecar = index_path_for(path);
    let json = match std::fs::read_to_string(&sidecar) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    debug!(path = %sidecar.display(), "loaded index");
    GenomicIndex::from_json(&json).map(Some)
}
