//! Genomic coordinates and interval restrictions.
//!
//! Positions are 1-based and regions are closed (`beg..=end`), as in VCF.

use crate::contig::ContigDictionary;
use crate::error::{Result, VcfError};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Synchronization key: contig id in header order, then position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locus {
    pub contig_id: usize,
    pub position: u64,
}

impl Locus {
    #[inline]
    pub fn new(contig_id: usize, position: u64) -> Self {
        Self {
            contig_id,
            position,
        }
    }
}

/// A requested region, `contig[:beg[-[end]]]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Region {
    pub contig: String,
    pub start: u64,
    pub end: u64,
}

impl Region {
    #[inline]
    pub fn new(contig: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            contig: contig.into(),
            start,
            end,
        }
    }

    /// The whole contig.
    pub fn contig(contig: impl Into<String>) -> Self {
        Self::new(contig, 1, u64::MAX)
    }

    #[inline]
    pub fn contains(&self, position: u64) -> bool {
        self.start <= position && position <= self.end
    }
}

impl FromStr for Region {
    type Err = VcfError;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim();
        let invalid = || VcfError::InvalidRegion(token.to_string());
        if token.is_empty() {
            return Err(invalid());
        }

        // Contig names may contain ':'; only a trailing numeric range is split off.
        let Some((contig, range)) = token.rsplit_once(':') else {
            return Ok(Region::contig(token));
        };
        if contig.is_empty() {
            return Err(invalid());
        }
        let (start, end) = match range.split_once('-') {
            Some((beg, "")) => (parse_position(beg).ok_or_else(invalid)?, u64::MAX),
            Some((beg, end)) => (
                parse_position(beg).ok_or_else(invalid)?,
                parse_position(end).ok_or_else(invalid)?,
            ),
            None => {
                let pos = parse_position(range).ok_or_else(invalid)?;
                (pos, pos)
            }
        };
        if start == 0 || end < start {
            return Err(invalid());
        }
        Ok(Region::new(contig, start, end))
    }
}

fn parse_position(text: &str) -> Option<u64> {
    crate::streaming::parse_u64_fast(text.as_bytes())
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (1, u64::MAX) => write!(f, "{}", self.contig),
            (s, u64::MAX) => write!(f, "{}:{}-", self.contig, s),
            (s, e) if s == e => write!(f, "{}:{}", self.contig, s),
            (s, e) => write!(f, "{}:{}-{}", self.contig, s, e),
        }
    }
}

/// Parse a comma-separated region list. An empty string means no restriction.
pub fn parse_regions(list: &str) -> Result<Vec<Region>> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }
    list.split(',').map(str::parse).collect()
}

/// A region bound to a header's contig ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRegion {
    pub contig_id: usize,
    pub start: u64,
    pub end: u64,
}

impl ResolvedRegion {
    /// Whether a record spanning `start..=end` on `contig_id` overlaps.
    #[inline]
    pub fn overlaps(&self, contig_id: usize, start: u64, end: u64) -> bool {
        self.contig_id == contig_id && start <= self.end && self.start <= end
    }

    /// Position of a record relative to this region.
    #[inline]
    pub fn compare(&self, locus: Locus) -> Ordering {
        match locus.contig_id.cmp(&self.contig_id) {
            Ordering::Equal if locus.position < self.start => Ordering::Less,
            Ordering::Equal if locus.position > self.end => Ordering::Greater,
            Ordering::Equal => Ordering::Equal,
            other => other,
        }
    }
}

/// Bind regions to contig ids, drop regions on undeclared contigs, then sort
/// and merge overlapping or adjacent regions.
pub fn resolve_regions(regions: &[Region], contigs: &ContigDictionary) -> Vec<ResolvedRegion> {
    let mut resolved: Vec<ResolvedRegion> = regions
        .iter()
        .filter_map(|r| {
            let contig_id = contigs.id(&r.contig)?;
            Some(ResolvedRegion {
                contig_id,
                start: r.start,
                end: r.end,
            })
        })
        .collect();
    resolved.sort_by(|a, b| a.contig_id.cmp(&b.contig_id).then(a.start.cmp(&b.start)));

    let mut merged: Vec<ResolvedRegion> = Vec::with_capacity(resolved.len());
    for region in resolved {
        match merged.last_mut() {
            Some(last)
                if last.contig_id == region.contig_id
                    && region.start <= last.end.saturating_add(1) =>
            {
                last.end = last.end.max(region.end);
            }
            _ => merged.push(region),
        }
    }
    merged
}
