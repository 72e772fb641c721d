//! Ordered contig dictionary.
//!
//! Contig ids are positions in header declaration order; synchronized reading
//! compares records by id, so two files are only comparable when their
//! dictionaries agree.

use rustc_hash::FxHashMap;

/// One declared contig.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contig {
    pub name: String,
    pub length: Option<u64>,
}

/// Contigs in declaration order with name lookup.
#[derive(Debug, Clone, Default)]
pub struct ContigDictionary {
    contigs: Vec<Contig>,
    ids: FxHashMap<String, usize>,
}

impl ContigDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a contig, returning its id. Re-declaring a contig keeps its
    /// original position and fills in a missing length.
    pub fn insert(&mut self, name: impl Into<String>, length: Option<u64>) -> usize {
        let name = name.into();
        if let Some(&id) = self.ids.get(&name) {
            if self.contigs[id].length.is_none() {
                self.contigs[id].length = length;
            }
            return id;
        }
        let id = self.contigs.len();
        self.ids.insert(name.clone(), id);
        self.contigs.push(Contig { name, length });
        id
    }

    #[inline]
    pub fn id(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    #[inline]
    pub fn name(&self, id: usize) -> Option<&str> {
        self.contigs.get(id).map(|c| c.name.as_str())
    }

    #[inline]
    pub fn length(&self, id: usize) -> Option<u64> {
        self.contigs.get(id).and_then(|c| c.length)
    }

    /// Whether `name` is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    /// Contigs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Contig> {
        self.contigs.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.contigs.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    /// Describe the first disagreement with `other`, or `None` when both declare
    /// the same contigs in the same order with no conflicting lengths.
    pub fn mismatch(&self, other: &ContigDictionary) -> Option<String> {
        for (i, (a, b)) in self.contigs.iter().zip(other.contigs.iter()).enumerate() {
            if a.name != b.name {
                return Some(format!(
                    "contig #{} is '{}' in one header and '{}' in the other",
                    i + 1,
                    a.name,
                    b.name
                ));
            }
            if let (Some(la), Some(lb)) = (a.length, b.length) {
                if la != lb {
                    return Some(format!(
                        "contig '{}' has length {} in one header and {} in the other",
                        a.name, la, lb
                    ));
                }
            }
        }
        if self.len() != other.len() {
            return Some(format!(
                "headers declare {} and {} contigs",
                self.len(),
                other.len()
            ));
        }
        None
    }
}
