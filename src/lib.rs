// Clippy allows for the whole crate
#![allow(clippy::too_many_arguments)]

//! varsync: position-synchronized reading of sorted variant files
//!
//! This library merges several coordinate-sorted, indexed VCF files into one
//! stream of synchronized rows, and decodes per-sample FORMAT data into typed
//! views over a shared packed buffer.
//!
//! # Features
//!
//! - **K-way merge**: one row per distinct coordinate with per-file presence
//! - **Region restriction**: index-driven seeking, `contig[:beg-end]` lists
//! - **Zero-copy field views**: typed random access and in-place edits of
//!   FORMAT values shared by a record and all of its views
//!
//! # Example
//!
//! ```rust,no_run
//! use varsync::SyncedReader;
//!
//! let reader = SyncedReader::open(&["tumor.vcf", "normal.vcf"], "chr1:10000-20000").unwrap();
//! for row in reader {
//!     let row = row.unwrap();
//!     if let Some(record) = row.get(0) {
//!         let depth = record.integer_field("DP").unwrap();
//!         println!("{}:{} DP={:?}", row.contig(), row.position(), depth.to_vec());
//!     }
//! }
//! ```

pub mod config;
pub mod contig;
pub mod error;
pub mod field;
pub mod genotype;
pub mod header;
pub mod index;
pub mod interval;
pub mod packing;
pub mod record;
pub mod source;
pub mod streaming;
pub mod synced;

// Re-export commonly used types
pub use config::{OverlapMode, ReaderOptions};
pub use error::{Result, VcfError};
pub use field::{FieldValue, FieldView, FormatField, SampleBuffer, ValueType};
pub use header::{HeaderBuilder, VariantHeader};
pub use index::{read_index, GenomicIndex};
pub use interval::{Locus, Region};
pub use record::{SharedValue, VariantRecord};
pub use source::{RecordSource, SourceState};
pub use synced::{SyncedReader, SyncedRow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{OverlapMode, ReaderOptions};
    pub use crate::error::{Result, VcfError};
    pub use crate::field::{FieldValue, FieldView};
    pub use crate::genotype::Genotype;
    pub use crate::header::{FieldKind, HeaderBuilder, Number, VariantHeader};
    pub use crate::index::GenomicIndex;
    pub use crate::interval::{Locus, Region};
    pub use crate::record::VariantRecord;
    pub use crate::source::RecordSource;
    pub use crate::synced::{SyncedReader, SyncedRow};
}
