//! Error type shared by every layer of the crate.

use crate::field::ValueType;
use crate::source::SourceState;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while opening, indexing, synchronizing or decoding
/// variant files.
#[derive(Error, Debug)]
pub enum VcfError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot open {}: {message}", path.display())]
    FileOpen { path: PathBuf, message: String },

    #[error("No index found for {}; interval-restricted reading requires an index", path.display())]
    MissingIndex { path: PathBuf },

    #[error("Header of {} does not match {}: {message}", other.display(), first.display())]
    HeaderMismatch {
        first: PathBuf,
        other: PathBuf,
        message: String,
    },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Header parse error at line {line}: {message}")]
    Header { line: usize, message: String },

    #[error("Unknown FORMAT field: {0}")]
    UnknownField(String),

    #[error("FORMAT field {field} is stored as {stored}, cannot decode as {requested}")]
    TypeMismatch {
        field: String,
        stored: ValueType,
        requested: &'static str,
    },

    #[error("Value does not fit the {stored} storage of FORMAT field {field}")]
    Unrepresentable { field: String, stored: ValueType },

    #[error("Index {index} out of range (0..{len})")]
    OutOfRange { index: usize, len: usize },

    #[error("Invalid region '{0}'")]
    InvalidRegion(String),

    #[error("File {} not sorted: {message}", path.display())]
    Unsorted { path: PathBuf, message: String },

    #[error("Record source {} is {state:?}", path.display())]
    InvalidState { path: PathBuf, state: SourceState },

    #[error("Invalid index file: {0}")]
    IndexFormat(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VcfError>;

impl VcfError {
    pub(crate) fn malformed(offset: u64, message: impl AsRef<str>) -> Self {
        VcfError::MalformedRecord(format!("byte offset {}: {}", offset, message.as_ref()))
    }

    /// Whether the error leaves the reporting source unusable.
    ///
    /// Field lookups and index errors on a decoded record are recoverable per call;
    /// everything that breaks the ordering guarantee is not.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            VcfError::UnknownField(_)
                | VcfError::TypeMismatch { .. }
                | VcfError::Unrepresentable { .. }
                | VcfError::OutOfRange { .. }
                | VcfError::InvalidRegion(_)
        )
    }
}
