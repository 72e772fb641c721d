//! Streaming utilities shared by the readers and the command-line tool.
//!
//! - Zero-allocation record line parsing
//! - Inline sort validation
//! - Buffer sizing
//! - Row output formatting

pub mod buffers;
pub mod output;
pub mod parsing;
pub mod validation;

pub use output::RowWriter;
pub use parsing::{parse_record_span, parse_u64_fast, should_skip_line, split_columns};
pub use validation::SortValidator;
