//! Tabular input: the in-memory table model and delimited-file loading.

mod parser;
mod source;

pub use parser::{Parser, ParserConfig};
pub use source::{CellValue, Column, ColumnData, DataTable, SourceMetadata};

pub(crate) use source::sorted_unique;
