//! Error types for the trellis library.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::validation::Violation;

/// Main error type for trellis operations.
#[derive(Debug, Error)]
pub enum TrellisError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to work with.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// The display was configured with something that cannot work.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A meta variable's own parameters are invalid.
    #[error("Schema violation: {0}")]
    Schema(#[from] SchemaViolation),

    /// The panel resolver could not produce an identifier.
    #[error("Panel error at row {row}: {message}")]
    Panel { row: usize, message: String },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Misconfiguration of a display or table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("column '{column}' does not exist in the table")]
    ColumnNotFound { column: String },

    #[error("no panel column has been designated")]
    PanelColumnNotSet,

    #[error("column '{name}' is the panel column and cannot be a meta variable")]
    PanelColumnIsMeta { name: String },

    #[error("meta variable '{name}' is already declared")]
    DuplicateMeta { name: String },

    #[error("unknown meta variable kind '{0}'")]
    UnknownKind(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("display rejected: {}", ViolationList(.violations))]
    Rejected { violations: Vec<Violation> },
}

/// One or more meta variables carry invalid parameters.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", ViolationList(.violations))]
pub struct SchemaViolation {
    pub violations: Vec<Violation>,
}

impl SchemaViolation {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

struct ViolationList<'a>(&'a [Violation]);

impl fmt::Display for ViolationList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

/// Result type alias for trellis operations.
pub type Result<T> = std::result::Result<T, TrellisError>;
