//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Trellis: build panel display documents from tabular data
#[derive(Parser)]
#[command(name = "trellis")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON config file with an "inference" section
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the meta kind inferred for each column
    Infer {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Treat a column as categorical before inference (repeatable)
        #[arg(long, value_name = "COLUMN")]
        factor: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build and write a display document
    Build(BuildArgs),
}

#[derive(clap::Args)]
pub struct BuildArgs {
    /// Path to the data file (CSV/TSV)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Column holding panel paths or URLs
    #[arg(short, long, value_name = "COLUMN")]
    pub panel: String,

    /// Display name (default: file stem)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Display description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Declare a column's kind, e.g. `price=currency` (repeatable)
    #[arg(long, value_name = "COLUMN=KIND")]
    pub meta: Vec<MetaArg>,

    /// Treat a column as categorical before inference (repeatable)
    #[arg(long, value_name = "COLUMN")]
    pub factor: Vec<String>,

    /// Column shown under each panel (repeatable)
    #[arg(short, long, value_name = "COLUMN")]
    pub label: Vec<String>,

    /// Default sort, e.g. `score:desc` (repeatable)
    #[arg(short, long, value_name = "COLUMN[:DIR]")]
    pub sort: Vec<SortArg>,

    /// Key columns identifying each row (repeatable)
    #[arg(short, long, value_name = "COLUMN")]
    pub key: Vec<String>,

    /// Panels per row
    #[arg(long, default_value = "1")]
    pub ncol: usize,

    /// Rows per page
    #[arg(long)]
    pub nrow: Option<usize>,

    /// Panel aspect ratio (width / height)
    #[arg(long, default_value = "1.0")]
    pub aspect: f64,

    /// Panels are HTML documents rather than images
    #[arg(long)]
    pub iframe: bool,

    /// Output path (default: <name>/displayObj.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// A `COLUMN=KIND` declaration.
#[derive(Clone, Debug)]
pub struct MetaArg {
    pub column: String,
    pub kind: String,
}

impl std::str::FromStr for MetaArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((column, kind)) if !column.trim().is_empty() && !kind.trim().is_empty() => {
                Ok(MetaArg {
                    column: column.trim().to_string(),
                    kind: kind.trim().to_string(),
                })
            }
            _ => Err(format!("Expected COLUMN=KIND, got '{}'", s)),
        }
    }
}

/// A `COLUMN[:asc|desc]` sort.
#[derive(Clone, Debug)]
pub struct SortArg {
    pub column: String,
    pub descending: bool,
}

impl std::str::FromStr for SortArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (column, dir) = match s.rsplit_once(':') {
            Some((column, dir)) => (column, dir),
            None => (s, "asc"),
        };
        let descending = match dir.to_lowercase().as_str() {
            "asc" => false,
            "desc" => true,
            _ => return Err(format!("Unknown sort direction '{}'. Use asc or desc.", dir)),
        };
        if column.is_empty() {
            return Err("Sort column must not be empty".to_string());
        }
        Ok(SortArg {
            column: column.to_string(),
            descending,
        })
    }
}
