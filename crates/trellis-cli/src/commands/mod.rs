//! CLI command implementations.

pub mod build;
pub mod infer;

use std::path::{Path, PathBuf};

use trellis::{DataTable, SourceMetadata, Trellis, TrellisConfig};

/// Create a `Trellis` from an optional config file and load `file`, marking
/// the `factor` columns categorical.
pub(crate) fn load(
    file: &Path,
    factor: &[String],
    config: Option<PathBuf>,
) -> Result<(Trellis, DataTable, SourceMetadata), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let config = match config {
        Some(path) => TrellisConfig::load(&path)?,
        None => TrellisConfig::default(),
    };
    let trellis = Trellis::with_config(config);
    let (mut table, source) = trellis.load(file)?;
    for column in factor {
        table.mark_categorical(column, None)?;
    }
    Ok((trellis, table, source))
}
