//! Top-level entry point tying loading, inference and display building together.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::display::DisplayModel;
use crate::error::{Result, TrellisError};
use crate::inference::{InferenceConfig, InferredMeta, TypeInference};
use crate::input::{DataTable, Parser, ParserConfig, SourceMetadata};

/// Configuration for a [`Trellis`] instance.
///
/// Only the inference section is read from config files; parser settings
/// come from the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrellisConfig {
    #[serde(skip)]
    pub parser: ParserConfig,
    pub inference: InferenceConfig,
}

impl TrellisConfig {
    /// Read a JSON config file such as `{"inference": {"max_factor_levels": 20}}`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TrellisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// Loads tables and starts displays with a shared configuration.
pub struct Trellis {
    config: TrellisConfig,
    parser: Parser,
    inference: TypeInference,
}

impl Trellis {
    pub fn new() -> Self {
        Self::with_config(TrellisConfig::default())
    }

    pub fn with_config(config: TrellisConfig) -> Self {
        let parser = Parser::with_config(config.parser.clone());
        let inference = TypeInference::with_config(config.inference.clone());
        Self {
            config,
            parser,
            inference,
        }
    }

    pub fn config(&self) -> &TrellisConfig {
        &self.config
    }

    pub fn inference(&self) -> &TypeInference {
        &self.inference
    }

    /// Load a delimited file.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        let (table, source) = self.parser.parse_file(path)?;
        info!(
            "Loaded '{}': {} row(s), {} column(s)",
            source.file, source.row_count, source.column_count
        );
        Ok((table, source))
    }

    /// Infer a meta for every column of `table`.
    pub fn infer(&self, table: &DataTable) -> Vec<InferredMeta> {
        self.inference.infer_table(table, &Default::default())
    }

    /// Start a display over `table` with `panel_column` set and every other
    /// column's meta inferred with this instance's configuration.
    pub fn display<'t>(
        &self,
        name: &str,
        table: &'t DataTable,
        panel_column: &str,
    ) -> Result<DisplayModel<'t>> {
        let mut display = DisplayModel::new(name, table)?;
        display
            .set_panel_column(panel_column)?
            .infer_metas_with(&self.inference);
        Ok(display)
    }
}

impl Default for Trellis {
    fn default() -> Self {
        Self::new()
    }
}
