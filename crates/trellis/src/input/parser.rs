//! CSV/TSV loading into a [`DataTable`] of text columns.

use std::fs;
use std::path::Path;

use log::debug;
use sha2::{Digest, Sha256};

use super::source::{DataTable, SourceMetadata};
use crate::error::{Result, TrellisError};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Non-blank lines sampled for delimiter detection.
const SAMPLE_LINES: usize = 10;

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Whether the file has a header row.
    pub has_header: bool,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Parses delimited text files.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the data table and metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        let path = path.as_ref();

        let contents = fs::read(path).map_err(|e| TrellisError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(&contents, self.config.quote)?,
        };
        debug!("Parsing {:?} with delimiter {:?}", path, delimiter as char);

        let table = self.parse_bytes(&contents, delimiter)?;

        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            b'|' => "psv",
            _ => "delimited",
        }
        .to_string();

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            contents.len() as u64,
            format,
            table.row_count(),
            table.column_count(),
        );

        Ok((table, metadata))
    }

    /// Parse in-memory delimited text, detecting the delimiter if not configured.
    pub fn parse_str(&self, data: &str) -> Result<DataTable> {
        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(data.as_bytes(), self.config.quote)?,
        };
        self.parse_bytes(data.as_bytes(), delimiter)
    }

    fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<DataTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let mut records = reader.records();

        let headers: Vec<String> = if self.config.has_header {
            match records.next() {
                Some(record) => record?.iter().map(|s| s.trim().to_string()).collect(),
                None => return Err(TrellisError::EmptyData("No header row found".to_string())),
            }
        } else {
            Vec::new()
        };

        let mut rows = Vec::new();
        for (row_idx, result) in records.enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }
            let record = result?;
            rows.push(record.iter().map(|s| s.to_string()).collect::<Vec<_>>());
        }

        if rows.is_empty() {
            return Err(TrellisError::EmptyData("No data rows found".to_string()));
        }

        let headers = if headers.is_empty() {
            (0..rows[0].len())
                .map(|i| format!("column_{}", i + 1))
                .collect()
        } else {
            headers
        };

        DataTable::from_rows(headers, rows)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the delimiter that splits the leading records into the most fields,
/// preferring one that splits every record the same way.
fn detect_delimiter(bytes: &[u8], quote: u8) -> Result<u8> {
    let sample: Vec<&[u8]> = bytes
        .split(|&b| b == b'\n')
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .take(SAMPLE_LINES)
        .collect();
    if sample.is_empty() {
        return Err(TrellisError::EmptyData("No lines to analyze".to_string()));
    }
    let sample = sample.join(&b'\n');

    let mut best = (b',', 0);
    for &delimiter in DELIMITERS {
        let score = delimiter_score(&sample, delimiter, quote);
        if score > best.1 {
            best = (delimiter, score);
        }
    }
    Ok(best.0)
}

fn delimiter_score(sample: &[u8], delimiter: u8, quote: u8) -> usize {
    let widths: Vec<usize> = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .quote(quote)
        .has_headers(false)
        .flexible(true)
        .from_reader(sample)
        .records()
        .map_while(|record| record.ok())
        .map(|record| record.len())
        .collect();

    match widths.first() {
        Some(&width) if width > 1 => {
            if widths.iter().all(|&w| w == width) {
                let tab_bonus = if delimiter == b'\t' { 100 } else { 0 };
                width * 1000 + tab_bonus
            } else {
                width
            }
        }
        _ => 0,
    }
}
