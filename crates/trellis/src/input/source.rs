//! Columnar table model with dtype hints.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigurationError, Result, TrellisError};

/// Metadata about a parsed source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was read.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been parsed.
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: String,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            row_count,
            column_count,
            loaded_at: Utc::now(),
        }
    }
}

/// Storage for one column, tagged with the dtype hint inference relies on.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Free-form strings.
    Text(Vec<Option<String>>),
    Integer(Vec<Option<i64>>),
    /// Floating point values; NaN counts as missing.
    Float(Vec<Option<f64>>),
    Boolean(Vec<Option<bool>>),
    /// Enumerated values: 0-origin codes into `levels`.
    Categorical {
        levels: Vec<String>,
        codes: Vec<Option<usize>>,
    },
    Date(Vec<Option<NaiveDate>>),
    /// Wall-clock timestamps, optionally attached to a fixed offset and/or
    /// a named zone.
    DateTime {
        values: Vec<Option<NaiveDateTime>>,
        offset: Option<FixedOffset>,
        timezone: Option<String>,
    },
    /// Nested structures passed through opaquely.
    Json(Vec<Option<Value>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(v) => v.len(),
            ColumnData::Integer(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Boolean(v) => v.len(),
            ColumnData::Categorical { codes, .. } => codes.len(),
            ColumnData::Date(v) => v.len(),
            ColumnData::DateTime { values, .. } => values.len(),
            ColumnData::Json(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the dtype hint.
    pub fn dtype(&self) -> &'static str {
        match self {
            ColumnData::Text(_) => "text",
            ColumnData::Integer(_) => "integer",
            ColumnData::Float(_) => "float",
            ColumnData::Boolean(_) => "boolean",
            ColumnData::Categorical { .. } => "categorical",
            ColumnData::Date(_) => "date",
            ColumnData::DateTime { .. } => "datetime",
            ColumnData::Json(_) => "json",
        }
    }

    /// Get the value at `row`. Out-of-range rows read as missing.
    pub fn cell(&self, row: usize) -> CellValue<'_> {
        match self {
            ColumnData::Text(v) => match v.get(row) {
                Some(Some(s)) => CellValue::Text(s),
                _ => CellValue::Missing,
            },
            ColumnData::Integer(v) => match v.get(row) {
                Some(Some(i)) => CellValue::Integer(*i),
                _ => CellValue::Missing,
            },
            ColumnData::Float(v) => match v.get(row) {
                Some(Some(x)) if !x.is_nan() => CellValue::Float(*x),
                _ => CellValue::Missing,
            },
            ColumnData::Boolean(v) => match v.get(row) {
                Some(Some(b)) => CellValue::Boolean(*b),
                _ => CellValue::Missing,
            },
            ColumnData::Categorical { levels, codes } => match codes.get(row) {
                Some(Some(code)) => match levels.get(*code) {
                    Some(label) => CellValue::Category { code: *code, label },
                    None => CellValue::Missing,
                },
                _ => CellValue::Missing,
            },
            ColumnData::Date(v) => match v.get(row) {
                Some(Some(d)) => CellValue::Date(*d),
                _ => CellValue::Missing,
            },
            ColumnData::DateTime { values, offset, .. } => match values.get(row) {
                Some(Some(dt)) => CellValue::DateTime {
                    value: *dt,
                    offset: *offset,
                },
                _ => CellValue::Missing,
            },
            ColumnData::Json(v) => match v.get(row) {
                Some(Some(Value::Null)) | Some(None) | None => CellValue::Missing,
                Some(Some(value)) => CellValue::Json(value),
            },
        }
    }

    /// Number of missing entries.
    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.cell(i).is_missing()).count()
    }
}

/// A borrowed view of a single cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue<'a> {
    Missing,
    Text(&'a str),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Category { code: usize, label: &'a str },
    Date(NaiveDate),
    DateTime {
        value: NaiveDateTime,
        offset: Option<FixedOffset>,
    },
    Json(&'a Value),
}

impl CellValue<'_> {
    /// Missing cells and NaN floats.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Missing => true,
            CellValue::Float(x) => x.is_nan(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(x) => write!(f, "{x}"),
            CellValue::Boolean(true) => f.write_str("True"),
            CellValue::Boolean(false) => f.write_str("False"),
            CellValue::Category { label, .. } => f.write_str(label),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::DateTime { value, offset } => {
                write!(f, "{}", value.format("%Y-%m-%dT%H:%M:%S%.f"))?;
                if let Some(offset) = offset {
                    write!(f, "{offset}")?;
                }
                Ok(())
            }
            CellValue::Json(value) => write!(f, "{value}"),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Text column; entries recognized by [`DataTable::is_null_value`] become missing.
    pub fn text<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let values = values
            .into_iter()
            .map(|v| {
                let v = v.as_ref();
                if DataTable::is_null_value(v) {
                    None
                } else {
                    Some(v.to_string())
                }
            })
            .collect();
        Self::new(name, ColumnData::Text(values))
    }

    pub fn integer(name: impl Into<String>, values: impl IntoIterator<Item = Option<i64>>) -> Self {
        Self::new(name, ColumnData::Integer(values.into_iter().collect()))
    }

    pub fn float(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(
            name,
            ColumnData::Float(values.into_iter().map(Some).collect()),
        )
    }

    pub fn boolean(name: impl Into<String>, values: impl IntoIterator<Item = Option<bool>>) -> Self {
        Self::new(name, ColumnData::Boolean(values.into_iter().collect()))
    }

    /// Categorical column from labels. Levels are the sorted unique labels
    /// unless given explicitly; labels outside explicit levels become missing.
    pub fn categorical<I, S>(name: impl Into<String>, labels: I, levels: Option<Vec<String>>) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let labels: Vec<Option<String>> = labels
            .into_iter()
            .map(|l| l.map(|s| s.as_ref().to_string()))
            .collect();
        let levels = levels.unwrap_or_else(|| sorted_unique(labels.iter().flatten()));
        let codes = labels
            .iter()
            .map(|l| l.as_ref().and_then(|s| levels.iter().position(|lvl| lvl == s)))
            .collect();
        Self::new(name, ColumnData::Categorical { levels, codes })
    }

    pub fn date(name: impl Into<String>, values: impl IntoIterator<Item = Option<NaiveDate>>) -> Self {
        Self::new(name, ColumnData::Date(values.into_iter().collect()))
    }

    pub fn datetime(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<NaiveDateTime>>,
        offset: Option<FixedOffset>,
        timezone: Option<String>,
    ) -> Self {
        Self::new(
            name,
            ColumnData::DateTime {
                values: values.into_iter().collect(),
                offset,
                timezone,
            },
        )
    }

    pub fn json(name: impl Into<String>, values: impl IntoIterator<Item = Option<Value>>) -> Self {
        Self::new(name, ColumnData::Json(values.into_iter().collect()))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Sorted unique strings.
pub(crate) fn sorted_unique<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut unique: Vec<String> = values
        .collect::<HashSet<_>>()
        .into_iter()
        .cloned()
        .collect();
    unique.sort();
    unique
}

/// An in-memory table: equally long, uniquely named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    columns: Vec<Column>,
    row_count: usize,
}

impl DataTable {
    /// Create a table, checking that column names are unique and lengths agree.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(ConfigurationError::InvalidArgument(format!(
                    "duplicate column name '{}'",
                    column.name
                ))
                .into());
            }
            if column.len() != row_count {
                return Err(ConfigurationError::InvalidArgument(format!(
                    "column '{}' has {} rows, expected {}",
                    column.name,
                    column.len(),
                    row_count
                ))
                .into());
            }
        }
        Ok(Self { columns, row_count })
    }

    /// Build a table of text columns from row-major string data.
    ///
    /// Short rows are padded with missing values and long rows truncated.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if headers.is_empty() {
            return Err(TrellisError::EmptyData("No columns found".to_string()));
        }
        let columns = headers
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                Column::text(
                    name,
                    rows.iter().map(|row| row.get(idx).map(String::as_str).unwrap_or("")),
                )
            })
            .collect();
        Self::new(columns)
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Look up a column, failing with a configuration error when absent.
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name).ok_or_else(|| {
            ConfigurationError::ColumnNotFound {
                column: name.to_string(),
            }
            .into()
        })
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, column: &str) -> CellValue<'_> {
        self.column(column)
            .map(|c| c.data.cell(row))
            .unwrap_or(CellValue::Missing)
    }

    /// Re-tag a text column as categorical, e.g. from a caller-provided hint.
    pub fn mark_categorical(&mut self, name: &str, levels: Option<Vec<String>>) -> Result<()> {
        let index = self
            .columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| ConfigurationError::ColumnNotFound {
                column: name.to_string(),
            })?;
        let column = &self.columns[index];
        let labels: Vec<Option<String>> = (0..self.row_count)
            .map(|row| match column.data.cell(row) {
                CellValue::Missing => None,
                cell => Some(cell.to_string()),
            })
            .collect();
        self.columns[index] = Column::categorical(name, labels, levels);
        Ok(())
    }

    /// Check if a value represents a missing/null value.
    pub fn is_null_value(value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("na")
            || trimmed.eq_ignore_ascii_case("n/a")
            || trimmed.eq_ignore_ascii_case("nan")
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("none")
            || trimmed.eq_ignore_ascii_case("nil")
            || trimmed == "."
            || trimmed == "-"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_ragged_columns() {
        let result = DataTable::new(vec![
            Column::text("a", ["x", "y"]),
            Column::text("b", ["x"]),
        ]);
        assert!(matches!(
            result,
            Err(TrellisError::Configuration(ConfigurationError::InvalidArgument(_)))
        ));
    }

    #[test]
    fn test_new_rejects_duplicate_names() {
        let result = DataTable::new(vec![Column::text("a", ["x"]), Column::text("a", ["y"])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_text_nulls_become_missing() {
        let column = Column::text("v", ["a", "NA", "", "b"]);
        assert_eq!(column.data.missing_count(), 2);
        assert_eq!(column.data.cell(0), CellValue::Text("a"));
        assert!(column.data.cell(1).is_missing());
    }

    #[test]
    fn test_float_nan_reads_missing() {
        let column = Column::float("x", [1.0, f64::NAN]);
        assert_eq!(column.data.cell(0), CellValue::Float(1.0));
        assert!(column.data.cell(1).is_missing());
    }

    #[test]
    fn test_categorical_sorted_levels() {
        let column = Column::categorical("c", [Some("b"), Some("a"), None, Some("b")], None);
        match &column.data {
            ColumnData::Categorical { levels, codes } => {
                assert_eq!(levels, &vec!["a".to_string(), "b".to_string()]);
                assert_eq!(codes, &vec![Some(1), Some(0), None, Some(1)]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(column.data.cell(1), CellValue::Category { code: 0, label: "a" });
    }

    #[test]
    fn test_mark_categorical() {
        let mut table = DataTable::new(vec![Column::text("c", ["x", "y", "x"])]).unwrap();
        table.mark_categorical("c", None).unwrap();
        assert_eq!(table.column("c").unwrap().data.dtype(), "categorical");
        assert!(table.mark_categorical("nope", None).is_err());
    }

    #[test]
    fn test_is_null_value() {
        assert!(DataTable::is_null_value(""));
        assert!(DataTable::is_null_value("NA"));
        assert!(DataTable::is_null_value("na"));
        assert!(DataTable::is_null_value("N/A"));
        assert!(DataTable::is_null_value("null"));
        assert!(DataTable::is_null_value("NaN"));
        assert!(DataTable::is_null_value("."));
        assert!(!DataTable::is_null_value("value"));
        assert!(!DataTable::is_null_value("0"));
    }
}
