//! Meta variables: a named column with a kind, and how its values encode.

use std::collections::{BTreeSet, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::kind::{GraphDirection, KindName, MAX_DIGITS, MetaKind};
use super::temporal::{self, Temporal};
use crate::error::Result;
use crate::input::{CellValue, Column, ColumnData, sorted_unique};
use crate::validation::Violation;

static CURRENCY_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}$").unwrap());

static TIMEZONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(UTC|GMT|Z|[+-]\d{2}:?\d{2}|[A-Za-z][A-Za-z0-9_+-]*(/[A-Za-z0-9_+-]+)+)$").unwrap()
});

/// A column's internal, pre-wire encoding.
///
/// Factor values are 0-origin `Level`s here; shifting to the viewer's
/// 1-origin convention happens only in the serializer.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedValue {
    /// The cell was missing or NaN.
    Missing,
    /// The cell had a value outside the meta's domain; written as missing.
    Unmatched,
    Level(usize),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    Json(Value),
}

impl EncodedValue {
    /// True for both missing and unmatched values.
    pub fn is_missing(&self) -> bool {
        matches!(self, EncodedValue::Missing | EncodedValue::Unmatched)
    }
}

/// A typed metadata variable attached to a display column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaVariable {
    /// Column name; unique within a display.
    pub name: String,
    /// Display label; `None` means use `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub kind: MetaKind,
}

impl MetaVariable {
    pub fn new(name: impl Into<String>, kind: MetaKind) -> Self {
        Self {
            name: name.into(),
            label: None,
            description: None,
            tags: Vec::new(),
            kind,
        }
    }

    pub fn factor<I, S>(name: impl Into<String>, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            MetaKind::Factor {
                levels: levels.into_iter().map(Into::into).collect(),
            },
        )
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, MetaKind::number())
    }

    pub fn currency(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self::new(name, MetaKind::currency(code))
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, MetaKind::date())
    }

    pub fn time(name: impl Into<String>, timezone: Option<String>) -> Self {
        Self::new(name, MetaKind::time(timezone))
    }

    pub fn href(name: impl Into<String>, label_column: Option<String>) -> Self {
        Self::new(name, MetaKind::Href { label_column })
    }

    pub fn graph(
        name: impl Into<String>,
        id_column: Option<String>,
        direction: GraphDirection,
    ) -> Self {
        Self::new(name, MetaKind::Graph { id_column, direction })
    }

    pub fn base(name: impl Into<String>) -> Self {
        Self::new(name, MetaKind::Base)
    }

    /// Build a meta of the named kind with parameters derived from the column.
    pub fn from_kind_name(kind: &str, column: &Column) -> Result<Self> {
        let kind: KindName = kind.parse()?;
        let meta_kind = match kind {
            KindName::Factor => MetaKind::Factor {
                levels: column_levels(&column.data),
            },
            KindName::Number => MetaKind::number(),
            KindName::Currency => MetaKind::currency(super::kind::DEFAULT_CURRENCY),
            KindName::Date => MetaKind::date(),
            KindName::Time => MetaKind::time(column_timezone(&column.data)),
            KindName::Href => MetaKind::Href { label_column: None },
            KindName::Graph => MetaKind::Graph {
                id_column: None,
                direction: GraphDirection::default(),
            },
            KindName::Base => MetaKind::Base,
        };
        Ok(Self::new(column.name.clone(), meta_kind))
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set decimal digits on a number or currency meta; ignored otherwise.
    pub fn with_digits(mut self, value: i32) -> Self {
        match &mut self.kind {
            MetaKind::Number { digits, .. } | MetaKind::Currency { digits, .. } => *digits = value,
            _ => {}
        }
        self
    }

    /// Set log scale on a number meta; ignored otherwise.
    pub fn with_log(mut self, value: bool) -> Self {
        if let MetaKind::Number { log, .. } = &mut self.kind {
            *log = value;
        }
        self
    }

    /// The label shown by the viewer.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn kind_name(&self) -> KindName {
        self.kind.name()
    }

    /// Check the meta's own parameters.
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        let subject = if self.name.is_empty() {
            "<unnamed>"
        } else {
            self.name.as_str()
        };

        if self.name.trim().is_empty() {
            violations.push(Violation::schema(subject, "name must not be empty"));
        }

        match &self.kind {
            MetaKind::Factor { levels } => {
                if levels.is_empty() {
                    violations.push(Violation::schema(subject, "factor levels must not be empty"));
                }
                let mut seen = HashSet::new();
                for level in levels {
                    if !seen.insert(level.as_str()) {
                        violations.push(Violation::schema(
                            subject,
                            format!("duplicate factor level '{level}'"),
                        ));
                    }
                }
            }
            MetaKind::Number { digits, .. } => check_digits(subject, *digits, &mut violations),
            MetaKind::Currency { code, digits } => {
                check_digits(subject, *digits, &mut violations);
                if !CURRENCY_CODE.is_match(code) {
                    violations.push(Violation::schema(
                        subject,
                        format!("'{code}' is not a three-letter ISO 4217 currency code"),
                    ));
                }
            }
            MetaKind::Date { format } => {
                if format.trim().is_empty() {
                    violations.push(Violation::schema(subject, "date format must not be empty"));
                }
            }
            MetaKind::Time { timezone, format } => {
                if format.trim().is_empty() {
                    violations.push(Violation::schema(subject, "time format must not be empty"));
                }
                if let Some(tz) = timezone {
                    if !TIMEZONE.is_match(tz) {
                        violations.push(Violation::schema(
                            subject,
                            format!("'{tz}' is not a timezone name or offset"),
                        ));
                    }
                }
            }
            MetaKind::Href { label_column } => {
                if label_column.as_deref().is_some_and(|c| c.trim().is_empty()) {
                    violations.push(Violation::schema(subject, "label column must not be empty"));
                }
            }
            MetaKind::Graph { id_column, .. } => {
                if id_column.as_deref().is_some_and(|c| c.trim().is_empty()) {
                    violations.push(Violation::schema(subject, "id column must not be empty"));
                }
            }
            MetaKind::Base => {}
        }

        violations
    }

    /// Encode a cell for this meta.
    pub fn encode(&self, cell: CellValue<'_>) -> EncodedValue {
        if cell.is_missing() {
            return EncodedValue::Missing;
        }
        match &self.kind {
            MetaKind::Factor { levels } => encode_factor(levels, cell),
            MetaKind::Number { .. } | MetaKind::Currency { .. } => encode_number(cell),
            MetaKind::Date { format } => match to_temporal(cell, format) {
                Some(t) => EncodedValue::Text(temporal::iso_date(t.date())),
                None => EncodedValue::Unmatched,
            },
            MetaKind::Time { format, .. } => match to_temporal(cell, format) {
                Some(t) => EncodedValue::Text(temporal::iso_datetime(t.datetime(), t.offset())),
                None => EncodedValue::Unmatched,
            },
            MetaKind::Href { .. } | MetaKind::Graph { .. } | MetaKind::Base => passthrough(cell),
        }
    }
}

fn check_digits(subject: &str, digits: i32, violations: &mut Vec<Violation>) {
    if !(0..=MAX_DIGITS).contains(&digits) {
        violations.push(Violation::schema(
            subject,
            format!("digits must be between 0 and {MAX_DIGITS}, got {digits}"),
        ));
    }
}

fn encode_factor(levels: &[String], cell: CellValue<'_>) -> EncodedValue {
    let position = match cell {
        // Already-indexed values keep their code when it names the same level
        CellValue::Category { code, label } => levels
            .get(code)
            .filter(|l| *l == label)
            .map(|_| code)
            .or_else(|| levels.iter().position(|l| l == label)),
        CellValue::Text(s) => levels.iter().position(|l| l == s),
        other => {
            let rendered = other.to_string();
            levels.iter().position(|l| *l == rendered)
        }
    };
    match position {
        Some(p) => EncodedValue::Level(p),
        None => EncodedValue::Unmatched,
    }
}

fn encode_number(cell: CellValue<'_>) -> EncodedValue {
    match cell {
        CellValue::Integer(i) => EncodedValue::Integer(i),
        CellValue::Float(x) if x.is_nan() => EncodedValue::Missing,
        CellValue::Float(x) if x.is_finite() => EncodedValue::Float(x),
        CellValue::Text(s) | CellValue::Category { label: s, .. } => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                EncodedValue::Integer(i)
            } else {
                match trimmed.parse::<f64>() {
                    Ok(x) if x.is_finite() => EncodedValue::Float(x),
                    Ok(x) if x.is_nan() => EncodedValue::Missing,
                    _ => EncodedValue::Unmatched,
                }
            }
        }
        _ => EncodedValue::Unmatched,
    }
}

fn to_temporal(cell: CellValue<'_>, format: &str) -> Option<Temporal> {
    match cell {
        CellValue::Date(d) => Some(Temporal::Date(d)),
        CellValue::DateTime { value, offset } => Some(Temporal::DateTime { value, offset }),
        CellValue::Text(s) | CellValue::Category { label: s, .. } => {
            temporal::parse_temporal_default(s, Some(format))
        }
        _ => None,
    }
}

fn passthrough(cell: CellValue<'_>) -> EncodedValue {
    match cell {
        CellValue::Missing => EncodedValue::Missing,
        CellValue::Text(s) => EncodedValue::Text(s.to_string()),
        CellValue::Integer(i) => EncodedValue::Integer(i),
        CellValue::Float(x) => EncodedValue::Float(x),
        CellValue::Boolean(b) => EncodedValue::Boolean(b),
        CellValue::Category { label, .. } => EncodedValue::Text(label.to_string()),
        CellValue::Date(d) => EncodedValue::Text(temporal::iso_date(d)),
        CellValue::DateTime { value, offset } => {
            EncodedValue::Text(temporal::iso_datetime(value, offset))
        }
        CellValue::Json(v) => EncodedValue::Json(v.clone()),
    }
}

/// Levels a factor declared on this column would use.
///
/// Integer columns keep numeric order.
pub(crate) fn column_levels(data: &ColumnData) -> Vec<String> {
    match data {
        ColumnData::Categorical { levels, .. } => levels.clone(),
        ColumnData::Boolean(_) => vec!["False".to_string(), "True".to_string()],
        ColumnData::Integer(values) => values
            .iter()
            .flatten()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(i64::to_string)
            .collect(),
        other => {
            let rendered: Vec<String> = (0..other.len())
                .map(|row| other.cell(row))
                .filter(|cell| !cell.is_missing())
                .map(|cell| cell.to_string())
                .collect();
            sorted_unique(rendered.iter())
        }
    }
}

/// Timezone a time meta declared on this column would carry.
pub(crate) fn column_timezone(data: &ColumnData) -> Option<String> {
    match data {
        ColumnData::DateTime {
            offset, timezone, ..
        } => timezone.clone().or_else(|| offset.map(|o| o.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    fn levels() -> MetaVariable {
        MetaVariable::factor("country", ["Algeria", "Denmark", "Germany"])
    }

    #[test]
    fn test_factor_first_level_is_position_zero() {
        assert_eq!(levels().encode(CellValue::Text("Algeria")), EncodedValue::Level(0));
        assert_eq!(levels().encode(CellValue::Text("Germany")), EncodedValue::Level(2));
    }

    #[test]
    fn test_factor_category_code_is_already_indexed() {
        let meta = levels();
        let cell = CellValue::Category {
            code: 1,
            label: "Denmark",
        };
        assert_eq!(meta.encode(cell), EncodedValue::Level(1));

        // A code into different levels falls back to the label
        let cell = CellValue::Category {
            code: 0,
            label: "Germany",
        };
        assert_eq!(meta.encode(cell), EncodedValue::Level(2));
    }

    #[test]
    fn test_factor_integer_matches_label() {
        let column = Column::integer("grade", [Some(1), Some(2), Some(3), Some(10), None]);
        let meta = MetaVariable::from_kind_name("factor", &column).unwrap();
        assert_eq!(meta.kind.levels().unwrap(), ["1", "2", "3", "10"].map(String::from));

        assert_eq!(meta.encode(CellValue::Integer(1)), EncodedValue::Level(0));
        assert_eq!(meta.encode(CellValue::Integer(10)), EncodedValue::Level(3));
        assert_eq!(meta.encode(CellValue::Integer(0)), EncodedValue::Unmatched);
        assert_eq!(levels().encode(CellValue::Integer(0)), EncodedValue::Unmatched);
    }

    #[test]
    fn test_factor_missing_and_unmatched() {
        let meta = levels();
        assert_eq!(meta.encode(CellValue::Missing), EncodedValue::Missing);
        assert_eq!(meta.encode(CellValue::Text("France")), EncodedValue::Unmatched);
        assert!(meta.encode(CellValue::Text("France")).is_missing());
    }

    #[test]
    fn test_factor_boolean_levels() {
        let meta = MetaVariable::factor("flag", ["False", "True"]);
        assert_eq!(meta.encode(CellValue::Boolean(false)), EncodedValue::Level(0));
        assert_eq!(meta.encode(CellValue::Boolean(true)), EncodedValue::Level(1));
    }

    #[test]
    fn test_number_passthrough() {
        let meta = MetaVariable::number("score");
        assert_eq!(meta.encode(CellValue::Float(85.5)), EncodedValue::Float(85.5));
        assert_eq!(meta.encode(CellValue::Integer(3)), EncodedValue::Integer(3));
        assert_eq!(meta.encode(CellValue::Text("1.25")), EncodedValue::Float(1.25));
        assert_eq!(meta.encode(CellValue::Text("abc")), EncodedValue::Unmatched);
        assert_eq!(meta.encode(CellValue::Float(f64::NAN)), EncodedValue::Missing);
        assert_eq!(meta.encode(CellValue::Float(f64::INFINITY)), EncodedValue::Unmatched);
    }

    #[test]
    fn test_date_and_time_iso() {
        let date = MetaVariable::date("d");
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            date.encode(CellValue::Date(day)),
            EncodedValue::Text("2024-03-01".to_string())
        );
        assert_eq!(
            date.encode(CellValue::Text("03/01/2024")),
            EncodedValue::Text("2024-03-01".to_string())
        );

        let time = MetaVariable::time("t", Some("+01:00".to_string()));
        let value = day.and_hms_opt(9, 5, 0).unwrap();
        assert_eq!(
            time.encode(CellValue::DateTime {
                value,
                offset: FixedOffset::east_opt(3600),
            }),
            EncodedValue::Text("2024-03-01T09:05:00+01:00".to_string())
        );
        assert_eq!(time.encode(CellValue::Text("soon")), EncodedValue::Unmatched);
    }

    #[test]
    fn test_validate_factor() {
        assert!(levels().validate().is_empty());
        let empty = MetaVariable::factor("f", Vec::<String>::new());
        assert_eq!(empty.validate().len(), 1);
        let dup = MetaVariable::factor("f", ["a", "a"]);
        assert!(dup.validate()[0].message.contains("duplicate"));
    }

    #[test]
    fn test_validate_number_and_currency() {
        assert_eq!(MetaVariable::number("n").with_digits(-1).validate().len(), 1);
        assert!(MetaVariable::currency("c", "EUR").validate().is_empty());
        assert_eq!(MetaVariable::currency("c", "euro").validate().len(), 1);
    }

    #[test]
    fn test_validate_timezone() {
        assert!(MetaVariable::time("t", Some("Europe/Berlin".into())).validate().is_empty());
        assert!(MetaVariable::time("t", Some("-05:00".into())).validate().is_empty());
        assert_eq!(MetaVariable::time("t", Some("not a zone".into())).validate().len(), 1);
    }

    #[test]
    fn test_from_kind_name() {
        let column = Column::text("c", ["b", "a", "b"]);
        let meta = MetaVariable::from_kind_name("factor", &column).unwrap();
        assert_eq!(meta.kind.levels().unwrap(), ["a".to_string(), "b".to_string()]);
        assert!(MetaVariable::from_kind_name("nope", &column).is_err());
    }

    #[test]
    fn test_display_label_defaults_to_name() {
        assert_eq!(MetaVariable::number("score").display_label(), "score");
        assert_eq!(MetaVariable::number("score").with_label("Score").display_label(), "Score");
    }
}
