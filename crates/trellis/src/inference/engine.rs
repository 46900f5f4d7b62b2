//! Column classification into meta variable kinds.

use std::collections::HashSet;

use chrono::NaiveTime;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use super::config::InferenceConfig;
use crate::input::{CellValue, Column, ColumnData, DataTable};
use crate::meta::temporal::{self, Temporal};
use crate::meta::{
    DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT, MetaKind, MetaVariable, column_levels,
    column_timezone,
};

/// Which decision rule produced an inferred meta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceRule {
    /// The column was already categorical.
    Categorical,
    /// Date/datetime column.
    Temporal,
    /// Integer or float column.
    Numeric,
    Boolean,
    /// Text with few distinct values.
    TextCardinality,
    /// Text where every value parses as a number.
    TextNumeric,
    /// Text where every value parses as a date or datetime.
    TextTemporal,
    /// Nothing typed applied.
    Fallback,
}

impl InferenceRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            InferenceRule::Categorical => "categorical",
            InferenceRule::Temporal => "temporal",
            InferenceRule::Numeric => "numeric",
            InferenceRule::Boolean => "boolean",
            InferenceRule::TextCardinality => "text_cardinality",
            InferenceRule::TextNumeric => "text_numeric",
            InferenceRule::TextTemporal => "text_temporal",
            InferenceRule::Fallback => "fallback",
        }
    }
}

/// Counts gathered while classifying a column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    /// Dtype hint of the source column.
    pub dtype: String,
    pub row_count: usize,
    pub missing_count: usize,
    /// Distinct non-missing values.
    pub distinct_count: usize,
}

/// Result of classifying one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferredMeta {
    pub meta: MetaVariable,
    pub rule: InferenceRule,
    pub profile: ColumnProfile,
}

/// Classifies columns into meta variable kinds.
pub struct TypeInference {
    config: InferenceConfig,
}

impl TypeInference {
    /// Create an engine with default thresholds.
    pub fn new() -> Self {
        Self {
            config: InferenceConfig::default(),
        }
    }

    /// Create with custom configuration.
    pub fn with_config(config: InferenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Infer a meta variable for `column`, named `name`.
    ///
    /// Never fails: anything unrecognized becomes a base meta.
    pub fn infer(&self, column: &Column, name: &str) -> MetaVariable {
        self.infer_column(column, name).meta
    }

    /// Like [`TypeInference::infer`], also reporting the rule and counts.
    pub fn infer_column(&self, column: &Column, name: &str) -> InferredMeta {
        let data = &column.data;
        let rows = data.len();

        let mut value_counts: IndexMap<String, usize> = IndexMap::new();
        let mut missing_count = 0;
        for row in 0..rows {
            match data.cell(row) {
                CellValue::Missing => missing_count += 1,
                cell => *value_counts.entry(cell.to_string()).or_insert(0) += 1,
            }
        }

        let profile = ColumnProfile {
            dtype: data.dtype().to_string(),
            row_count: rows,
            missing_count,
            distinct_count: value_counts.len(),
        };

        let (kind, rule) = if value_counts.is_empty() {
            (MetaKind::Base, InferenceRule::Fallback)
        } else {
            self.classify(data, &value_counts)
        };

        debug!(
            "Inferred '{}' ({}, {} distinct of {} rows) as {} via {:?}",
            name,
            profile.dtype,
            profile.distinct_count,
            rows,
            kind.name(),
            rule
        );

        InferredMeta {
            meta: MetaVariable::new(name, kind),
            rule,
            profile,
        }
    }

    /// Infer metas for every column of `table` not named in `exclude`.
    pub fn infer_table(&self, table: &DataTable, exclude: &HashSet<&str>) -> Vec<InferredMeta> {
        table
            .columns()
            .iter()
            .filter(|c| !exclude.contains(c.name.as_str()))
            .map(|c| self.infer_column(c, &c.name))
            .collect()
    }

    fn classify(
        &self,
        data: &ColumnData,
        value_counts: &IndexMap<String, usize>,
    ) -> (MetaKind, InferenceRule) {
        match data {
            ColumnData::Categorical { .. } => (
                MetaKind::Factor {
                    levels: column_levels(data),
                },
                InferenceRule::Categorical,
            ),
            ColumnData::Date(_) => (MetaKind::date(), InferenceRule::Temporal),
            ColumnData::DateTime { values, .. } => {
                let timezone = column_timezone(data);
                let all_midnight = values.iter().flatten().all(|v| v.time() == NaiveTime::MIN);
                if all_midnight && timezone.is_none() {
                    (MetaKind::date(), InferenceRule::Temporal)
                } else {
                    (MetaKind::time(timezone), InferenceRule::Temporal)
                }
            }
            ColumnData::Integer(_) | ColumnData::Float(_) => {
                (self.number_kind(), InferenceRule::Numeric)
            }
            ColumnData::Boolean(_) => (
                MetaKind::Factor {
                    levels: column_levels(data),
                },
                InferenceRule::Boolean,
            ),
            ColumnData::Text(_) => self.classify_text(data.len(), value_counts),
            ColumnData::Json(_) => (MetaKind::Base, InferenceRule::Fallback),
        }
    }

    fn classify_text(
        &self,
        rows: usize,
        value_counts: &IndexMap<String, usize>,
    ) -> (MetaKind, InferenceRule) {
        if self.config.is_factor_cardinality(value_counts.len(), rows) {
            let mut levels: Vec<String> = value_counts.keys().cloned().collect();
            levels.sort();
            return (MetaKind::Factor { levels }, InferenceRule::TextCardinality);
        }

        if value_counts
            .keys()
            .all(|v| v.trim().parse::<f64>().is_ok_and(|x| !x.is_nan()))
        {
            return (self.number_kind(), InferenceRule::TextNumeric);
        }

        let parsed: Option<Vec<Temporal>> = value_counts
            .keys()
            .map(|v| {
                temporal::parse_temporal(
                    v,
                    None,
                    &self.config.date_formats,
                    &self.config.datetime_formats,
                )
            })
            .collect();
        if let Some(parsed) = parsed {
            let values: Vec<&String> = value_counts.keys().collect();
            let format = temporal::shared_format(
                &values,
                &self.config.date_formats,
                &self.config.datetime_formats,
            );
            let offsets: HashSet<_> = parsed.iter().map(Temporal::offset).collect();
            let zoned = offsets.iter().any(Option::is_some);
            if !zoned && parsed.iter().all(Temporal::is_midnight) {
                let format = format.unwrap_or(DEFAULT_DATE_FORMAT).to_string();
                return (MetaKind::Date { format }, InferenceRule::TextTemporal);
            }
            // A single shared offset is carried; mixed offsets stay per value.
            let timezone = match offsets.into_iter().collect::<Vec<_>>().as_slice() {
                [Some(offset)] => Some(offset.to_string()),
                _ => None,
            };
            let format = format.unwrap_or(DEFAULT_TIME_FORMAT).to_string();
            return (MetaKind::Time { timezone, format }, InferenceRule::TextTemporal);
        }

        (MetaKind::Base, InferenceRule::Fallback)
    }

    fn number_kind(&self) -> MetaKind {
        MetaKind::Number {
            digits: self.config.default_digits,
            locale: true,
            log: false,
        }
    }
}

impl Default for TypeInference {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{EncodedValue, KindName};
    use chrono::{FixedOffset, NaiveDate};

    #[test]
    fn test_categorical_column() {
        let column = Column::categorical(
            "country",
            [Some("Algeria"), Some("Denmark"), Some("Germany")],
            None,
        );
        let inferred = TypeInference::new().infer_column(&column, "country");
        assert_eq!(inferred.rule, InferenceRule::Categorical);
        assert_eq!(
            inferred.meta.kind.levels().unwrap(),
            ["Algeria", "Denmark", "Germany"].map(String::from)
        );
    }

    #[test]
    fn test_float_column_is_number() {
        let column = Column::float("score", [85.5, 92.3, 78.9]);
        let meta = TypeInference::new().infer(&column, "score");
        assert_eq!(
            meta.kind,
            MetaKind::Number {
                digits: 2,
                locale: true,
                log: false
            }
        );
    }

    #[test]
    fn test_boolean_column_levels() {
        let column = Column::boolean("flag", [Some(true), None, Some(false)]);
        let inferred = TypeInference::new().infer_column(&column, "flag");
        assert_eq!(inferred.rule, InferenceRule::Boolean);
        assert_eq!(inferred.meta.kind.levels().unwrap(), ["False", "True"].map(String::from));
    }

    #[test]
    fn test_datetime_midnight_is_date() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let column = Column::datetime(
            "when",
            [Some(day.and_hms_opt(0, 0, 0).unwrap()), None],
            None,
            None,
        );
        assert_eq!(TypeInference::new().infer(&column, "when").kind_name(), KindName::Date);
    }

    #[test]
    fn test_datetime_with_time_or_zone_is_time() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let with_time = Column::datetime("t", [Some(day.and_hms_opt(8, 0, 0).unwrap())], None, None);
        assert_eq!(TypeInference::new().infer(&with_time, "t").kind, MetaKind::time(None));

        let zoned = Column::datetime(
            "t",
            [Some(day.and_hms_opt(0, 0, 0).unwrap())],
            FixedOffset::east_opt(0),
            Some("Europe/London".to_string()),
        );
        assert_eq!(
            TypeInference::new().infer(&zoned, "t").kind,
            MetaKind::time(Some("Europe/London".to_string()))
        );
    }

    #[test]
    fn test_text_cardinality_boundary() {
        let engine = TypeInference::new();

        let few: Vec<String> = (0..200).map(|i| format!("level_{}", i % 49)).collect();
        let inferred = engine.infer_column(&Column::text("c", &few), "c");
        assert_eq!(inferred.rule, InferenceRule::TextCardinality);
        assert_eq!(inferred.meta.kind.levels().unwrap().len(), 49);

        let many: Vec<String> = (0..200).map(|i| format!("level_{}", i % 51)).collect();
        let inferred = engine.infer_column(&Column::text("c", &many), "c");
        assert_eq!(inferred.meta.kind, MetaKind::Base);
    }

    #[test]
    fn test_high_cardinality_numeric_text() {
        let values: Vec<String> = (0..100).map(|i| format!("{}.5", i)).collect();
        let inferred = TypeInference::new().infer_column(&Column::text("x", &values), "x");
        assert_eq!(inferred.rule, InferenceRule::TextNumeric);
    }

    #[test]
    fn test_mixed_text_is_not_numeric() {
        let mut values: Vec<String> = (0..100).map(|i| i.to_string()).collect();
        values.push("n/a-ish".to_string());
        let meta = TypeInference::new().infer(&Column::text("x", &values), "x");
        assert_eq!(meta.kind, MetaKind::Base);
    }

    #[test]
    fn test_high_cardinality_date_text() {
        let values: Vec<String> = (1..=28)
            .flat_map(|d| (1..=3).map(move |m| format!("2024-{m:02}-{d:02}")))
            .collect();
        let meta = TypeInference::new().infer(&Column::text("d", &values), "d");
        assert_eq!(meta.kind_name(), KindName::Date);

        let stamps: Vec<String> = (0..60).map(|i| format!("2024-01-01T10:{i:02}:00+02:00")).collect();
        let meta = TypeInference::new().infer(&Column::text("t", &stamps), "t");
        assert_eq!(meta.kind, MetaKind::time(Some("+02:00".to_string())));
    }

    #[test]
    fn test_empty_and_all_missing_are_base() {
        let engine = TypeInference::new();
        assert_eq!(engine.infer(&Column::text("e", Vec::<&str>::new()), "e").kind, MetaKind::Base);
        assert_eq!(engine.infer(&Column::text("m", ["NA", "", "null"]), "m").kind, MetaKind::Base);
        assert_eq!(
            engine.infer(&Column::float("f", [f64::NAN, f64::NAN]), "f").kind,
            MetaKind::Base
        );
    }

    #[test]
    fn test_missing_not_counted_as_level() {
        let values: Vec<&str> = ["a", "b", "NA", ""].iter().cycle().take(40).copied().collect();
        let meta = TypeInference::new().infer(&Column::text("c", &values), "c");
        assert_eq!(meta.kind.levels().unwrap(), ["a", "b"].map(String::from));
    }

    #[test]
    fn test_infer_table_excludes() {
        let table = DataTable::new(vec![
            Column::text("panel", ["p1.png", "p2.png"]),
            Column::float("x", [1.0, 2.0]),
        ])
        .unwrap();
        let exclude: HashSet<&str> = ["panel"].into_iter().collect();
        let inferred = TypeInference::new().infer_table(&table, &exclude);
        assert_eq!(inferred.len(), 1);
        assert_eq!(inferred[0].meta.name, "x");
    }

    fn day_first(days: &[String]) -> TypeInference {
        TypeInference::with_config(InferenceConfig {
            date_formats: days.to_vec(),
            datetime_formats: Vec::new(),
            ..InferenceConfig::default()
        })
    }

    #[test]
    fn test_configured_date_format_is_recorded() {
        let values: Vec<String> = (1..=28)
            .flat_map(|d| (1..=12).map(move |m| format!("{d:02}/{m:02}/2024")))
            .collect();
        let engine = day_first(&["%d/%m/%Y".to_string()]);
        let meta = engine.infer(&Column::text("when", &values), "when");
        assert_eq!(
            meta.kind,
            MetaKind::Date {
                format: "%d/%m/%Y".to_string()
            }
        );
        assert_eq!(
            meta.encode(CellValue::Text("13/01/2024")),
            EncodedValue::Text("2024-01-13".to_string())
        );
    }

    #[test]
    fn test_configured_month_name_format() {
        let months = ["Jan", "Feb", "Mar", "Apr", "May", "Jun"];
        let values: Vec<String> = (1..=28)
            .flat_map(|d| months.iter().map(move |m| format!("{d} {m} 2024")))
            .collect();
        let engine = day_first(&["%d %b %Y".to_string()]);
        let meta = engine.infer(&Column::text("when", &values), "when");
        assert_eq!(meta.kind_name(), KindName::Date);
        assert_eq!(
            meta.encode(CellValue::Text("1 Jan 2024")),
            EncodedValue::Text("2024-01-01".to_string())
        );
    }

    #[test]
    fn test_iso_text_keeps_default_date_format() {
        let values: Vec<String> = (1..=28)
            .flat_map(|d| (1..=3).map(move |m| format!("2024-{m:02}-{d:02}")))
            .collect();
        let meta = TypeInference::new().infer(&Column::text("d", &values), "d");
        assert_eq!(meta.kind, MetaKind::date());
    }
}
