//! Tunable inference thresholds.

use serde::{Deserialize, Serialize};

use crate::meta::DEFAULT_DIGITS;
use crate::meta::temporal::{DEFAULT_DATE_FORMATS, DEFAULT_DATETIME_FORMATS};

/// Configuration for meta type inference.
///
/// The thresholds are heuristics; nothing downstream depends on their
/// exact values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// A text column becomes a factor only with fewer distinct values than this.
    pub max_factor_levels: usize,
    /// ...and only if distinct values are fewer than this fraction of rows.
    pub max_factor_ratio: f64,
    /// Digits given to inferred number metas.
    pub default_digits: i32,
    /// Date-only patterns tried on text columns.
    pub date_formats: Vec<String>,
    /// Date-and-time patterns tried on text columns.
    pub datetime_formats: Vec<String>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            max_factor_levels: 50,
            max_factor_ratio: 0.5,
            default_digits: DEFAULT_DIGITS,
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect(),
            datetime_formats: DEFAULT_DATETIME_FORMATS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl InferenceConfig {
    /// Whether `distinct` values over `rows` rows is low enough for a factor.
    pub fn is_factor_cardinality(&self, distinct: usize, rows: usize) -> bool {
        distinct > 0
            && distinct < self.max_factor_levels
            && (distinct as f64) < self.max_factor_ratio * rows as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinality_boundary() {
        let config = InferenceConfig::default();
        assert!(config.is_factor_cardinality(49, 200));
        assert!(!config.is_factor_cardinality(50, 200));
        assert!(!config.is_factor_cardinality(51, 200));
        assert!(!config.is_factor_cardinality(10, 20));
        assert!(!config.is_factor_cardinality(0, 20));
    }

    #[test]
    fn test_partial_config_json() {
        let config: InferenceConfig = serde_json::from_str(r#"{"max_factor_levels": 10}"#).unwrap();
        assert_eq!(config.max_factor_levels, 10);
        assert_eq!(config.max_factor_ratio, 0.5);
        assert!(!config.date_formats.is_empty());
    }
}
