use serde::Serialize;

use super::violation::{Violation, ViolationCategory};
use crate::error::{ConfigurationError, Result, SchemaViolation};

/// Outcome of running every check over a display.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn count(&self, category: ViolationCategory) -> usize {
        self.violations
            .iter()
            .filter(|v| v.category == category)
            .count()
    }

    /// Turn the report into an error. Configuration problems take precedence:
    /// if there are any, only they are reported.
    pub fn into_result(self) -> Result<()> {
        if self.violations.is_empty() {
            return Ok(());
        }
        let (configuration, schema): (Vec<_>, Vec<_>) = self
            .violations
            .into_iter()
            .partition(Violation::is_configuration);
        if !configuration.is_empty() {
            return Err(ConfigurationError::Rejected {
                violations: configuration,
            }
            .into());
        }
        Err(SchemaViolation::new(schema).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrellisError;

    #[test]
    fn test_empty_report_is_ok() {
        assert!(ValidationReport::default().into_result().is_ok());
    }

    #[test]
    fn test_configuration_wins() {
        let report = ValidationReport::new(vec![
            Violation::schema("score", "digits must be between 0 and 15"),
            Violation::configuration("panel", "no panel column designated"),
        ]);
        assert_eq!(report.count(ViolationCategory::Schema), 1);
        match report.into_result() {
            Err(TrellisError::Configuration(ConfigurationError::Rejected { violations })) => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].subject, "panel");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_schema_only() {
        let report = ValidationReport::new(vec![Violation::schema("price", "bad code")]);
        assert!(matches!(report.into_result(), Err(TrellisError::Schema(_))));
    }
}
