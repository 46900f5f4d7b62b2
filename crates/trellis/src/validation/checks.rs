//! Whole-display checks run before serialization.

use std::collections::HashSet;

use indexmap::IndexMap;
use regex::Regex;

use super::report::ValidationReport;
use super::violation::Violation;
use crate::display::{DisplayModel, DisplayState, FilterState};
use crate::meta::{MetaKind, MetaVariable};

/// A check over a whole display.
pub trait Check {
    /// Run the check and return violations.
    fn check(&self, display: &DisplayModel<'_>) -> Vec<Violation>;
}

/// The panel column is set, exists, and is not also a meta.
pub struct PanelCheck;

impl Check for PanelCheck {
    fn check(&self, display: &DisplayModel<'_>) -> Vec<Violation> {
        let Some(panel) = display.panel_column() else {
            return vec![Violation::configuration("panel", "no panel column designated")];
        };
        let mut violations = Vec::new();
        if !display.table().has_column(panel) {
            violations.push(Violation::configuration(
                "panel",
                format!("panel column '{panel}' does not exist"),
            ));
        }
        if display.metas().contains_key(panel) {
            violations.push(Violation::configuration(
                "panel",
                format!("panel column '{panel}' is also declared as a meta variable"),
            ));
        }
        let aspect = display.panel_options().aspect;
        if !(aspect.is_finite() && aspect > 0.0) {
            violations.push(Violation::configuration(
                "panel",
                format!("aspect ratio must be positive, got {aspect}"),
            ));
        }
        violations
    }
}

/// Every meta, and every column a meta points at, exists in the table.
pub struct MetaColumnCheck;

impl Check for MetaColumnCheck {
    fn check(&self, display: &DisplayModel<'_>) -> Vec<Violation> {
        let table = display.table();
        let mut violations = Vec::new();

        for (key, meta) in display.metas() {
            if key != &meta.name {
                violations.push(Violation::configuration(
                    key.as_str(),
                    format!("registered under '{key}' but named '{}'", meta.name),
                ));
            }
            if !table.has_column(&meta.name) {
                violations.push(Violation::configuration(
                    meta.name.as_str(),
                    "column does not exist in the table",
                ));
            }
            let referenced = match &meta.kind {
                MetaKind::Href { label_column } => label_column.as_deref(),
                MetaKind::Graph { id_column, .. } => id_column.as_deref(),
                _ => None,
            };
            if let Some(column) = referenced {
                if !table.has_column(column) {
                    violations.push(Violation::configuration(
                        meta.name.as_str(),
                        format!("referenced column '{column}' does not exist"),
                    ));
                }
            }
        }

        violations
    }
}

/// Each meta's own parameters are well formed.
pub struct MetaSchemaCheck;

impl Check for MetaSchemaCheck {
    fn check(&self, display: &DisplayModel<'_>) -> Vec<Violation> {
        display
            .metas()
            .values()
            .flat_map(MetaVariable::validate)
            .collect()
    }
}

/// Layout, labels, sorts and filters of the default state and of every view.
pub struct StateCheck;

impl Check for StateCheck {
    fn check(&self, display: &DisplayModel<'_>) -> Vec<Violation> {
        let mut violations = check_state("state", display.state(), display.metas());

        let mut names = HashSet::new();
        for view in display.views() {
            let subject = format!("view '{}'", view.name);
            if view.name.trim().is_empty() {
                violations.push(Violation::configuration("view", "view name must not be empty"));
            }
            if !names.insert(view.name.as_str()) {
                violations.push(Violation::configuration(subject.as_str(), "duplicate view name"));
            }
            violations.extend(check_state(&subject, &view.state, display.metas()));
        }

        violations
    }
}

fn check_state(
    subject: &str,
    state: &DisplayState,
    metas: &IndexMap<String, MetaVariable>,
) -> Vec<Violation> {
    let mut violations: Vec<Violation> = state
        .layout
        .problems()
        .into_iter()
        .map(|p| Violation::configuration(subject, p))
        .collect();

    let mut seen = HashSet::new();
    for label in &state.labels {
        if !metas.contains_key(label) {
            violations.push(Violation::configuration(
                subject,
                format!("label '{label}' is not a meta variable"),
            ));
        }
        if !seen.insert(label.as_str()) {
            violations.push(Violation::configuration(subject, format!("duplicate label '{label}'")));
        }
    }

    let mut sorted = HashSet::new();
    for sort in &state.sorts {
        match metas.get(&sort.varname) {
            None => violations.push(Violation::configuration(
                subject,
                format!("sort on '{}' which is not a meta variable", sort.varname),
            )),
            Some(meta) if !meta.kind.sortable() => violations.push(Violation::configuration(
                subject,
                format!("{} meta '{}' is not sortable", meta.kind_name(), meta.name),
            )),
            Some(_) => {}
        }
        if !sorted.insert(sort.varname.as_str()) {
            violations.push(Violation::configuration(
                subject,
                format!("'{}' is sorted more than once", sort.varname),
            ));
        }
    }

    for filter in &state.filters {
        violations.extend(check_filter(subject, filter, metas));
    }

    violations
}

fn check_filter(
    subject: &str,
    filter: &FilterState,
    metas: &IndexMap<String, MetaVariable>,
) -> Vec<Violation> {
    let varname = filter.varname();
    let Some(meta) = metas.get(varname) else {
        return vec![Violation::configuration(
            subject,
            format!("filter on '{varname}' which is not a meta variable"),
        )];
    };
    if !meta.kind.filterable() {
        return vec![Violation::configuration(
            subject,
            format!("{} meta '{varname}' is not filterable", meta.kind_name()),
        )];
    }

    let mismatch = |expected: &str| {
        vec![Violation::configuration(
            subject,
            format!(
                "{expected} filter on {} meta '{varname}'",
                meta.kind_name()
            ),
        )]
    };

    let mut violations = Vec::new();
    match filter {
        FilterState::Category { values, regexp, .. } => {
            let Some(levels) = meta.kind.levels() else {
                return mismatch("category");
            };
            for value in values {
                if !levels.contains(value) {
                    violations.push(Violation::configuration(
                        subject,
                        format!("filter value '{value}' is not a level of '{varname}'"),
                    ));
                }
            }
            if let Some(pattern) = regexp {
                if let Err(e) = Regex::new(pattern) {
                    violations.push(Violation::configuration(
                        subject,
                        format!("invalid filter regexp on '{varname}': {e}"),
                    ));
                }
            }
        }
        FilterState::NumberRange { min, max, .. } => {
            if !meta.kind_name().is_numeric() {
                return mismatch("number range");
            }
            if let (Some(lo), Some(hi)) = (min, max) {
                if lo > hi {
                    violations.push(Violation::configuration(
                        subject,
                        format!("filter on '{varname}' has min {lo} above max {hi}"),
                    ));
                }
            }
        }
        FilterState::DateRange { min, max, .. } => {
            if !meta.kind_name().is_temporal() {
                return mismatch("date range");
            }
            if let (Some(lo), Some(hi)) = (min, max) {
                if lo > hi {
                    violations.push(Violation::configuration(
                        subject,
                        format!("filter on '{varname}' has min {lo} after max {hi}"),
                    ));
                }
            }
        }
    }
    violations
}

/// Key columns exist and their joined values are unique per row.
pub struct KeyColumnCheck;

impl Check for KeyColumnCheck {
    fn check(&self, display: &DisplayModel<'_>) -> Vec<Violation> {
        let keys = display.key_columns();
        if keys.is_empty() {
            return Vec::new();
        }
        let table = display.table();
        let missing: Vec<&String> = keys.iter().filter(|k| !table.has_column(k)).collect();
        if !missing.is_empty() {
            return missing
                .into_iter()
                .map(|k| Violation::configuration("keycols", format!("key column '{k}' does not exist")))
                .collect();
        }

        let mut seen = HashSet::new();
        let mut duplicates = 0;
        for row in 0..table.row_count() {
            if !seen.insert(panel_key(display, row)) {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            vec![Violation::configuration(
                "keycols",
                format!(
                    "key columns {:?} do not identify rows uniquely ({duplicates} duplicate row(s))",
                    keys
                ),
            )]
        } else {
            Vec::new()
        }
    }
}

/// Key of `row`: the key columns' values joined with `_`, missing as `NA`.
pub(crate) fn panel_key(display: &DisplayModel<'_>, row: usize) -> String {
    display
        .key_columns()
        .iter()
        .map(|k| {
            let cell = display.table().get(row, k);
            if cell.is_missing() {
                "NA".to_string()
            } else {
                cell.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("_")
}

/// Runs every check over a display.
pub struct ValidationEngine {
    checks: Vec<Box<dyn Check>>,
}

impl ValidationEngine {
    /// Create a validation engine with all default checks.
    pub fn new() -> Self {
        Self {
            checks: vec![
                Box::new(PanelCheck),
                Box::new(MetaColumnCheck),
                Box::new(MetaSchemaCheck),
                Box::new(StateCheck),
                Box::new(KeyColumnCheck),
            ],
        }
    }

    /// Run all checks and collect violations.
    pub fn validate(&self, display: &DisplayModel<'_>) -> ValidationReport {
        let violations = self
            .checks
            .iter()
            .flat_map(|c| c.check(display))
            .collect();
        ValidationReport::new(violations)
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}
