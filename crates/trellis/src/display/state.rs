//! Presentation state: layout, labels, sorts, filters and saved views.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Order panels are laid out on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arrangement {
    #[default]
    Rows,
    Cols,
}

/// Grid layout of the panel view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub ncol: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nrow: Option<usize>,
    pub page: usize,
    #[serde(default)]
    pub arrangement: Arrangement,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            ncol: 1,
            nrow: None,
            page: 1,
            arrangement: Arrangement::Rows,
        }
    }
}

impl Layout {
    pub fn new(ncol: usize) -> Self {
        Self {
            ncol,
            ..Self::default()
        }
    }

    pub fn with_nrow(mut self, nrow: usize) -> Self {
        self.nrow = Some(nrow);
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn with_arrangement(mut self, arrangement: Arrangement) -> Self {
        self.arrangement = arrangement;
        self
    }

    /// Problems with the layout, if any.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.ncol == 0 {
            problems.push("layout ncol must be at least 1".to_string());
        }
        if self.nrow == Some(0) {
            problems.push("layout nrow must be at least 1".to_string());
        }
        if self.page == 0 {
            problems.push("layout page must be at least 1".to_string());
        }
        problems
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(ConfigurationError::InvalidArgument(format!(
                "unknown sort direction '{other}'"
            ))),
        }
    }
}

/// A default sort on one meta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortState {
    pub varname: String,
    pub dir: SortDirection,
}

impl SortState {
    pub fn new(varname: impl Into<String>, dir: SortDirection) -> Self {
        Self {
            varname: varname.into(),
            dir,
        }
    }
}

/// A default filter on one meta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filtertype", rename_all = "snake_case")]
pub enum FilterState {
    /// Keep panels whose factor value is one of `values` or matches `regexp`.
    Category {
        varname: String,
        #[serde(default)]
        values: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        regexp: Option<String>,
    },
    NumberRange {
        varname: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    DateRange {
        varname: String,
        min: Option<NaiveDate>,
        max: Option<NaiveDate>,
    },
}

impl FilterState {
    pub fn category<I, S>(varname: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterState::Category {
            varname: varname.into(),
            values: values.into_iter().map(Into::into).collect(),
            regexp: None,
        }
    }

    pub fn number_range(varname: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        FilterState::NumberRange {
            varname: varname.into(),
            min,
            max,
        }
    }

    pub fn date_range(
        varname: impl Into<String>,
        min: Option<NaiveDate>,
        max: Option<NaiveDate>,
    ) -> Self {
        FilterState::DateRange {
            varname: varname.into(),
            min,
            max,
        }
    }

    pub fn varname(&self) -> &str {
        match self {
            FilterState::Category { varname, .. }
            | FilterState::NumberRange { varname, .. }
            | FilterState::DateRange { varname, .. } => varname,
        }
    }
}

/// Everything the viewer opens with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayState {
    pub layout: Layout,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub sorts: Vec<SortState>,
    #[serde(default)]
    pub filters: Vec<FilterState>,
}

impl DisplayState {
    /// Column names this state refers to.
    pub fn referenced_columns(&self) -> impl Iterator<Item = &str> {
        self.labels
            .iter()
            .map(String::as_str)
            .chain(self.sorts.iter().map(|s| s.varname.as_str()))
            .chain(self.filters.iter().map(FilterState::varname))
    }
}

/// A named, saved state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub name: String,
    pub state: DisplayState,
}
