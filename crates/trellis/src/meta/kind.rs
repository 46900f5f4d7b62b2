//! The closed set of meta variable kinds and their parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Axis a graph meta is drawn along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphDirection {
    X,
    #[default]
    Y,
}

/// Kind-specific parameters of a meta variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MetaKind {
    /// Categorical variable; values are 0-origin positions into `levels`.
    Factor { levels: Vec<String> },
    /// Numeric variable.
    Number {
        /// Decimal digits shown.
        digits: i32,
        /// Use locale digit grouping.
        locale: bool,
        /// Display on a log scale.
        log: bool,
    },
    Currency {
        /// ISO 4217 code.
        code: String,
        digits: i32,
    },
    Date {
        /// Date-only pattern, also tried first when parsing text.
        format: String,
    },
    Time {
        /// IANA zone name or `+HH:MM` offset.
        timezone: Option<String>,
        format: String,
    },
    Href {
        /// Column supplying link text.
        label_column: Option<String>,
    },
    Graph {
        id_column: Option<String>,
        direction: GraphDirection,
    },
    /// Catch-all for data no typed kind fits.
    Base,
}

pub const DEFAULT_DIGITS: i32 = 2;
pub const MAX_DIGITS: i32 = 15;
pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl MetaKind {
    pub fn number() -> Self {
        MetaKind::Number {
            digits: DEFAULT_DIGITS,
            locale: true,
            log: false,
        }
    }

    pub fn currency(code: impl Into<String>) -> Self {
        MetaKind::Currency {
            code: code.into(),
            digits: DEFAULT_DIGITS,
        }
    }

    pub fn date() -> Self {
        MetaKind::Date {
            format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    pub fn time(timezone: Option<String>) -> Self {
        MetaKind::Time {
            timezone,
            format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }

    pub fn name(&self) -> KindName {
        match self {
            MetaKind::Factor { .. } => KindName::Factor,
            MetaKind::Number { .. } => KindName::Number,
            MetaKind::Currency { .. } => KindName::Currency,
            MetaKind::Date { .. } => KindName::Date,
            MetaKind::Time { .. } => KindName::Time,
            MetaKind::Href { .. } => KindName::Href,
            MetaKind::Graph { .. } => KindName::Graph,
            MetaKind::Base => KindName::Base,
        }
    }

    pub fn filterable(&self) -> bool {
        self.name().filterable()
    }

    pub fn sortable(&self) -> bool {
        self.name().sortable()
    }

    /// Levels, for factors.
    pub fn levels(&self) -> Option<&[String]> {
        match self {
            MetaKind::Factor { levels } => Some(levels),
            _ => None,
        }
    }
}

/// Discriminant of [`MetaKind`], parseable from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindName {
    Factor,
    Number,
    Currency,
    Date,
    Time,
    Href,
    Graph,
    Base,
}

impl KindName {
    pub const ALL: [KindName; 8] = [
        KindName::Factor,
        KindName::Number,
        KindName::Currency,
        KindName::Date,
        KindName::Time,
        KindName::Href,
        KindName::Graph,
        KindName::Base,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KindName::Factor => "factor",
            KindName::Number => "number",
            KindName::Currency => "currency",
            KindName::Date => "date",
            KindName::Time => "time",
            KindName::Href => "href",
            KindName::Graph => "graph",
            KindName::Base => "base",
        }
    }

    pub fn filterable(&self) -> bool {
        matches!(
            self,
            KindName::Factor | KindName::Number | KindName::Currency | KindName::Date | KindName::Time
        )
    }

    pub fn sortable(&self) -> bool {
        self.filterable() || *self == KindName::Base
    }

    /// Whether values of this kind are numeric on the wire.
    pub fn is_numeric(&self) -> bool {
        matches!(self, KindName::Number | KindName::Currency)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, KindName::Date | KindName::Time)
    }
}

impl fmt::Display for KindName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KindName {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        KindName::ALL
            .into_iter()
            .find(|k| k.as_str() == lowered)
            .ok_or_else(|| ConfigurationError::UnknownKind(s.to_string()))
    }
}
