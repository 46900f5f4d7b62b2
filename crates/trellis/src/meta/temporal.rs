//! Date and datetime parsing shared by inference and encoding.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

// Shapes the built-in format lists can match.
static LOOKS_LIKE_DATE: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}").unwrap(), // ISO date
        Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}").unwrap(), // US date
        Regex::new(r"^\d{1,2}[-.]\d{1,2}[-.]\d{4}").unwrap(), // European date
        Regex::new(r"^\d{4}/\d{1,2}/\d{1,2}").unwrap(), // Alt ISO
    ]
});

pub const DEFAULT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%d-%m-%Y"];

pub const DEFAULT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const ZONED_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// A successfully parsed temporal string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Temporal {
    Date(NaiveDate),
    DateTime {
        value: NaiveDateTime,
        offset: Option<FixedOffset>,
    },
}

impl Temporal {
    pub(crate) fn is_midnight(&self) -> bool {
        match self {
            Temporal::Date(_) => true,
            Temporal::DateTime { value, .. } => value.time() == NaiveTime::MIN,
        }
    }

    pub(crate) fn offset(&self) -> Option<FixedOffset> {
        match self {
            Temporal::Date(_) => None,
            Temporal::DateTime { offset, .. } => *offset,
        }
    }

    pub(crate) fn date(&self) -> NaiveDate {
        match self {
            Temporal::Date(d) => *d,
            Temporal::DateTime { value, .. } => value.date(),
        }
    }

    pub(crate) fn datetime(&self) -> NaiveDateTime {
        match self {
            Temporal::Date(d) => d.and_time(NaiveTime::MIN),
            Temporal::DateTime { value, .. } => *value,
        }
    }
}

/// Parse `value` trying `preferred` first, then the given format lists.
///
/// Datetime formats are tried before date formats so that a timestamp is
/// never truncated to its date.
pub(crate) fn parse_temporal<S: AsRef<str>>(
    value: &str,
    preferred: Option<&str>,
    date_formats: &[S],
    datetime_formats: &[S],
) -> Option<Temporal> {
    let trimmed = value.trim();
    if let Some(parsed) = preferred.and_then(|format| parse_with_format(trimmed, format)) {
        return Some(parsed);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(zoned(dt));
    }
    for format in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, format) {
            return Some(zoned(dt));
        }
    }
    for format in datetime_formats {
        if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, format.as_ref()) {
            return Some(Temporal::DateTime {
                value,
                offset: None,
            });
        }
    }
    for format in date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format.as_ref()) {
            return Some(Temporal::Date(date));
        }
    }
    None
}

/// Parse with the built-in format lists only.
pub(crate) fn parse_temporal_default(value: &str, preferred: Option<&str>) -> Option<Temporal> {
    let trimmed = value.trim();
    if let Some(parsed) = preferred.and_then(|format| parse_with_format(trimmed, format)) {
        return Some(parsed);
    }
    if !LOOKS_LIKE_DATE.iter().any(|p| p.is_match(trimmed)) {
        return None;
    }
    parse_temporal(trimmed, None, DEFAULT_DATE_FORMATS, DEFAULT_DATETIME_FORMATS)
}

/// The first pattern that parses every one of `values`.
///
/// Datetime patterns are tried before date patterns. Zoned and RFC 3339
/// values have no pattern, so a column holding them yields `None`.
pub(crate) fn shared_format<'f, V, S>(
    values: &[V],
    date_formats: &'f [S],
    datetime_formats: &'f [S],
) -> Option<&'f str>
where
    V: AsRef<str>,
    S: AsRef<str>,
{
    datetime_formats
        .iter()
        .chain(date_formats)
        .map(AsRef::as_ref)
        .find(|format| {
            !values.is_empty()
                && values
                    .iter()
                    .all(|v| parse_with_format(v.as_ref().trim(), format).is_some())
        })
}

fn parse_with_format(value: &str, format: &str) -> Option<Temporal> {
    if let Ok(value) = NaiveDateTime::parse_from_str(value, format) {
        return Some(Temporal::DateTime {
            value,
            offset: None,
        });
    }
    NaiveDate::parse_from_str(value, format)
        .ok()
        .map(Temporal::Date)
}

fn zoned(dt: DateTime<FixedOffset>) -> Temporal {
    Temporal::DateTime {
        value: dt.naive_local(),
        offset: Some(*dt.offset()),
    }
}

/// ISO-8601 date.
pub(crate) fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// ISO-8601 date and time, with the offset appended when known.
pub(crate) fn iso_datetime(value: NaiveDateTime, offset: Option<FixedOffset>) -> String {
    let mut out = value.format("%Y-%m-%dT%H:%M:%S%.f").to_string();
    if let Some(offset) = offset {
        out.push_str(&offset.to_string());
    }
    out
}
