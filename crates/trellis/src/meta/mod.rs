//! Typed meta variables ("cognostics") attached to display columns.

mod kind;
pub(crate) mod temporal;
mod variable;

pub use kind::{
    DEFAULT_CURRENCY, DEFAULT_DATE_FORMAT, DEFAULT_DIGITS, DEFAULT_TIME_FORMAT, GraphDirection,
    KindName, MAX_DIGITS, MetaKind,
};
pub use variable::{EncodedValue, MetaVariable};

pub(crate) use variable::{column_levels, column_timezone};
