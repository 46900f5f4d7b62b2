//! Trellis: typed panel metadata and serialization for trellis display viewers.
//!
//! A display is a table with one row per panel (an image or HTML snippet)
//! plus metadata columns the viewer uses to label, sort and filter panels.
//! Trellis infers a kind for each metadata column, checks the display as a
//! whole and writes the JSON document the viewer reads.
//!
//! # Example
//!
//! ```no_run
//! use trellis::Trellis;
//!
//! let trellis = Trellis::new();
//! let (table, _source) = trellis.load("gapminder.csv").unwrap();
//! let mut display = trellis.display("life_expectancy", &table, "panel").unwrap();
//! display.add_sort("lifeExp", trellis::SortDirection::Desc).unwrap();
//!
//! let document = display.serialize().unwrap();
//! document.save("display/displayObj.json").unwrap();
//! ```

pub mod display;
pub mod error;
pub mod inference;
pub mod input;
pub mod meta;
pub mod serialize;
pub mod validation;

mod trellis;

pub use crate::trellis::{Trellis, TrellisConfig};
pub use display::{DisplayModel, DisplayStatus, FilterState, Layout, PanelResolver, SortDirection};
pub use error::{ConfigurationError, Result, SchemaViolation, TrellisError};
pub use inference::{InferenceConfig, TypeInference};
pub use input::{Column, DataTable, SourceMetadata};
pub use meta::{EncodedValue, KindName, MetaKind, MetaVariable};
pub use serialize::{EncodingAudit, Serializer, WireDocument};
pub use validation::{ValidationReport, Violation, ViolationCategory};
