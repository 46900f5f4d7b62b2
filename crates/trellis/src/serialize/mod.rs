//! Serialization of displays into the viewer's JSON document.
//!
//! Factor values are 0-origin internally and 1-origin on the wire; the
//! shift happens in [`rebase_factor`] and nowhere else.

mod audit;
mod engine;
mod wire;

pub use audit::EncodingAudit;
pub use engine::{PANEL_KEY, Serializer, rebase_factor, to_wire};
pub use wire::{DisplayInfo, WireDocument, WireMeta, WireMetaParams, WirePanel};
