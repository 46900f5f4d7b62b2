//! Whole-display validation: every check that must pass before a display
//! is serialized.

mod checks;
mod report;
mod violation;

pub use checks::{
    Check, KeyColumnCheck, MetaColumnCheck, MetaSchemaCheck, PanelCheck, StateCheck,
    ValidationEngine,
};
pub(crate) use checks::panel_key;
pub use report::ValidationReport;
pub use violation::{Violation, ViolationCategory};
