//! Displays: a table, its panel column, meta variables and viewer state.

mod model;
mod panel;
mod state;

pub use model::{DisplayModel, DisplayStatus};
pub use panel::{PanelKind, PanelOptions, PanelResolver, RawPanelResolver};
pub use state::{Arrangement, DisplayState, FilterState, Layout, SortDirection, SortState, View};
