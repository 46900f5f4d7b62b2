//! The panel column and the boundary to panel-rendering adapters.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::input::CellValue;

/// How the viewer embeds a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelKind {
    /// A raster or vector image.
    #[default]
    Img,
    /// An HTML document.
    Iframe,
}

/// Presentation options for the panel column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelOptions {
    pub kind: PanelKind,
    /// Width divided by height.
    pub aspect: f64,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            kind: PanelKind::Img,
            aspect: 1.0,
        }
    }
}

/// Turns a panel column cell into the identifier the viewer loads.
///
/// Rendering adapters implement this; the serializer stores whatever it is
/// handed. `Ok(None)` means the row has no panel.
pub trait PanelResolver {
    fn resolve(&self, row: usize, value: CellValue<'_>) -> Result<Option<String>>;
}

/// Uses the cell's own text (a path, URL or id) as the identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawPanelResolver;

impl PanelResolver for RawPanelResolver {
    fn resolve(&self, _row: usize, value: CellValue<'_>) -> Result<Option<String>> {
        Ok(match value {
            CellValue::Missing => None,
            other => Some(other.to_string()),
        })
    }
}

impl<F> PanelResolver for F
where
    F: Fn(usize, CellValue<'_>) -> Result<Option<String>>,
{
    fn resolve(&self, row: usize, value: CellValue<'_>) -> Result<Option<String>> {
        self(row, value)
    }
}
