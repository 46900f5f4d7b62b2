//! Turning a validated display into its wire document.

use indexmap::IndexMap;
use log::{info, warn};
use serde_json::{Number, Value};

use super::audit::EncodingAudit;
use super::wire::{DisplayInfo, WireDocument, WireMeta, WirePanel};
use crate::display::{DisplayModel, PanelResolver, RawPanelResolver};
use crate::error::{ConfigurationError, Result, TrellisError};
use crate::input::Column;
use crate::meta::{EncodedValue, MetaKind, MetaVariable};
use crate::validation::panel_key;

/// Row field holding the joined key-column values.
pub const PANEL_KEY: &str = "__PANEL_KEY__";

/// Wire value of a factor cell: the 1-origin level number, or `null`.
///
/// Position 0 is a real level and becomes 1. Anything not naming a level
/// becomes `null`.
pub fn rebase_factor(levels: &[String], value: &EncodedValue) -> Value {
    let position = match value {
        EncodedValue::Level(p) => Some(*p).filter(|&p| p < levels.len()),
        EncodedValue::Text(s) => levels.iter().position(|l| l == s),
        EncodedValue::Missing
        | EncodedValue::Unmatched
        | EncodedValue::Integer(_)
        | EncodedValue::Float(_)
        | EncodedValue::Boolean(_)
        | EncodedValue::Json(_) => None,
    };
    position.map_or(Value::Null, |p| Value::from(p + 1))
}

/// Wire value of an encoded cell for a meta of the given kind.
pub fn to_wire(kind: &MetaKind, value: &EncodedValue) -> Value {
    match (kind, value) {
        (_, EncodedValue::Missing | EncodedValue::Unmatched) => Value::Null,
        (MetaKind::Factor { levels }, value) => rebase_factor(levels, value),
        // Levels only exist for factors
        (_, EncodedValue::Level(_)) => Value::Null,
        (_, EncodedValue::Integer(i)) => Value::from(*i),
        (_, EncodedValue::Float(x)) => Number::from_f64(*x).map_or(Value::Null, Value::Number),
        (_, EncodedValue::Boolean(b)) => Value::Bool(*b),
        (_, EncodedValue::Text(s)) => Value::String(s.clone()),
        (_, EncodedValue::Json(v)) => v.clone(),
    }
}

/// Produces wire documents, resolving panel identifiers through a
/// [`PanelResolver`].
pub struct Serializer<'r> {
    resolver: &'r dyn PanelResolver,
}

impl Serializer<'static> {
    /// A serializer that uses panel cells as identifiers unchanged.
    pub fn new() -> Self {
        Self {
            resolver: &RawPanelResolver,
        }
    }
}

impl Default for Serializer<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> Serializer<'r> {
    pub fn with_resolver(resolver: &'r dyn PanelResolver) -> Self {
        Self { resolver }
    }

    /// Validate `display` and encode every row.
    ///
    /// Nothing is produced if validation fails or the resolver errors.
    pub fn serialize(&self, display: &DisplayModel<'_>) -> Result<WireDocument> {
        let panel = display
            .panel_column()
            .ok_or(ConfigurationError::PanelColumnNotSet)?;
        display.check().into_result()?;

        let table = display.table();
        let panel_column = table.require_column(panel)?;
        let mut columns: Vec<(&MetaVariable, &Column)> = Vec::with_capacity(display.metas().len());
        for meta in display.metas().values() {
            columns.push((meta, table.require_column(&meta.name)?));
        }
        let keyed = !display.key_columns().is_empty();

        let mut audit = EncodingAudit::default();
        let mut data = Vec::with_capacity(table.row_count());

        for row in 0..table.row_count() {
            let mut record = IndexMap::with_capacity(columns.len() + 2);

            for (meta, column) in &columns {
                let encoded = meta.encode(column.data.cell(row));
                let wire = to_wire(&meta.kind, &encoded);
                match encoded {
                    EncodedValue::Missing => audit.record_missing(&meta.name),
                    _ if wire.is_null() => audit.record_unmatched(&meta.name),
                    _ => {}
                }
                record.insert(meta.name.clone(), wire);
            }

            if keyed {
                record.insert(PANEL_KEY.to_string(), Value::String(panel_key(display, row)));
            }

            let panel_id = self
                .resolver
                .resolve(row, panel_column.data.cell(row))
                .map_err(|e| match e {
                    TrellisError::Panel { .. } => e,
                    other => TrellisError::Panel {
                        row,
                        message: other.to_string(),
                    },
                })?;
            let panel_value = match panel_id {
                Some(id) => Value::String(id),
                None => {
                    audit.missing_panels += 1;
                    Value::Null
                }
            };
            record.insert(panel.to_string(), panel_value);

            data.push(record);
        }

        for (meta, count) in &audit.unmatched {
            warn!(
                "Display '{}': {} value(s) of '{}' did not fit its {} kind and were written as null",
                display.name(),
                count,
                meta,
                display.meta(meta).map_or("unknown".to_string(), |m| m.kind_name().to_string())
            );
        }
        info!(
            "Display '{}': serialized {} row(s), {} meta(s), {} unmatched, {} missing panel(s)",
            display.name(),
            data.len(),
            columns.len(),
            audit.total_unmatched(),
            audit.missing_panels
        );

        Ok(WireDocument {
            display: display_info(display, panel),
            data,
            audit,
        })
    }
}

fn display_info(display: &DisplayModel<'_>, panel: &str) -> DisplayInfo {
    let options = display.panel_options();
    DisplayInfo {
        name: display.name().to_string(),
        description: display.description().map(str::to_string),
        keysig: display.keysig().to_string(),
        keycols: display.key_columns().to_vec(),
        panel: WirePanel {
            varname: panel.to_string(),
            kind: options.kind,
            aspect: options.aspect,
        },
        metas: display.metas().values().map(WireMeta::from).collect(),
        state: display.state().clone(),
        views: display.views().to_vec(),
    }
}
