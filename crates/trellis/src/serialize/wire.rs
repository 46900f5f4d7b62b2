//! The JSON document the viewer reads.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::audit::EncodingAudit;
use crate::display::{DisplayState, PanelKind, View};
use crate::error::{Result, TrellisError};
use crate::meta::{GraphDirection, MetaKind, MetaVariable};

/// A serialized display: its description plus one object per row.
#[derive(Debug, Clone, Serialize)]
pub struct WireDocument {
    pub display: DisplayInfo,
    pub data: Vec<IndexMap<String, Value>>,
    #[serde(skip)]
    pub(crate) audit: EncodingAudit,
}

impl WireDocument {
    /// Counts of values that could not be encoded.
    pub fn audit(&self) -> &EncodingAudit {
        &self.audit
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the document as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let io_error = |source| TrellisError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| TrellisError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let file = File::create(path).map_err(io_error)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DisplayInfo {
    pub name: String,
    pub description: Option<String>,
    pub keysig: String,
    pub keycols: Vec<String>,
    pub panel: WirePanel,
    pub metas: Vec<WireMeta>,
    pub state: DisplayState,
    pub views: Vec<View>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WirePanel {
    pub varname: String,
    #[serde(rename = "type")]
    pub kind: PanelKind,
    pub aspect: f64,
}

/// One meta variable as the viewer sees it.
#[derive(Debug, Clone, Serialize)]
pub struct WireMeta {
    pub varname: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    pub tags: Vec<String>,
    pub filterable: bool,
    pub sortable: bool,
    #[serde(flatten)]
    pub params: WireMetaParams,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WireMetaParams {
    Factor {
        levels: Vec<String>,
    },
    Number {
        digits: i32,
        locale: bool,
        log: bool,
    },
    Currency {
        code: String,
        digits: i32,
    },
    Date {
        format: String,
    },
    Time {
        timezone: Option<String>,
        format: String,
    },
    Href {
        labelcol: Option<String>,
    },
    Graph {
        idvarname: Option<String>,
        direction: GraphDirection,
    },
    Base,
}

impl From<&MetaVariable> for WireMeta {
    fn from(meta: &MetaVariable) -> Self {
        let params = match &meta.kind {
            MetaKind::Factor { levels } => WireMetaParams::Factor {
                levels: levels.clone(),
            },
            MetaKind::Number { digits, locale, log } => WireMetaParams::Number {
                digits: *digits,
                locale: *locale,
                log: *log,
            },
            MetaKind::Currency { code, digits } => WireMetaParams::Currency {
                code: code.clone(),
                digits: *digits,
            },
            MetaKind::Date { format } => WireMetaParams::Date {
                format: format.clone(),
            },
            MetaKind::Time { timezone, format } => WireMetaParams::Time {
                timezone: timezone.clone(),
                format: format.clone(),
            },
            MetaKind::Href { label_column } => WireMetaParams::Href {
                labelcol: label_column.clone(),
            },
            MetaKind::Graph {
                id_column,
                direction,
            } => WireMetaParams::Graph {
                idvarname: id_column.clone(),
                direction: *direction,
            },
            MetaKind::Base => WireMetaParams::Base,
        };

        Self {
            varname: meta.name.clone(),
            label: meta.display_label().to_string(),
            desc: meta.description.clone(),
            tags: meta.tags.clone(),
            filterable: meta.kind.filterable(),
            sortable: meta.kind.sortable(),
            params,
        }
    }
}
