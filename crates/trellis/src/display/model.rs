//! The display builder: one table, its panel column and its meta variables.

use std::collections::HashSet;
use std::ptr;

use indexmap::IndexMap;
use log::{debug, info};
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::panel::{PanelOptions, PanelResolver};
use super::state::{DisplayState, FilterState, Layout, SortDirection, SortState, View};
use crate::error::{ConfigurationError, Result, SchemaViolation, TrellisError};
use crate::inference::TypeInference;
use crate::input::DataTable;
use crate::meta::MetaVariable;
use crate::serialize::{Serializer, WireDocument};
use crate::validation::{ValidationEngine, ValidationReport};

/// Where a display is in its configure/validate/serialize cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    /// No panel column yet.
    Unconfigured,
    PanelColumnSet,
    Configuring,
    /// Passed whole-model validation and unchanged since.
    Validated,
    Serialized,
}

/// A display under construction.
///
/// Holds a reference to its table; configuration methods check their own
/// arguments immediately and return the display for chaining.
#[derive(Debug)]
pub struct DisplayModel<'t> {
    name: String,
    description: Option<String>,
    table: &'t DataTable,
    panel_column: Option<String>,
    panel: PanelOptions,
    metas: IndexMap<String, MetaVariable>,
    key_columns: Vec<String>,
    state: DisplayState,
    views: Vec<View>,
    status: DisplayStatus,
    keysig: OnceCell<String>,
}

impl<'t> DisplayModel<'t> {
    /// Create a display over `table`. The name ends up in output paths, so
    /// it is limited to letters, digits, spaces and `_ - .`.
    pub fn new(name: impl Into<String>, table: &'t DataTable) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(invalid("display name must not be empty"));
        }
        if let Some(bad) = name
            .chars()
            .find(|c| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ' ')))
        {
            return Err(invalid(format!(
                "display name '{name}' contains unsupported character '{bad}'"
            )));
        }

        Ok(Self {
            name,
            description: None,
            table,
            panel_column: None,
            panel: PanelOptions::default(),
            metas: IndexMap::new(),
            key_columns: Vec::new(),
            state: DisplayState::default(),
            views: Vec::new(),
            status: DisplayStatus::Unconfigured,
            keysig: OnceCell::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn table(&self) -> &'t DataTable {
        self.table
    }

    pub fn panel_column(&self) -> Option<&str> {
        self.panel_column.as_deref()
    }

    pub fn panel_options(&self) -> &PanelOptions {
        &self.panel
    }

    pub fn metas(&self) -> &IndexMap<String, MetaVariable> {
        &self.metas
    }

    pub fn meta(&self, name: &str) -> Option<&MetaVariable> {
        self.metas.get(name)
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn status(&self) -> DisplayStatus {
        self.status
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self.touch();
        self
    }

    /// Designate the column holding panel references.
    pub fn set_panel_column(&mut self, column: &str) -> Result<&mut Self> {
        self.table.require_column(column)?;
        if self.metas.contains_key(column) {
            return Err(ConfigurationError::PanelColumnIsMeta {
                name: column.to_string(),
            }
            .into());
        }
        debug!("Display '{}': panel column '{}'", self.name, column);
        self.panel_column = Some(column.to_string());
        self.status = match self.status {
            DisplayStatus::Unconfigured => DisplayStatus::PanelColumnSet,
            _ => DisplayStatus::Configuring,
        };
        Ok(self)
    }

    pub fn set_panel_options(&mut self, options: PanelOptions) -> Result<&mut Self> {
        if !(options.aspect.is_finite() && options.aspect > 0.0) {
            return Err(invalid(format!(
                "panel aspect ratio must be positive, got {}",
                options.aspect
            )));
        }
        self.panel = options;
        self.touch();
        Ok(self)
    }

    /// Declare a meta variable; fails if one with the same name exists.
    pub fn add_meta(&mut self, meta: MetaVariable) -> Result<&mut Self> {
        self.check_meta(&meta)?;
        if self.metas.contains_key(&meta.name) {
            return Err(ConfigurationError::DuplicateMeta { name: meta.name }.into());
        }
        debug!("Display '{}': add {} meta '{}'", self.name, meta.kind_name(), meta.name);
        self.metas.insert(meta.name.clone(), meta);
        self.touch();
        Ok(self)
    }

    /// Declare a meta variable, replacing any existing one of the same name.
    pub fn replace_meta(&mut self, meta: MetaVariable) -> Result<&mut Self> {
        self.check_meta(&meta)?;
        debug!("Display '{}': set {} meta '{}'", self.name, meta.kind_name(), meta.name);
        self.metas.insert(meta.name.clone(), meta);
        self.touch();
        Ok(self)
    }

    /// Declare `column` as a meta of the named kind, with default parameters.
    pub fn declare(&mut self, column: &str, kind: &str) -> Result<&mut Self> {
        let column = self.table.require_column(column)?;
        let meta = MetaVariable::from_kind_name(kind, column)?;
        self.add_meta(meta)
    }

    /// Infer metas for every column that is neither the panel column nor
    /// already declared.
    pub fn infer_metas(&mut self) -> &mut Self {
        self.infer_metas_with(&TypeInference::new())
    }

    pub fn infer_metas_with(&mut self, engine: &TypeInference) -> &mut Self {
        let mut exclude: HashSet<&str> = self.metas.keys().map(String::as_str).collect();
        if let Some(panel) = &self.panel_column {
            exclude.insert(panel);
        }
        let inferred = engine.infer_table(self.table, &exclude);
        info!(
            "Display '{}': inferred {} meta variable(s)",
            self.name,
            inferred.len()
        );
        for item in inferred {
            self.metas.insert(item.meta.name.clone(), item.meta);
        }
        self.touch();
        self
    }

    pub fn set_layout(&mut self, layout: Layout) -> Result<&mut Self> {
        let problems = layout.problems();
        if !problems.is_empty() {
            return Err(invalid(problems.join("; ")));
        }
        self.state.layout = layout;
        self.touch();
        Ok(self)
    }

    /// Columns shown as labels under each panel.
    pub fn set_labels<I, S>(&mut self, labels: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        for label in &labels {
            self.table.require_column(label)?;
        }
        self.state.labels = labels;
        self.touch();
        Ok(self)
    }

    pub fn add_sort(&mut self, varname: &str, dir: SortDirection) -> Result<&mut Self> {
        self.table.require_column(varname)?;
        self.state.sorts.push(SortState::new(varname, dir));
        self.touch();
        Ok(self)
    }

    pub fn add_filter(&mut self, filter: FilterState) -> Result<&mut Self> {
        self.table.require_column(filter.varname())?;
        self.state.filters.push(filter);
        self.touch();
        Ok(self)
    }

    /// Save a named state the viewer offers alongside the default one.
    pub fn add_view(&mut self, name: impl Into<String>, state: DisplayState) -> Result<&mut Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(invalid("view name must not be empty"));
        }
        if self.views.iter().any(|v| v.name == name) {
            return Err(invalid(format!("view '{name}' already exists")));
        }
        for column in state.referenced_columns() {
            self.table.require_column(column)?;
        }
        let problems = state.layout.problems();
        if !problems.is_empty() {
            return Err(invalid(format!("view '{name}': {}", problems.join("; "))));
        }
        self.views.push(View { name, state });
        self.touch();
        Ok(self)
    }

    /// Columns whose joined values identify each row.
    pub fn set_key_columns<I, S>(&mut self, columns: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(invalid("key columns must not be empty"));
        }
        for column in &columns {
            self.table.require_column(column)?;
        }
        self.key_columns = columns;
        self.touch();
        Ok(self)
    }

    /// Point the display at another table. The cached keysig is dropped
    /// only when the table actually changes.
    pub fn set_table(&mut self, table: &'t DataTable) -> &mut Self {
        if !ptr::eq(self.table, table) {
            debug!("Display '{}': table changed, keysig invalidated", self.name);
            self.table = table;
            self.keysig = OnceCell::new();
        }
        self.touch();
        self
    }

    /// Content-derived signature of the display's data, computed once.
    pub fn keysig(&self) -> &str {
        self.keysig.get_or_init(|| compute_keysig(&self.name, self.table))
    }

    /// Run all whole-model checks without changing anything.
    pub fn check(&self) -> ValidationReport {
        ValidationEngine::new().validate(self)
    }

    /// Run whole-model validation, failing on the first category of problem.
    pub fn validate(&mut self) -> Result<&mut Self> {
        if self.panel_column.is_none() {
            return Err(ConfigurationError::PanelColumnNotSet.into());
        }
        self.check().into_result()?;
        self.status = DisplayStatus::Validated;
        Ok(self)
    }

    /// Validate and produce the wire document using raw panel references.
    pub fn serialize(&mut self) -> Result<WireDocument> {
        let document = Serializer::new().serialize(self)?;
        self.status = DisplayStatus::Serialized;
        Ok(document)
    }

    /// Validate and produce the wire document, resolving panels through `resolver`.
    pub fn serialize_with(&mut self, resolver: &dyn PanelResolver) -> Result<WireDocument> {
        let document = Serializer::with_resolver(resolver).serialize(self)?;
        self.status = DisplayStatus::Serialized;
        Ok(document)
    }

    fn check_meta(&self, meta: &MetaVariable) -> Result<()> {
        let violations = meta.validate();
        if !violations.is_empty() {
            return Err(TrellisError::Schema(SchemaViolation::new(violations)));
        }
        self.table.require_column(&meta.name)?;
        if self.panel_column.as_deref() == Some(meta.name.as_str()) {
            return Err(ConfigurationError::PanelColumnIsMeta {
                name: meta.name.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn touch(&mut self) {
        if self.status != DisplayStatus::Unconfigured {
            self.status = DisplayStatus::Configuring;
        }
    }
}

fn invalid(message: impl Into<String>) -> TrellisError {
    ConfigurationError::InvalidArgument(message.into()).into()
}

/// SHA-256 over the name, column names, shape and the first and last rows.
fn compute_keysig(name: &str, table: &DataTable) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update([0u8]);
    for column in table.columns() {
        hasher.update(column.name.as_bytes());
        hasher.update([0x1fu8]);
        hasher.update(column.data.dtype().as_bytes());
        hasher.update([0x1eu8]);
    }
    hasher.update(format!("{}x{}", table.row_count(), table.column_count()).as_bytes());

    let mut sample_rows = vec![0];
    if table.row_count() > 1 {
        sample_rows.push(table.row_count() - 1);
    }
    if table.row_count() > 0 {
        for row in sample_rows {
            hasher.update([0u8]);
            for column in table.columns() {
                hasher.update(column.data.cell(row).to_string().as_bytes());
                hasher.update([0x1fu8]);
            }
        }
    }

    format!("{:x}", hasher.finalize())
}
