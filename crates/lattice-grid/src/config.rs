//! Declarative grid configuration.
//!
//! A [`GridConfig`] describes the columns of a grid and the appearance
//! tokens of its widgets. It can be written in TOML or JSON:
//!
//! ```toml
//! widget_appearance = "striped-cell"
//!
//! [[columns]]
//! path = "name.first"
//! caption = "First name"
//! width = 120
//! sortable = true
//! sort_order = "ascending"
//!
//! [[columns]]
//! path = "age"
//! flex = 1
//! read_only = true
//! ```

use std::path::Path;
use std::sync::Arc;

use lattice_grid_core::logging::targets;
use serde::{Deserialize, Serialize};

use crate::column::{Column, Columns, SortOrder};
use crate::error::{Error, Result};
use crate::factory::WidgetFactory;

/// Configuration of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Model attribute path.
    pub path: Option<String>,
    /// Header caption.
    pub caption: Option<String>,
    /// Preferred width.
    pub width: Option<i32>,
    /// Minimum width.
    pub min_width: Option<i32>,
    /// Maximum width.
    pub max_width: Option<i32>,
    /// Flex factor.
    pub flex: u32,
    /// Read-only flag.
    pub read_only: bool,
    /// Enabled flag.
    pub enabled: bool,
    /// Whether cells can be edited.
    pub editable: bool,
    /// Whether the column can be sorted.
    pub sortable: bool,
    /// Initial sort order.
    pub sort_order: SortOrder,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            path: None,
            caption: None,
            width: None,
            min_width: None,
            max_width: None,
            flex: 0,
            read_only: false,
            enabled: true,
            editable: false,
            sortable: false,
            sort_order: SortOrder::None,
        }
    }
}

impl ColumnConfig {
    /// Captures the current configuration of `column`.
    pub fn from_column(column: &Column) -> Self {
        Self {
            path: column.path(),
            caption: column.caption(),
            width: column.width(),
            min_width: column.min_width(),
            max_width: column.max_width(),
            flex: column.flex(),
            read_only: column.is_read_only(),
            enabled: column.is_enabled(),
            editable: column.is_editable(),
            sortable: column.is_sortable(),
            sort_order: column.sort_order(),
        }
    }

    /// Creates a column from this configuration.
    pub fn build(&self) -> Column {
        let column = Column::default();
        self.apply(&column);
        column
    }

    /// Writes this configuration onto an existing column.
    pub fn apply(&self, column: &Column) {
        column.set_path(self.path.clone());
        column.set_caption(self.caption.clone());
        column.set_width(self.width);
        column.set_min_width(self.min_width);
        column.set_max_width(self.max_width);
        column.set_flex(self.flex);
        column.set_read_only(self.read_only);
        column.set_enabled(self.enabled);
        column.set_editable(self.editable);
        column.set_sortable(self.sortable);
        column.set_sort_order(self.sort_order);
    }
}

/// Configuration of a grid's columns and widget appearances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Appearance token for display widgets.
    pub widget_appearance: Option<String>,
    /// Appearance token for editors.
    pub editor_appearance: Option<String>,
    /// Columns, in display order.
    pub columns: Vec<ColumnConfig>,
}

impl GridConfig {
    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML or an invalid configuration.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or an invalid configuration.
    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file, choosing the format by extension
    /// (`.json` for JSON, anything else for TOML).
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed, or is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        tracing::debug!(target: targets::CONFIG, path = %path.display(), "loading grid configuration");
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&source),
            _ => Self::from_toml_str(&source),
        }
    }

    /// Serializes the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Fails if the configuration cannot be represented in TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Serializes the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Fails if serialization fails.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Captures the configuration of an existing column collection.
    pub fn from_columns(columns: &Columns) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|column| ColumnConfig::from_column(&column))
                .collect(),
            ..Self::default()
        }
    }

    /// Checks the configuration for conflicts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if more than one column is sorted, or a
    /// column's minimum width exceeds its maximum width.
    pub fn validate(&self) -> Result<()> {
        let sorted = self
            .columns
            .iter()
            .filter(|column| column.sort_order.is_sorted())
            .count();
        if sorted > 1 {
            return Err(Error::Config(format!(
                "{sorted} columns have a sort order; at most one may be sorted"
            )));
        }
        for (index, column) in self.columns.iter().enumerate() {
            if let (Some(min), Some(max)) = (column.min_width, column.max_width)
                && min > max
            {
                return Err(Error::Config(format!(
                    "column {index}: min_width {min} exceeds max_width {max}"
                )));
            }
        }
        Ok(())
    }

    /// Builds the column collection.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid.
    pub fn build_columns(&self) -> Result<Arc<Columns>> {
        self.validate()?;
        Columns::from_columns(self.columns.iter().map(|column| Arc::new(column.build())))
    }

    /// Builds a widget factory with this configuration's columns and appearances.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid.
    pub fn build_factory(&self) -> Result<Arc<WidgetFactory>> {
        let factory = WidgetFactory::new();
        factory.set_columns(Some(self.build_columns()?))?;
        self.apply_appearances(&factory);
        Ok(factory)
    }

    /// Applies the appearance tokens to `factory`.
    pub fn apply_appearances(&self, factory: &WidgetFactory) {
        factory.set_child_appearances(self.widget_appearance.clone());
        factory.set_editor_appearances(self.editor_appearance.clone());
    }
}
