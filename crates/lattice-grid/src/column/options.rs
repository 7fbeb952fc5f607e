//! Small value types used by columns.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::source::{ModelRef, Position};

/// Sort direction of a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Not sorted.
    #[default]
    None,
    /// Sorted smallest first.
    Ascending,
    /// Sorted largest first.
    Descending,
}

impl SortOrder {
    /// Returns `true` for ascending or descending.
    pub fn is_sorted(&self) -> bool {
        !matches!(self, SortOrder::None)
    }
}

/// Direction of a value binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingDirection {
    /// Model attribute to widget value.
    Forward,
    /// Widget value back to model attribute (editors only).
    Reverse,
}

/// Converts a value as it crosses a binding.
pub type ValueConverter = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Configuration of one value binding.
#[derive(Clone, Default)]
pub struct BindingOptions {
    converter: Option<ValueConverter>,
}

impl BindingOptions {
    /// Creates options that transfer values unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a converter applied to every transferred value.
    pub fn with_converter<F>(mut self, converter: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.converter = Some(Arc::new(converter));
        self
    }

    /// Returns `true` if a converter is set.
    pub fn has_converter(&self) -> bool {
        self.converter.is_some()
    }

    /// Applies the converter, if any.
    pub fn convert(&self, value: Value) -> Value {
        match &self.converter {
            Some(converter) => converter(&value),
            None => value,
        }
    }
}

impl fmt::Debug for BindingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingOptions")
            .field("converter", &self.converter.is_some())
            .finish()
    }
}

/// The cell a layout callback is asked about.
#[derive(Debug, Clone)]
pub struct CellContext {
    /// Position of the cell.
    pub position: Position,
    /// Model at that position, if materialized.
    pub model: Option<ModelRef>,
}

impl CellContext {
    /// Creates a context for a cell.
    pub fn new(position: Position, model: Option<ModelRef>) -> Self {
        Self { position, model }
    }
}

/// Identifies which column property changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnProperty {
    /// [`Column::path`](super::Column::path).
    Path,
    /// [`Column::caption`](super::Column::caption).
    Caption,
    /// [`Column::width`](super::Column::width).
    Width,
    /// [`Column::min_width`](super::Column::min_width).
    MinWidth,
    /// [`Column::max_width`](super::Column::max_width).
    MaxWidth,
    /// [`Column::flex`](super::Column::flex).
    Flex,
    /// [`Column::is_read_only`](super::Column::is_read_only).
    ReadOnly,
    /// [`Column::is_enabled`](super::Column::is_enabled).
    Enabled,
    /// [`Column::is_editable`](super::Column::is_editable).
    Editable,
    /// [`Column::is_sortable`](super::Column::is_sortable).
    Sortable,
    /// [`Column::sort_order`](super::Column::sort_order).
    SortOrder,
    /// The fill-width predicate.
    ShouldFillWidth,
    /// The column-span callback.
    ColSpan,
    /// The binding options callback.
    BindingOptions,
}
