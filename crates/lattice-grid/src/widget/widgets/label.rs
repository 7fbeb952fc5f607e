//! Label widget.

use serde_json::Value;

use crate::widget::{CellWidget, WidgetBase};

/// Appearance token given to the default display widget.
pub const CELL_APPEARANCE: &str = "lattice-grid-cell";

/// A display-only cell widget.
///
/// A label has no read-only mode of its own; columns show read-only state
/// by disabling it.
#[derive(Debug)]
pub struct Label {
    base: WidgetBase,
}

impl Label {
    /// Creates an empty label.
    pub fn new() -> Self {
        Self {
            base: WidgetBase::new::<Self>(),
        }
    }

    /// Creates a label showing `text`.
    pub fn with_text(text: impl Into<String>) -> Self {
        let label = Self::new();
        label.base.set_value(Value::String(text.into()));
        label
    }

    /// Creates a label with the standard cell appearance.
    pub fn for_cell() -> Self {
        let label = Self::new();
        label.base.set_appearance(Some(CELL_APPEARANCE.to_string()));
        label
    }

    /// Returns the value as display text.
    pub fn text(&self) -> String {
        display_text(&self.base.value())
    }
}

impl Default for Label {
    fn default() -> Self {
        Self::new()
    }
}

impl CellWidget for Label {
    fn widget_base(&self) -> &WidgetBase {
        &self.base
    }
}

/// Renders a value the way a text widget shows it.
pub(crate) fn display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
