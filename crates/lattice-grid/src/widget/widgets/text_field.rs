//! Single-line text editor widget.

use serde_json::Value;

use super::label::display_text;
use crate::widget::{CellWidget, WidgetBase, WidgetCapabilities};

/// An editable text cell widget with a read-only mode.
///
/// # Example
///
/// ```
/// use lattice_grid::widget::{CellWidget, TextField};
///
/// let field = TextField::new();
/// assert!(field.edit("typed"));
/// assert_eq!(field.text(), "typed");
///
/// field.set_read_only(true);
/// assert!(!field.edit("rejected"));
/// ```
#[derive(Debug)]
pub struct TextField {
    base: WidgetBase,
}

impl TextField {
    /// Creates an empty text field.
    pub fn new() -> Self {
        Self {
            base: WidgetBase::new::<Self>(),
        }
    }

    /// Returns the value as text.
    pub fn text(&self) -> String {
        display_text(&self.base.value())
    }

    /// Applies user input.
    ///
    /// Returns `false` if the field rejects input (disabled, read-only or
    /// disposed).
    pub fn edit(&self, text: impl Into<String>) -> bool {
        if self.is_disposed() || !self.is_enabled() || self.is_read_only() {
            return false;
        }
        self.base.set_value(Value::String(text.into()));
        true
    }
}

impl Default for TextField {
    fn default() -> Self {
        Self::new()
    }
}

impl CellWidget for TextField {
    fn widget_base(&self) -> &WidgetBase {
        &self.base
    }

    fn capabilities(&self) -> WidgetCapabilities {
        WidgetCapabilities::new().with_read_only(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_edit_emits_value_changed() {
        let field = TextField::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        field.value_changed().connect(move |value| {
            assert_eq!(value, &json!("abc"));
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(field.edit("abc"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rejects_input_when_disabled() {
        let field = TextField::new();
        field.set_enabled(false);
        assert!(!field.edit("x"));
        field.set_enabled(true);
        field.dispose();
        assert!(!field.edit("x"));
        assert_eq!(field.text(), "");
    }

    #[test]
    fn test_read_only_capability() {
        let field = TextField::new();
        field.set_read_only(true);
        assert!(field.is_read_only());
        field.set_read_only(false);
        assert!(!field.is_read_only());
    }
}
