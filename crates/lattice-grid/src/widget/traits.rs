//! The cell widget trait.
//!
//! The grid core never renders anything; it only needs to push values into
//! widgets, read values back out of editors, toggle interaction state, and
//! hang bookkeeping off a widget. [`CellWidget`] is that surface.
//!
//! # Key Types
//!
//! - [`CellWidget`] - Trait implemented by every cell widget
//! - [`WidgetCapabilities`] - Optional features a widget declares
//! - [`WidgetRef`] - Shared handle used by pools and bindings

use std::fmt;
use std::sync::Arc;

use lattice_grid_core::Signal;
use serde_json::Value;

use super::base::{UserData, WidgetBase};

/// Shared handle to a cell widget.
pub type WidgetRef = Arc<dyn CellWidget>;

/// Optional features a widget declares.
///
/// Only widgets with the `read_only` capability honor
/// [`CellWidget::set_read_only`]; for the others, a read-only column is
/// shown by disabling the widget instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WidgetCapabilities {
    /// The widget has its own read-only mode.
    pub read_only: bool,
}

impl WidgetCapabilities {
    /// Creates capabilities with every optional feature off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the read-only capability.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}

/// A widget that can be placed in a grid cell.
///
/// Implementors supply [`widget_base`](CellWidget::widget_base) and,
/// optionally, [`capabilities`](CellWidget::capabilities); everything else
/// has a default built on [`WidgetBase`].
///
/// # Example
///
/// ```
/// use lattice_grid::widget::{CellWidget, WidgetBase};
///
/// #[derive(Debug)]
/// struct Badge {
///     base: WidgetBase,
/// }
///
/// impl CellWidget for Badge {
///     fn widget_base(&self) -> &WidgetBase {
///         &self.base
///     }
/// }
///
/// let badge = Badge { base: WidgetBase::new::<Badge>() };
/// badge.set_value(serde_json::json!(3));
/// assert_eq!(badge.value(), serde_json::json!(3));
/// ```
pub trait CellWidget: Send + Sync + fmt::Debug {
    /// Returns the shared widget state.
    fn widget_base(&self) -> &WidgetBase;

    /// Returns the optional features this widget supports.
    fn capabilities(&self) -> WidgetCapabilities {
        WidgetCapabilities::new()
    }

    /// Returns the current value.
    fn value(&self) -> Value {
        self.widget_base().value()
    }

    /// Sets the value, emitting [`value_changed`](CellWidget::value_changed)
    /// if it changed.
    fn set_value(&self, value: Value) {
        self.widget_base().set_value(value);
    }

    /// Signal emitted with the new value on every change.
    fn value_changed(&self) -> &Arc<Signal<Value>> {
        self.widget_base().value_changed()
    }

    /// Returns whether the widget accepts interaction.
    fn is_enabled(&self) -> bool {
        self.widget_base().is_enabled()
    }

    /// Sets whether the widget accepts interaction.
    fn set_enabled(&self, enabled: bool) {
        self.widget_base().set_enabled(enabled);
    }

    /// Returns whether the widget is read-only. Always `false` without the capability.
    fn is_read_only(&self) -> bool {
        self.capabilities().read_only && self.widget_base().is_read_only()
    }

    /// Sets the read-only mode. Ignored without the capability.
    fn set_read_only(&self, read_only: bool) {
        if self.capabilities().read_only {
            self.widget_base().set_read_only(read_only);
        }
    }

    /// Returns the appearance token.
    fn appearance(&self) -> Option<String> {
        self.widget_base().appearance()
    }

    /// Sets (or clears) the appearance token.
    fn set_appearance(&self, appearance: Option<String>) {
        self.widget_base().set_appearance(appearance);
    }

    /// Returns the user data stored under `key`.
    fn user_data(&self, key: &str) -> Option<UserData> {
        self.widget_base().user_data(key)
    }

    /// Stores or clears the user data under `key`.
    fn set_user_data(&self, key: &str, data: Option<UserData>) {
        self.widget_base().set_user_data(key, data);
    }

    /// Destroys the widget.
    fn dispose(&self) {
        self.widget_base().dispose();
    }

    /// Returns `true` once the widget has been disposed.
    fn is_disposed(&self) -> bool {
        self.widget_base().is_disposed()
    }
}
