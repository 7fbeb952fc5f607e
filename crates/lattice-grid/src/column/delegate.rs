//! Column extension hooks.

use std::sync::Arc;

use super::base::Column;
use crate::error::Result;
use crate::widget::{Label, TextField, WidgetRef};

/// Customizes how a column creates widgets and reacts to its own changes.
///
/// Every method has a default, so an implementation overrides only what it
/// needs. The `*_changed` hooks run after the property is stored and before
/// observers of [`ColumnSignals::changed`](super::ColumnSignals) are notified.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lattice_grid::column::{Column, ColumnDelegate};
/// use lattice_grid::widget::{Label, WidgetRef};
/// use lattice_grid::Result;
///
/// struct BadgeColumn;
///
/// impl ColumnDelegate for BadgeColumn {
///     fn create_widget_for_display(&self, _column: &Column) -> Result<WidgetRef> {
///         Ok(Arc::new(Label::with_text("-")))
///     }
///
///     fn create_widget_for_edit(&self, _column: &Column) -> Result<Option<WidgetRef>> {
///         Ok(None)
///     }
/// }
///
/// let column = Column::with_delegate("status", BadgeColumn);
/// assert!(column.create_widget_for_edit().unwrap().is_none());
/// ```
pub trait ColumnDelegate: Send + Sync {
    /// Creates a widget that displays one cell. Defaults to a [`Label`]
    /// with the standard cell appearance.
    fn create_widget_for_display(&self, _column: &Column) -> Result<WidgetRef> {
        Ok(Arc::new(Label::for_cell()))
    }

    /// Creates a widget that edits one cell, or `None` if the column has no
    /// editor. Defaults to a [`TextField`].
    fn create_widget_for_edit(&self, _column: &Column) -> Result<Option<WidgetRef>> {
        Ok(Some(Arc::new(TextField::new())))
    }

    /// Called when the width changes.
    fn width_changed(&self, _column: &Column, _width: Option<i32>, _old: Option<i32>) {}

    /// Called when the minimum width changes.
    fn min_width_changed(&self, _column: &Column, _min_width: Option<i32>, _old: Option<i32>) {}

    /// Called when the maximum width changes.
    fn max_width_changed(&self, _column: &Column, _max_width: Option<i32>, _old: Option<i32>) {}

    /// Called when the flex factor changes.
    fn flex_changed(&self, _column: &Column, _flex: u32, _old: u32) {}

    /// Called when the read-only flag changes.
    fn read_only_changed(&self, _column: &Column, _read_only: bool) {}

    /// Called when the enabled flag changes.
    fn enabled_changed(&self, _column: &Column, _enabled: bool) {}
}

/// The delegate used by [`Column::new`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultColumnDelegate;

impl ColumnDelegate for DefaultColumnDelegate {}
