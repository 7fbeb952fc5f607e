//! Column definition and the widget binding contract.

use std::fmt;
use std::sync::{Arc, Weak};

use lattice_grid_core::logging::targets;
use lattice_grid_core::{ConnectionId, Property, Signal};
use parking_lot::{Mutex, RwLock};

use super::delegate::{ColumnDelegate, DefaultColumnDelegate};
use super::grid::DataGrid;
use super::options::{BindingDirection, BindingOptions, CellContext, ColumnProperty, SortOrder};
use crate::binding::{Bindings, bind_model_to_widget, bind_widget_to_model};
use crate::error::{Error, Result};
use crate::factory::WidgetFactory;
use crate::source::{GridModel, ModelRef};
use crate::widget::{CellWidget, WidgetRef};

/// Decides whether a cell stretches to fill the remaining width.
pub type FillWidthFn = Arc<dyn Fn(&CellContext) -> bool + Send + Sync>;

/// Returns how many columns a cell spans.
pub type ColSpanFn = Arc<dyn Fn(&CellContext) -> i64 + Send + Sync>;

/// Produces the options for one value binding.
pub type BindingOptionsFn =
    Arc<dyn Fn(&dyn CellWidget, &dyn GridModel, BindingDirection) -> BindingOptions + Send + Sync>;

/// Signals emitted by a [`Column`].
pub struct ColumnSignals {
    /// Emitted after any property changes, with the property that changed.
    pub changed: Signal<ColumnProperty>,
    /// Emitted when [`Column::is_effectively_enabled`] flips.
    pub effectively_enabled_changed: Arc<Signal<bool>>,
    /// Emitted when [`Column::is_effectively_read_only`] flips.
    pub effectively_read_only_changed: Arc<Signal<bool>>,
    /// Emitted when the column header is tapped.
    pub header_tap: Signal<()>,
}

impl ColumnSignals {
    fn new() -> Self {
        Self {
            changed: Signal::new(),
            effectively_enabled_changed: Arc::new(Signal::new()),
            effectively_read_only_changed: Arc::new(Signal::new()),
            header_tap: Signal::new(),
        }
    }
}

struct GridLink {
    grid: Arc<DataGrid>,
    enabled_id: ConnectionId,
    read_only_id: ConnectionId,
}

impl GridLink {
    fn release(self) {
        self.grid.enabled_changed().disconnect(self.enabled_id);
        self.grid.read_only_changed().disconnect(self.read_only_id);
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
struct EffectiveState {
    enabled: bool,
    read_only: bool,
}

/// One column of the grid.
///
/// A column says which model attribute its cells show (`path`), how it is
/// laid out, and whether its cells can be edited. It creates the widgets for
/// its cells through its [`ColumnDelegate`] and wires them to models with
/// [`bind_widget`](Column::bind_widget) and
/// [`bind_editor`](Column::bind_editor).
///
/// Columns are shared as `Arc<Column>`; binding and grid attachment need the
/// `Arc` so that the connections they create do not keep the column alive.
///
/// # Effective state
///
/// A column is *effectively enabled* when it is enabled and its grid (if
/// any) is enabled. It is *effectively read-only* when it is read-only or
/// disabled, or its grid is read-only or disabled. Bound widgets follow the
/// effective state for as long as their [`Bindings`] live.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lattice_grid::column::{Column, DataGrid};
///
/// let column = Arc::new(Column::new("name"));
/// let grid = Arc::new(DataGrid::new());
/// column.set_data_grid(Some(grid.clone())).unwrap();
///
/// assert!(!column.is_effectively_read_only());
/// grid.set_read_only(true);
/// assert!(column.is_effectively_read_only());
/// assert!(column.is_effectively_enabled());
/// ```
pub struct Column {
    path: Property<Option<String>>,
    caption: Property<Option<String>>,
    width: Property<Option<i32>>,
    min_width: Property<Option<i32>>,
    max_width: Property<Option<i32>>,
    flex: Property<u32>,
    read_only: Property<bool>,
    enabled: Property<bool>,
    editable: Property<bool>,
    sortable: Property<bool>,
    sort_order: Property<SortOrder>,
    should_fill_width: RwLock<Option<FillWidthFn>>,
    col_span: RwLock<Option<ColSpanFn>>,
    binding_options: RwLock<Option<BindingOptionsFn>>,
    delegate: Box<dyn ColumnDelegate>,
    grid: Mutex<Option<GridLink>>,
    effective: Mutex<EffectiveState>,
    signals: ColumnSignals,
}

impl Default for Column {
    fn default() -> Self {
        Self::build(None, Box::new(DefaultColumnDelegate))
    }
}

impl Column {
    /// Creates a column bound to the model attribute at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self::build(Some(path.into()), Box::new(DefaultColumnDelegate))
    }

    /// Creates a column with a custom delegate.
    pub fn with_delegate(path: impl Into<String>, delegate: impl ColumnDelegate + 'static) -> Self {
        Self::build(Some(path.into()), Box::new(delegate))
    }

    fn build(path: Option<String>, delegate: Box<dyn ColumnDelegate>) -> Self {
        Self {
            path: Property::new(path),
            caption: Property::new(None),
            width: Property::new(None),
            min_width: Property::new(None),
            max_width: Property::new(None),
            flex: Property::new(0),
            read_only: Property::new(false),
            enabled: Property::new(true),
            editable: Property::new(false),
            sortable: Property::new(false),
            sort_order: Property::new(SortOrder::None),
            should_fill_width: RwLock::new(None),
            col_span: RwLock::new(None),
            binding_options: RwLock::new(None),
            delegate,
            grid: Mutex::new(None),
            effective: Mutex::new(EffectiveState {
                enabled: true,
                read_only: false,
            }),
            signals: ColumnSignals::new(),
        }
    }

    /// Sets the caption (builder pattern).
    pub fn with_caption(self, caption: impl Into<String>) -> Self {
        self.caption.set_silent(Some(caption.into()));
        self
    }

    /// Sets the width (builder pattern).
    pub fn with_width(self, width: i32) -> Self {
        self.width.set_silent(Some(width));
        self
    }

    /// Sets the flex factor (builder pattern).
    pub fn with_flex(self, flex: u32) -> Self {
        self.flex.set_silent(flex);
        self
    }

    /// Returns the column's signals.
    pub fn signals(&self) -> &ColumnSignals {
        &self.signals
    }

    fn notify(&self, property: ColumnProperty) {
        tracing::trace!(target: targets::COLUMN, ?property, "column property changed");
        self.signals.changed.emit(property);
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns the model attribute path, if any.
    pub fn path(&self) -> Option<String> {
        self.path.get()
    }

    /// Sets the model attribute path. Affects bindings made afterwards.
    pub fn set_path(&self, path: Option<String>) {
        if self.path.set(path) {
            self.notify(ColumnProperty::Path);
        }
    }

    /// Returns the header caption.
    pub fn caption(&self) -> Option<String> {
        self.caption.get()
    }

    /// Sets the header caption.
    pub fn set_caption(&self, caption: Option<String>) {
        if self.caption.set(caption) {
            self.notify(ColumnProperty::Caption);
        }
    }

    /// Returns the preferred width.
    pub fn width(&self) -> Option<i32> {
        self.width.get()
    }

    /// Sets the preferred width.
    pub fn set_width(&self, width: Option<i32>) {
        if let Some(old) = self.width.replace(width) {
            self.delegate.width_changed(self, width, old);
            self.notify(ColumnProperty::Width);
        }
    }

    /// Returns the minimum width.
    pub fn min_width(&self) -> Option<i32> {
        self.min_width.get()
    }

    /// Sets the minimum width.
    pub fn set_min_width(&self, min_width: Option<i32>) {
        if let Some(old) = self.min_width.replace(min_width) {
            self.delegate.min_width_changed(self, min_width, old);
            self.notify(ColumnProperty::MinWidth);
        }
    }

    /// Returns the maximum width.
    pub fn max_width(&self) -> Option<i32> {
        self.max_width.get()
    }

    /// Sets the maximum width.
    pub fn set_max_width(&self, max_width: Option<i32>) {
        if let Some(old) = self.max_width.replace(max_width) {
            self.delegate.max_width_changed(self, max_width, old);
            self.notify(ColumnProperty::MaxWidth);
        }
    }

    /// Returns the flex factor; 0 means fixed width.
    pub fn flex(&self) -> u32 {
        self.flex.get()
    }

    /// Sets the flex factor.
    pub fn set_flex(&self, flex: u32) {
        if let Some(old) = self.flex.replace(flex) {
            self.delegate.flex_changed(self, flex, old);
            self.notify(ColumnProperty::Flex);
        }
    }

    /// Returns the column's own read-only flag.
    pub fn is_read_only(&self) -> bool {
        self.read_only.get()
    }

    /// Sets the column's own read-only flag.
    pub fn set_read_only(&self, read_only: bool) {
        if self.read_only.set(read_only) {
            self.delegate.read_only_changed(self, read_only);
            self.notify(ColumnProperty::ReadOnly);
            self.refresh_effective_state();
        }
    }

    /// Returns the column's own enabled flag.
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Sets the column's own enabled flag.
    pub fn set_enabled(&self, enabled: bool) {
        if self.enabled.set(enabled) {
            self.delegate.enabled_changed(self, enabled);
            self.notify(ColumnProperty::Enabled);
            self.refresh_effective_state();
        }
    }

    /// Returns whether cells can be swapped for an editor.
    pub fn is_editable(&self) -> bool {
        self.editable.get()
    }

    /// Sets whether cells can be swapped for an editor.
    pub fn set_editable(&self, editable: bool) {
        if self.editable.set(editable) {
            self.notify(ColumnProperty::Editable);
        }
    }

    /// Returns whether the column can be sorted.
    pub fn is_sortable(&self) -> bool {
        self.sortable.get()
    }

    /// Sets whether the column can be sorted.
    pub fn set_sortable(&self, sortable: bool) {
        if self.sortable.set(sortable) {
            self.notify(ColumnProperty::Sortable);
        }
    }

    /// Returns the sort order.
    pub fn sort_order(&self) -> SortOrder {
        self.sort_order.get()
    }

    /// Sets the sort order.
    ///
    /// Within a [`Columns`](super::Columns) collection, sorting this column
    /// resets every other column to [`SortOrder::None`].
    pub fn set_sort_order(&self, sort_order: SortOrder) {
        if self.sort_order.set(sort_order) {
            self.notify(ColumnProperty::SortOrder);
        }
    }

    /// Reports a tap on the column header.
    pub fn tap_header(&self) {
        self.signals.header_tap.emit(());
    }

    // =========================================================================
    // Layout callbacks
    // =========================================================================

    /// Sets the fill-width predicate.
    pub fn set_should_fill_width(&self, predicate: Option<FillWidthFn>) {
        *self.should_fill_width.write() = predicate;
        self.notify(ColumnProperty::ShouldFillWidth);
    }

    /// Returns whether the cell should stretch to fill the remaining width.
    /// `false` without a predicate.
    pub fn should_fill_width(&self, cell: &CellContext) -> bool {
        let predicate = self.should_fill_width.read().clone();
        predicate.is_some_and(|predicate| predicate(cell))
    }

    /// Sets the column-span callback.
    pub fn set_col_span(&self, col_span: Option<ColSpanFn>) {
        *self.col_span.write() = col_span;
        self.notify(ColumnProperty::ColSpan);
    }

    /// Returns how many columns the cell spans; at least 1.
    pub fn col_span(&self, cell: &CellContext) -> i64 {
        let col_span = self.col_span.read().clone();
        col_span.map_or(1, |col_span| col_span(cell).max(1))
    }

    /// Sets the binding options callback.
    pub fn set_binding_options(&self, options: Option<BindingOptionsFn>) {
        *self.binding_options.write() = options;
        self.notify(ColumnProperty::BindingOptions);
    }

    /// Returns the options for a binding between `widget` and `model`.
    pub fn binding_options(
        &self,
        widget: &dyn CellWidget,
        model: &dyn GridModel,
        direction: BindingDirection,
    ) -> BindingOptions {
        let options = self.binding_options.read().clone();
        options.map_or_else(BindingOptions::default, |options| options(widget, model, direction))
    }

    // =========================================================================
    // Grid attachment and effective state
    // =========================================================================

    /// Returns the grid this column belongs to.
    pub fn data_grid(&self) -> Option<Arc<DataGrid>> {
        self.grid.lock().as_ref().map(|link| link.grid.clone())
    }

    /// Attaches the column to `grid`, or detaches it with `None`.
    ///
    /// Attaching to the grid the column already belongs to does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DataGridAlreadySet`] if the column belongs to a
    /// different grid; detach it first.
    pub fn set_data_grid(self: &Arc<Self>, grid: Option<Arc<DataGrid>>) -> Result<()> {
        let previous = {
            let mut link = self.grid.lock();
            match (link.as_ref(), grid.as_ref()) {
                (Some(current), Some(grid)) if Arc::ptr_eq(&current.grid, grid) => return Ok(()),
                (Some(_), Some(_)) => {
                    tracing::error!(target: targets::COLUMN, path = ?self.path(), "column is already attached to a different data grid");
                    return Err(Error::DataGridAlreadySet);
                }
                (None, None) => return Ok(()),
                _ => {}
            }

            let previous = link.take();
            if let Some(grid) = grid {
                let enabled_id = grid.enabled_changed().connect(self.effective_state_slot());
                let read_only_id = grid.read_only_changed().connect(self.effective_state_slot());
                *link = Some(GridLink {
                    grid,
                    enabled_id,
                    read_only_id,
                });
            }
            previous
        };

        if let Some(previous) = previous {
            previous.release();
        }
        self.refresh_effective_state();
        Ok(())
    }

    fn effective_state_slot(self: &Arc<Self>) -> impl Fn(&bool) + Send + Sync + 'static {
        let column: Weak<Column> = Arc::downgrade(self);
        move |_: &bool| {
            if let Some(column) = column.upgrade() {
                column.refresh_effective_state();
            }
        }
    }

    /// Returns `true` if the column and its grid (if any) are enabled.
    pub fn is_effectively_enabled(&self) -> bool {
        let grid = self.data_grid();
        self.is_enabled() && grid.is_none_or(|grid| grid.is_enabled())
    }

    /// Returns `true` if the column or its grid is read-only or disabled.
    pub fn is_effectively_read_only(&self) -> bool {
        let grid = self.data_grid();
        self.is_read_only()
            || !self.is_enabled()
            || grid
                .as_ref()
                .is_some_and(|grid| grid.is_read_only() || !grid.is_enabled())
    }

    fn refresh_effective_state(&self) {
        let current = EffectiveState {
            enabled: self.is_effectively_enabled(),
            read_only: self.is_effectively_read_only(),
        };
        let previous = std::mem::replace(&mut *self.effective.lock(), current);

        if previous.enabled != current.enabled {
            tracing::debug!(target: targets::COLUMN, path = ?self.path(), enabled = current.enabled, "effective enabled changed");
            self.signals.effectively_enabled_changed.emit(current.enabled);
        }
        if previous.read_only != current.read_only {
            tracing::debug!(target: targets::COLUMN, path = ?self.path(), read_only = current.read_only, "effective read-only changed");
            self.signals.effectively_read_only_changed.emit(current.read_only);
        }
    }

    // =========================================================================
    // Widgets and bindings
    // =========================================================================

    /// Creates a widget that displays one cell.
    pub fn create_widget_for_display(&self) -> Result<WidgetRef> {
        self.delegate.create_widget_for_display(self)
    }

    /// Creates a widget that edits one cell, or `None` if the column has no editor.
    pub fn create_widget_for_edit(&self) -> Result<Option<WidgetRef>> {
        self.delegate.create_widget_for_edit(self)
    }

    /// Binds a display widget to `model`.
    ///
    /// Installs a one-way binding from the model attribute at
    /// [`path`](Self::path) to the widget's value (skipped when either is
    /// missing), and keeps the widget's enabled/read-only state in sync with
    /// the column's effective state. Dispose the returned ledger to undo both.
    pub fn bind_widget(
        self: &Arc<Self>,
        widget: &WidgetRef,
        model: Option<&ModelRef>,
        factory: &WidgetFactory,
    ) -> Bindings {
        self.init_binding(widget, model, factory)
    }

    /// Binds an editor widget to `model`.
    ///
    /// Same as [`bind_widget`](Self::bind_widget), plus a binding from the
    /// editor's value back into the model.
    pub fn bind_editor(
        self: &Arc<Self>,
        widget: &WidgetRef,
        model: Option<&ModelRef>,
        factory: &WidgetFactory,
    ) -> Bindings {
        let bindings = self.init_binding(widget, model, factory);
        if let (Some(path), Some(model)) = (self.path(), model) {
            let options = self.binding_options(widget.as_ref(), model.as_ref(), BindingDirection::Reverse);
            bind_widget_to_model(&bindings, widget, model, &path, options);
        }
        bindings
    }

    fn init_binding(
        self: &Arc<Self>,
        widget: &WidgetRef,
        model: Option<&ModelRef>,
        factory: &WidgetFactory,
    ) -> Bindings {
        tracing::trace!(
            target: targets::COLUMN,
            cell = ?factory.cell_of(widget.as_ref()),
            model = ?model.map(|m| m.position()),
            "binding widget"
        );
        let bindings = Bindings::new(model.cloned());
        if let (Some(path), Some(model)) = (self.path(), model) {
            let options = self.binding_options(widget.as_ref(), model.as_ref(), BindingDirection::Forward);
            bind_model_to_widget(&bindings, model, &path, widget, options);
        }

        let update = {
            let column = Arc::downgrade(self);
            let widget = Arc::downgrade(widget);
            move |_: &bool| {
                if let (Some(column), Some(widget)) = (column.upgrade(), widget.upgrade()) {
                    column.sync_widget_state(widget.as_ref());
                }
            }
        };
        let signals = &self.signals;
        let id = signals.effectively_read_only_changed.connect(update.clone());
        bindings.add_listener(signals.effectively_read_only_changed.clone(), id);
        let id = signals.effectively_enabled_changed.connect(update);
        bindings.add_listener(signals.effectively_enabled_changed.clone(), id);

        self.sync_widget_state(widget.as_ref());
        bindings
    }

    /// Applies the column's effective state to `widget`.
    ///
    /// Widgets with a read-only mode get read-only and enabled set
    /// separately; other widgets are disabled when the column is effectively
    /// read-only.
    pub fn sync_widget_state(&self, widget: &dyn CellWidget) {
        let enabled = self.is_effectively_enabled();
        let read_only = self.is_effectively_read_only();
        if widget.capabilities().read_only {
            widget.set_read_only(read_only);
            widget.set_enabled(enabled);
        } else {
            widget.set_enabled(enabled && !read_only);
        }
    }
}

impl Drop for Column {
    fn drop(&mut self) {
        if let Some(link) = self.grid.get_mut().take() {
            link.release();
        }
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("path", &self.path())
            .field("caption", &self.caption())
            .field("width", &self.width())
            .field("flex", &self.flex())
            .field("read_only", &self.is_read_only())
            .field("enabled", &self.is_enabled())
            .field("sort_order", &self.sort_order())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(Column: Send, Sync);
