//! The widget pool.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::{Arc, Weak};

use lattice_grid_core::ConnectionId;
use lattice_grid_core::logging::targets;
use parking_lot::{Mutex, RwLock};

use super::creator::{ColumnWidgetCreator, WidgetCreator};
use crate::binding::Bindings;
use crate::column::{Column, Columns};
use crate::error::{Error, Result};
use crate::source::{DataSource, ModelRef, Position};
use crate::widget::{CellWidget, WidgetRef};

/// User-data key under which pooled widgets carry their [`BindingData`].
pub const BINDING_DATA_KEY: &str = "lattice_grid::factory::binding_data";

/// Metadata attached to every pooled widget.
pub struct BindingData {
    position: Position,
    column: Arc<Column>,
    state: Mutex<BoundState>,
}

#[derive(Default)]
struct BoundState {
    model: Option<ModelRef>,
    bindings: Option<Bindings>,
}

impl BindingData {
    fn new(position: Position, column: Arc<Column>) -> Self {
        Self {
            position,
            column,
            state: Mutex::new(BoundState::default()),
        }
    }

    /// Returns the cell the widget was created for.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Returns the row index.
    pub fn row(&self) -> i64 {
        self.position.row()
    }

    /// Returns the column index.
    pub fn column_index(&self) -> i64 {
        self.position.column()
    }

    /// Returns the column that created the widget.
    pub fn column(&self) -> &Arc<Column> {
        &self.column
    }

    /// Returns the model the widget is currently bound to.
    pub fn model(&self) -> Option<ModelRef> {
        self.state.lock().model.clone()
    }

    fn store(&self, model: Option<ModelRef>, bindings: Bindings) {
        let previous = {
            let mut state = self.state.lock();
            state.model = model;
            state.bindings.replace(bindings)
        };
        if let Some(previous) = previous {
            previous.dispose();
        }
    }

    /// Releases the current bindings. Returns `true` if there were any.
    fn release(&self) -> bool {
        let bindings = {
            let mut state = self.state.lock();
            state.model = None;
            state.bindings.take()
        };
        match bindings {
            Some(bindings) => {
                bindings.dispose();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for BindingData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingData")
            .field("position", &self.position)
            .field("column", &self.column.path())
            .field("model", &self.model().map(|model| model.position()))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolKind {
    Widget,
    Editor,
}

impl PoolKind {
    fn label(self) -> &'static str {
        match self {
            PoolKind::Widget => "widget",
            PoolKind::Editor => "editor",
        }
    }
}

#[derive(Default)]
struct Pools {
    widgets: HashMap<Position, WidgetRef>,
    editors: HashMap<Position, WidgetRef>,
}

impl Pools {
    fn get_mut(&mut self, kind: PoolKind) -> &mut HashMap<Position, WidgetRef> {
        match kind {
            PoolKind::Widget => &mut self.widgets,
            PoolKind::Editor => &mut self.editors,
        }
    }

    fn get(&self, kind: PoolKind) -> &HashMap<Position, WidgetRef> {
        match kind {
            PoolKind::Widget => &self.widgets,
            PoolKind::Editor => &self.editors,
        }
    }
}

struct ColumnsLink {
    columns: Arc<Columns>,
    changed_id: ConnectionId,
}

/// Creates, pools, rebinds and disposes the widgets of a grid.
///
/// At most one display widget and one editor exist per cell. Widgets are
/// created through the [`WidgetCreator`] (by default, the cell's column) the
/// first time a cell is requested, and carry a [`BindingData`] record under
/// [`BINDING_DATA_KEY`] for as long as they are pooled.
///
/// Changing the column set disposes every pooled widget.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lattice_grid::column::{Column, Columns};
/// use lattice_grid::factory::WidgetFactory;
///
/// let columns = Columns::from_columns([Arc::new(Column::new("value"))]).unwrap();
/// let factory = WidgetFactory::new();
/// factory.set_columns(Some(columns)).unwrap();
///
/// let widget = factory.widget_for(3, 0).unwrap();
/// assert!(Arc::ptr_eq(&widget, &factory.widget_for(3, 0).unwrap()));
///
/// factory.dispose_widget(&widget).unwrap();
/// assert!(factory.dispose_widget(&widget).is_err());
/// ```
pub struct WidgetFactory {
    this: Weak<WidgetFactory>,
    creator: Box<dyn WidgetCreator>,
    columns: RwLock<Option<ColumnsLink>>,
    data_source: RwLock<Option<Arc<dyn DataSource>>>,
    pools: Mutex<Pools>,
    widget_appearance: RwLock<Option<String>>,
    editor_appearance: RwLock<Option<String>>,
}

impl WidgetFactory {
    /// Creates a factory that asks columns for their widgets.
    pub fn new() -> Arc<Self> {
        Self::with_creator(ColumnWidgetCreator)
    }

    /// Creates a factory with a custom widget creator.
    pub fn with_creator(creator: impl WidgetCreator + 'static) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            creator: Box::new(creator),
            columns: RwLock::new(None),
            data_source: RwLock::new(None),
            pools: Mutex::new(Pools::default()),
            widget_appearance: RwLock::new(None),
            editor_appearance: RwLock::new(None),
        })
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Returns the column collection.
    pub fn columns(&self) -> Option<Arc<Columns>> {
        self.columns.read().as_ref().map(|link| link.columns.clone())
    }

    /// Replaces the column collection and disposes every pooled widget.
    ///
    /// Later additions to or removals from the collection also dispose every
    /// pooled widget.
    ///
    /// # Errors
    ///
    /// Returns the first disposal error; see
    /// [`dispose_all_widgets`](Self::dispose_all_widgets).
    pub fn set_columns(&self, columns: Option<Arc<Columns>>) -> Result<()> {
        let link = columns.map(|columns| {
            let factory = self.this.clone();
            let changed_id = columns.columns_changed().connect(move |_| {
                if let Some(factory) = factory.upgrade()
                    && let Err(err) = factory.dispose_all_widgets()
                {
                    tracing::error!(target: targets::FACTORY, error = %err, "failed to dispose widgets after column change");
                }
            });
            ColumnsLink {
                columns,
                changed_id,
            }
        });

        let previous = std::mem::replace(&mut *self.columns.write(), link);
        if let Some(previous) = previous {
            previous.columns.columns_changed().disconnect(previous.changed_id);
        }
        self.dispose_all_widgets()
    }

    /// Returns the data source models are fetched from.
    pub fn data_source(&self) -> Option<Arc<dyn DataSource>> {
        self.data_source.read().clone()
    }

    /// Sets the data source used by [`update_widget_for`](Self::update_widget_for).
    pub fn set_data_source(&self, data_source: Option<Arc<dyn DataSource>>) {
        *self.data_source.write() = data_source;
    }

    /// Sets the appearance of every pooled and future display widget.
    pub fn set_child_appearances(&self, appearance: Option<String>) {
        self.set_appearances(PoolKind::Widget, appearance);
    }

    /// Sets the appearance of every pooled and future editor.
    pub fn set_editor_appearances(&self, appearance: Option<String>) {
        self.set_appearances(PoolKind::Editor, appearance);
    }

    /// Returns the appearance applied to display widgets.
    pub fn child_appearance(&self) -> Option<String> {
        self.widget_appearance.read().clone()
    }

    /// Returns the appearance applied to editors.
    pub fn editor_appearance(&self) -> Option<String> {
        self.editor_appearance.read().clone()
    }

    fn appearance_slot(&self, kind: PoolKind) -> &RwLock<Option<String>> {
        match kind {
            PoolKind::Widget => &self.widget_appearance,
            PoolKind::Editor => &self.editor_appearance,
        }
    }

    fn set_appearances(&self, kind: PoolKind, appearance: Option<String>) {
        *self.appearance_slot(kind).write() = appearance.clone();
        let pooled: Vec<WidgetRef> = self.pools.lock().get(kind).values().cloned().collect();
        for widget in pooled {
            widget.set_appearance(appearance.clone());
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Returns the display widget for a cell, creating it on first request.
    ///
    /// # Errors
    ///
    /// Fails if there are no columns, the column index does not exist, or
    /// the creator fails.
    pub fn widget_for(&self, row: i64, column: i64) -> Result<WidgetRef> {
        let widget = self.obtain(PoolKind::Widget, Position::new(row, column), |column| {
            self.creator.create_widget(column).map(Some)
        })?;
        widget.ok_or_else(|| Error::unimplemented::<dyn WidgetCreator>("create_widget"))
    }

    /// Returns the editor for a cell, creating it on first request.
    ///
    /// Returns `None`, and pools nothing, if the column has no editor.
    ///
    /// # Errors
    ///
    /// Same as [`widget_for`](Self::widget_for).
    pub fn editor_for(&self, row: i64, column: i64) -> Result<Option<WidgetRef>> {
        self.obtain(PoolKind::Editor, Position::new(row, column), |column| {
            self.creator.create_editor(column)
        })
    }

    fn obtain(
        &self,
        kind: PoolKind,
        position: Position,
        create: impl FnOnce(&Column) -> Result<Option<WidgetRef>>,
    ) -> Result<Option<WidgetRef>> {
        if let Some(widget) = self.pools.lock().get(kind).get(&position) {
            return Ok(Some(widget.clone()));
        }

        let column = self.column_at(position.column())?;
        let Some(widget) = create(column.as_ref())? else {
            return Ok(None);
        };
        if let Some(appearance) = self.appearance_slot(kind).read().clone() {
            widget.set_appearance(Some(appearance));
        }
        widget.set_user_data(
            BINDING_DATA_KEY,
            Some(Arc::new(BindingData::new(position, column))),
        );

        let mut pools = self.pools.lock();
        match pools.get_mut(kind).entry(position) {
            Entry::Occupied(entry) => {
                // Created concurrently by another caller; keep the pooled one.
                let pooled = entry.get().clone();
                drop(pools);
                widget.dispose();
                Ok(Some(pooled))
            }
            Entry::Vacant(entry) => {
                entry.insert(widget.clone());
                drop(pools);
                tracing::trace!(target: targets::FACTORY, kind = kind.label(), %position, "widget created");
                Ok(Some(widget))
            }
        }
    }

    fn column_at(&self, index: i64) -> Result<Arc<Column>> {
        let columns = self.columns().ok_or(Error::NoColumns)?;
        columns.column(index).ok_or(Error::NoSuchColumn { index })
    }

    /// Returns the metadata a pooled widget carries.
    pub fn binding_data(widget: &dyn CellWidget) -> Option<Arc<BindingData>> {
        widget
            .user_data(BINDING_DATA_KEY)?
            .downcast::<BindingData>()
            .ok()
    }

    /// Returns the cell a pooled widget belongs to.
    pub fn cell_of(&self, widget: &dyn CellWidget) -> Option<Position> {
        Self::binding_data(widget).map(|data| data.position())
    }

    /// Returns the model a pooled widget is bound to.
    pub fn model_for_widget(&self, widget: &dyn CellWidget) -> Option<ModelRef> {
        Self::binding_data(widget)?.model()
    }

    /// Returns the number of pooled display widgets.
    pub fn widget_count(&self) -> usize {
        self.pools.lock().widgets.len()
    }

    /// Returns the number of pooled editors.
    pub fn editor_count(&self) -> usize {
        self.pools.lock().editors.len()
    }

    /// Returns a snapshot of the pooled display widgets.
    pub fn widgets(&self) -> HashMap<Position, WidgetRef> {
        self.pools.lock().widgets.clone()
    }

    /// Returns a snapshot of the pooled editors.
    pub fn editors(&self) -> HashMap<Position, WidgetRef> {
        self.pools.lock().editors.clone()
    }

    // =========================================================================
    // Binding
    // =========================================================================

    /// Binds a pooled display widget to `model`, releasing its previous binding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBindingData`] if the widget is not pooled.
    pub fn bind_widget(&self, widget: &WidgetRef, model: Option<ModelRef>) -> Result<()> {
        let data = self.require_binding_data(widget.as_ref())?;
        data.release();
        let bindings = data.column().bind_widget(widget, model.as_ref(), self);
        data.store(model, bindings);
        Ok(())
    }

    /// Binds a pooled editor to `model`, releasing its previous binding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBindingData`] if the editor is not pooled.
    pub fn bind_editor(&self, editor: &WidgetRef, model: Option<ModelRef>) -> Result<()> {
        let data = self.require_binding_data(editor.as_ref())?;
        data.release();
        let bindings = data.column().bind_editor(editor, model.as_ref(), self);
        data.store(model, bindings);
        Ok(())
    }

    /// Releases a pooled widget's binding. Does nothing if it is not bound.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBindingData`] if the widget is not pooled.
    pub fn unbind_widget(&self, widget: &dyn CellWidget) -> Result<()> {
        let data = self.require_binding_data(widget)?;
        if data.release() {
            tracing::trace!(target: targets::FACTORY, position = %data.position(), "widget unbound");
        }
        Ok(())
    }

    /// Fetches the model for a cell from the data source and binds the
    /// cell's display widget to it if it changed.
    ///
    /// Without a data source, or with the position not materialized, the
    /// widget is bound to no model.
    ///
    /// # Errors
    ///
    /// Same as [`widget_for`](Self::widget_for).
    pub fn update_widget_for(&self, row: i64, column: i64) -> Result<WidgetRef> {
        let widget = self.widget_for(row, column)?;
        self.rebind_if_changed(PoolKind::Widget, &widget, Position::new(row, column))?;
        Ok(widget)
    }

    /// Like [`update_widget_for`](Self::update_widget_for), for the cell's editor.
    ///
    /// # Errors
    ///
    /// Same as [`editor_for`](Self::editor_for).
    pub fn update_editor_for(&self, row: i64, column: i64) -> Result<Option<WidgetRef>> {
        let Some(editor) = self.editor_for(row, column)? else {
            return Ok(None);
        };
        self.rebind_if_changed(PoolKind::Editor, &editor, Position::new(row, column))?;
        Ok(Some(editor))
    }

    fn rebind_if_changed(&self, kind: PoolKind, widget: &WidgetRef, position: Position) -> Result<()> {
        let model = self
            .data_source()
            .and_then(|source| source.model_for_position(position));
        let data = self.require_binding_data(widget.as_ref())?;
        let bound = data.state.lock().bindings.is_some();
        let unchanged = match (data.model(), model.as_ref()) {
            (Some(current), Some(next)) => Arc::ptr_eq(&current, next),
            (None, None) => bound,
            _ => false,
        };
        if unchanged {
            return Ok(());
        }
        match kind {
            PoolKind::Widget => self.bind_widget(widget, model),
            PoolKind::Editor => self.bind_editor(widget, model),
        }
    }

    fn require_binding_data(&self, widget: &dyn CellWidget) -> Result<Arc<BindingData>> {
        Self::binding_data(widget).ok_or(Error::MissingBindingData)
    }

    // =========================================================================
    // Disposal
    // =========================================================================

    /// Disposes a pooled display widget.
    ///
    /// Releases its binding, clears its metadata, removes it from the pool
    /// and destroys it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBindingData`] if the widget carries no
    /// metadata (for instance because it was already disposed), or
    /// [`Error::WidgetNotPooled`] if the pool holds a different widget for
    /// its cell.
    pub fn dispose_widget(&self, widget: &WidgetRef) -> Result<()> {
        self.dispose_pooled(PoolKind::Widget, widget)
    }

    /// Disposes a pooled editor. See [`dispose_widget`](Self::dispose_widget).
    ///
    /// # Errors
    ///
    /// Same as [`dispose_widget`](Self::dispose_widget).
    pub fn dispose_editor(&self, editor: &WidgetRef) -> Result<()> {
        self.dispose_pooled(PoolKind::Editor, editor)
    }

    fn dispose_pooled(&self, kind: PoolKind, widget: &WidgetRef) -> Result<()> {
        let Some(data) = Self::binding_data(widget.as_ref()) else {
            tracing::error!(target: targets::FACTORY, kind = kind.label(), "disposing a widget without binding data");
            return Err(Error::MissingBindingData);
        };
        let position = data.position();

        {
            let mut pools = self.pools.lock();
            let pool = pools.get_mut(kind);
            match pool.get(&position) {
                Some(pooled) if Arc::ptr_eq(pooled, widget) => {
                    pool.remove(&position);
                }
                _ => {
                    tracing::error!(target: targets::FACTORY, kind = kind.label(), %position, "disposing a widget this factory does not pool");
                    return Err(Error::WidgetNotPooled { position });
                }
            }
        }

        data.release();
        widget.set_user_data(BINDING_DATA_KEY, None);
        widget.dispose();
        tracing::trace!(target: targets::FACTORY, kind = kind.label(), %position, "widget disposed");
        Ok(())
    }

    /// Unbinds and disposes every pooled widget and editor.
    ///
    /// # Errors
    ///
    /// Every widget is attempted; the first failure is returned.
    pub fn dispose_all_widgets(&self) -> Result<()> {
        let (widgets, editors) = {
            let pools = self.pools.lock();
            (
                pools.widgets.values().cloned().collect::<Vec<_>>(),
                pools.editors.values().cloned().collect::<Vec<_>>(),
            )
        };
        if widgets.is_empty() && editors.is_empty() {
            return Ok(());
        }
        tracing::debug!(
            target: targets::FACTORY,
            widgets = widgets.len(),
            editors = editors.len(),
            "disposing all widgets"
        );

        let mut result = Ok(());
        let all = widgets
            .iter()
            .map(|widget| (PoolKind::Widget, widget))
            .chain(editors.iter().map(|editor| (PoolKind::Editor, editor)));
        for (kind, widget) in all {
            let outcome = self
                .unbind_widget(widget.as_ref())
                .and_then(|()| self.dispose_pooled(kind, widget));
            if let Err(err) = outcome
                && result.is_ok()
            {
                result = Err(err);
            }
        }
        result
    }
}

impl Drop for WidgetFactory {
    fn drop(&mut self) {
        if let Some(link) = self.columns.get_mut().take() {
            link.columns.columns_changed().disconnect(link.changed_id);
        }
    }
}

impl fmt::Debug for WidgetFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetFactory")
            .field("columns", &self.columns().map(|columns| columns.len()))
            .field("widgets", &self.widget_count())
            .field("editors", &self.editor_count())
            .field("widget_appearance", &self.child_appearance())
            .field("editor_appearance", &self.editor_appearance())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(WidgetFactory: Send, Sync);
