//! Ordered column collection.

use std::fmt;
use std::sync::{Arc, Weak};

use lattice_grid_core::logging::targets;
use lattice_grid_core::{ConnectionId, Signal};
use parking_lot::{Mutex, RwLock};

use super::base::Column;
use super::grid::DataGrid;
use super::options::{ColumnProperty, SortOrder};
use crate::error::{Error, Result};

struct Entry {
    column: Arc<Column>,
    changed_id: ConnectionId,
}

/// The ordered columns of a grid.
///
/// The collection keeps at most one column sorted: when a member's sort
/// order becomes ascending or descending, every other member is reset to
/// [`SortOrder::None`]. It also attaches its members to the collection's
/// [`DataGrid`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lattice_grid::column::{Column, Columns, SortOrder};
///
/// let columns = Columns::new();
/// let name = Arc::new(Column::new("name"));
/// let age = Arc::new(Column::new("age"));
/// columns.add(name.clone()).unwrap();
/// columns.add(age.clone()).unwrap();
///
/// name.set_sort_order(SortOrder::Descending);
/// age.set_sort_order(SortOrder::Ascending);
/// assert_eq!(name.sort_order(), SortOrder::None);
/// assert!(Arc::ptr_eq(&columns.sorted_column().unwrap(), &age));
/// ```
pub struct Columns {
    this: Weak<Columns>,
    entries: RwLock<Vec<Entry>>,
    grid: Mutex<Option<Arc<DataGrid>>>,
    columns_changed: Signal<()>,
}

impl Columns {
    /// Creates an empty collection.
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            entries: RwLock::new(Vec::new()),
            grid: Mutex::new(None),
            columns_changed: Signal::new(),
        })
    }

    /// Creates a collection holding `columns`, in order.
    ///
    /// # Errors
    ///
    /// See [`insert`](Self::insert).
    pub fn from_columns(columns: impl IntoIterator<Item = Arc<Column>>) -> Result<Arc<Self>> {
        let collection = Self::new();
        for column in columns {
            collection.add(column)?;
        }
        Ok(collection)
    }

    /// Signal emitted whenever columns are added or removed.
    pub fn columns_changed(&self) -> &Signal<()> {
        &self.columns_changed
    }

    /// Appends a column.
    ///
    /// # Errors
    ///
    /// See [`insert`](Self::insert).
    pub fn add(&self, column: Arc<Column>) -> Result<()> {
        let index = self.len();
        self.insert(index, column)
    }

    /// Inserts a column at `index`, clamped to the current length.
    ///
    /// A sorted column entering the collection resets the other members'
    /// sort order.
    ///
    /// # Errors
    ///
    /// Fails if the column is already a member, or if it belongs to a grid
    /// other than the collection's.
    pub fn insert(&self, index: usize, column: Arc<Column>) -> Result<()> {
        if self.index_of(&column).is_some() {
            return Err(Error::Config(format!(
                "column {:?} is already in the collection",
                column.path()
            )));
        }
        let grid = self.grid.lock().clone();
        if let Some(grid) = grid {
            column.set_data_grid(Some(grid))?;
        }

        let changed_id = {
            let columns = self.this.clone();
            let member = Arc::downgrade(&column);
            column.signals().changed.connect(move |property| {
                if *property != ColumnProperty::SortOrder {
                    return;
                }
                if let (Some(columns), Some(member)) = (columns.upgrade(), member.upgrade())
                    && member.sort_order().is_sorted()
                {
                    columns.enforce_single_sort(&member);
                }
            })
        };

        {
            let mut entries = self.entries.write();
            let index = index.min(entries.len());
            entries.insert(
                index,
                Entry {
                    column: column.clone(),
                    changed_id,
                },
            );
        }
        tracing::debug!(target: targets::COLUMN, index, path = ?column.path(), "column added");

        if column.sort_order().is_sorted() {
            self.enforce_single_sort(&column);
        }
        self.columns_changed.emit(());
        Ok(())
    }

    /// Removes and returns the column at `index`.
    ///
    /// The column is detached from the collection's grid.
    pub fn remove(&self, index: usize) -> Option<Arc<Column>> {
        let entry = {
            let mut entries = self.entries.write();
            if index >= entries.len() {
                return None;
            }
            entries.remove(index)
        };
        entry.column.signals().changed.disconnect(entry.changed_id);
        if self.grid.lock().is_some() {
            // Detaching never fails.
            let _ = entry.column.set_data_grid(None);
        }
        tracing::debug!(target: targets::COLUMN, index, path = ?entry.column.path(), "column removed");
        self.columns_changed.emit(());
        Some(entry.column)
    }

    /// Returns the column at `index`; negative or out-of-range indices give `None`.
    pub fn column(&self, index: i64) -> Option<Arc<Column>> {
        let index = usize::try_from(index).ok()?;
        self.entries.read().get(index).map(|entry| entry.column.clone())
    }

    /// Returns the position of `column` in the collection.
    pub fn index_of(&self, column: &Arc<Column>) -> Option<usize> {
        self.entries
            .read()
            .iter()
            .position(|entry| Arc::ptr_eq(&entry.column, column))
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns a snapshot of the columns, in order.
    pub fn columns(&self) -> Vec<Arc<Column>> {
        self.entries.read().iter().map(|entry| entry.column.clone()).collect()
    }

    /// Iterates over a snapshot of the columns.
    pub fn iter(&self) -> impl Iterator<Item = Arc<Column>> + use<> {
        self.columns().into_iter()
    }

    /// Returns the sorted column, if any.
    pub fn sorted_column(&self) -> Option<Arc<Column>> {
        self.entries
            .read()
            .iter()
            .find(|entry| entry.column.sort_order().is_sorted())
            .map(|entry| entry.column.clone())
    }

    /// Returns the grid the collection's columns are attached to.
    pub fn data_grid(&self) -> Option<Arc<DataGrid>> {
        self.grid.lock().clone()
    }

    /// Attaches every column to `grid`, or detaches them all with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DataGridAlreadySet`] if a column belongs to a grid the
    /// collection did not attach it to.
    pub fn set_data_grid(&self, grid: Option<Arc<DataGrid>>) -> Result<()> {
        let previous = {
            let mut current = self.grid.lock();
            std::mem::replace(&mut *current, grid.clone())
        };
        let same = match (&previous, &grid) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if same {
            return Ok(());
        }

        for column in self.columns() {
            if previous.is_some() {
                column.set_data_grid(None)?;
            }
            if grid.is_some() {
                column.set_data_grid(grid.clone())?;
            }
        }
        Ok(())
    }

    fn enforce_single_sort(&self, sorted: &Arc<Column>) {
        let others: Vec<Arc<Column>> = self
            .columns()
            .into_iter()
            .filter(|column| !Arc::ptr_eq(column, sorted) && column.sort_order().is_sorted())
            .collect();
        for column in others {
            tracing::debug!(target: targets::COLUMN, path = ?column.path(), "resetting sort order");
            column.set_sort_order(SortOrder::None);
        }
    }
}

impl Drop for Columns {
    fn drop(&mut self) {
        for entry in self.entries.get_mut().drain(..) {
            entry.column.signals().changed.disconnect(entry.changed_id);
        }
    }
}

impl fmt::Debug for Columns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Columns")
            .field("columns", &self.columns())
            .field("grid", &self.grid.lock().is_some())
            .finish()
    }
}

static_assertions::assert_impl_all!(Columns: Send, Sync);
