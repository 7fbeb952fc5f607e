//! Grid-level state that columns depend on.

use std::fmt;
use std::sync::Arc;

use lattice_grid_core::{Property, Signal};

/// The owning grid's enabled and read-only flags.
///
/// Columns attached with [`Column::set_data_grid`](super::Column::set_data_grid)
/// combine these flags with their own to compute effective state.
pub struct DataGrid {
    enabled: Property<bool>,
    read_only: Property<bool>,
    enabled_changed: Arc<Signal<bool>>,
    read_only_changed: Arc<Signal<bool>>,
}

impl DataGrid {
    /// Creates an enabled, writable grid.
    pub fn new() -> Self {
        Self {
            enabled: Property::new(true),
            read_only: Property::new(false),
            enabled_changed: Arc::new(Signal::new()),
            read_only_changed: Arc::new(Signal::new()),
        }
    }

    /// Returns whether the grid is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Enables or disables the grid.
    pub fn set_enabled(&self, enabled: bool) {
        if self.enabled.set(enabled) {
            self.enabled_changed.emit(enabled);
        }
    }

    /// Returns whether the grid is read-only.
    pub fn is_read_only(&self) -> bool {
        self.read_only.get()
    }

    /// Makes the grid read-only or writable.
    pub fn set_read_only(&self, read_only: bool) {
        if self.read_only.set(read_only) {
            self.read_only_changed.emit(read_only);
        }
    }

    /// Signal emitted when the enabled flag changes.
    pub fn enabled_changed(&self) -> &Arc<Signal<bool>> {
        &self.enabled_changed
    }

    /// Signal emitted when the read-only flag changes.
    pub fn read_only_changed(&self) -> &Arc<Signal<bool>> {
        &self.read_only_changed
    }
}

impl Default for DataGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DataGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataGrid")
            .field("enabled", &self.is_enabled())
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

static_assertions::assert_impl_all!(DataGrid: Send, Sync);
