//! The data source contract.

use futures_util::future::BoxFuture;
use lattice_grid_core::Signal;

use super::model::{GridModel, ModelRef};
use super::position::Position;
use super::range::Range;
use crate::error::Result;

/// Supplies models for positions and manages the materialized window.
///
/// The viewport controller calls [`is_available`](DataSource::is_available)
/// on every scroll or resize and, when it returns `false`, awaits
/// [`make_available`](DataSource::make_available) before asking the widget
/// factory for cells.
///
/// # Implementation Requirements
///
/// - `make_available` must either fully publish the new window or leave the
///   previous one untouched; errors are returned, never retried internally.
/// - Evicted models must be disposed before the new window is reported as
///   available.
/// - [`size_changed`](DataSource::size_changed) must fire whenever the total
///   extent changes.
pub trait DataSource: Send + Sync {
    /// Returns the total extent of the data as (row count, column count).
    fn size(&self) -> Position;

    /// Returns `true` if every position in `range` has a model without fetching.
    fn is_available(&self, range: &Range) -> bool;

    /// Materializes `range`; on success it becomes the materialized window.
    fn make_available(&self, range: Range) -> BoxFuture<'_, Result<()>>;

    /// Returns the model for `pos` if it is materialized. Never fetches.
    fn model_for_position(&self, pos: Position) -> Option<ModelRef>;

    /// Returns the position a model belongs to.
    fn position_of_model(&self, model: &dyn GridModel) -> Position {
        model.position()
    }

    /// Signal emitted with the new size whenever the total extent changes.
    fn size_changed(&self) -> &Signal<Position>;
}
