//! Columns, the column collection and the grid state they depend on.
//!
//! # Key Types
//!
//! - [`Column`] - Per-column configuration plus the widget binding contract
//! - [`ColumnDelegate`] - Hooks for custom widgets and property reactions
//! - [`Columns`] - Ordered collection enforcing a single sorted column
//! - [`DataGrid`] - The grid-level enabled/read-only flags

mod base;
mod columns;
mod delegate;
mod grid;
mod options;

pub use base::{BindingOptionsFn, ColSpanFn, Column, ColumnSignals, FillWidthFn};
pub use columns::Columns;
pub use delegate::{ColumnDelegate, DefaultColumnDelegate};
pub use grid::DataGrid;
pub use options::{
    BindingDirection, BindingOptions, CellContext, ColumnProperty, SortOrder, ValueConverter,
};
