//! Lattice Grid - data virtualization and widget recycling for large grids.
//!
//! A grid that can show millions of cells only ever keeps a small window of
//! them alive. This crate provides the pieces that make that work:
//!
//! - [`source`] - cell addressing ([`Position`], [`Range`]), models, and the
//!   [`DataSource`] contract that materializes a window of models ahead of
//!   rendering
//! - [`column`] - per-column configuration and the binding contract between a
//!   widget and a model attribute
//! - [`binding`] - the [`Bindings`] ledger that releases every connection made
//!   for a widget in one step
//! - [`factory`] - the [`WidgetFactory`] pool that creates, rebinds and
//!   disposes widgets per cell
//! - [`config`] - declarative column configuration in TOML or JSON
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use lattice_grid::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> lattice_grid::Result<()> {
//! let source = Arc::new(MemoryDataSource::new(1_000, 3));
//! let columns = Columns::from_columns([
//!     Arc::new(Column::new("value")),
//!     Arc::new(Column::new("value")),
//!     Arc::new(Column::new("value")),
//! ])?;
//!
//! let factory = WidgetFactory::new();
//! factory.set_columns(Some(columns))?;
//! factory.set_data_source(Some(source.clone()));
//!
//! let visible = Range::new(Position::new(0, 0), 20, 3);
//! if !source.is_available(&visible) {
//!     source.make_available(visible).await?;
//! }
//! for pos in &visible {
//!     factory.update_widget_for(pos.row(), pos.column())?;
//! }
//!
//! let widget = factory.widget_for(4, 2)?;
//! assert_eq!(widget.value(), serde_json::json!("4:2"));
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod column;
pub mod config;
mod error;
pub mod factory;
pub mod source;
pub mod widget;

pub use binding::{BindingKind, Bindings};
pub use column::{Column, Columns, DataGrid, SortOrder};
pub use config::{ColumnConfig, GridConfig};
pub use error::{Error, Result};
pub use factory::WidgetFactory;
pub use source::{DataSource, GridModel, MemoryDataSource, ModelRef, Position, Range};
pub use widget::{CellWidget, WidgetRef};

/// The types most grids need.
pub mod prelude {
    pub use crate::binding::Bindings;
    pub use crate::column::{Column, ColumnDelegate, Columns, DataGrid, SortOrder};
    pub use crate::config::GridConfig;
    pub use crate::error::{Error, Result};
    pub use crate::factory::WidgetFactory;
    pub use crate::source::{
        DataSource, GridModel, MemoryDataSource, ModelRef, Position, Range, RecordModel,
    };
    pub use crate::widget::{CellWidget, Label, TextField, WidgetRef};
}
