//! Positions, ranges, models, and data sources.
//!
//! This module holds the data side of the grid: how cells are addressed
//! ([`Position`], [`Range`]), what backs a cell ([`GridModel`]), and the
//! [`DataSource`] contract that materializes a window of models ahead of
//! rendering. [`MemoryDataSource`] is the in-memory reference implementation.

mod data_source;
mod memory;
mod model;
mod position;
mod range;

pub use data_source::DataSource;
pub use memory::{MemoryDataSource, ModelLoader, RecordLoader};
pub use model::{
    GridModel, ModelRef, RecordModel, assign_path, lookup_path, normalize_path, path_affects,
    path_segments,
};
pub use position::Position;
pub use range::{PositionIter, Range};
