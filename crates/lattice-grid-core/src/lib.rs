//! Core systems for Lattice Grid.
//!
//! This crate provides the notification primitives the grid core is built on:
//!
//! - **Signal/Slot System**: Type-safe, re-entrant observer callbacks
//! - **Property System**: Change-detecting values that pair with signals
//! - **Logging**: `tracing` targets and performance spans
//!
//! # Example
//!
//! ```
//! use lattice_grid_core::{Property, Signal};
//!
//! let enabled = Property::new(true);
//! let enabled_changed = Signal::<bool>::new();
//! enabled_changed.connect(|value| println!("enabled = {value}"));
//!
//! if enabled.set(false) {
//!     enabled_changed.emit(false);
//! }
//! ```

pub mod logging;
pub mod property;
pub mod signal;

pub use logging::PerfSpan;
pub use property::Property;
pub use signal::{ConnectionId, Signal, SignalEmitter};
