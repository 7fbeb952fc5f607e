//! Cell widget abstraction.
//!
//! Widgets are created by columns, pooled by the
//! [`WidgetFactory`](crate::factory::WidgetFactory), and wired to models
//! through [`Bindings`](crate::binding::Bindings).

mod base;
mod traits;
pub mod widgets;

pub use base::{UserData, WidgetBase};
pub use traits::{CellWidget, WidgetCapabilities, WidgetRef};
pub use widgets::{CELL_APPEARANCE, Label, TextField};
