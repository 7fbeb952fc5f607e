//! Widget pooling and recycling.
//!
//! The [`WidgetFactory`] owns one display widget and at most one editor per
//! cell. The renderer asks it for the widget at each visible position,
//! rebinds the widget whenever the model behind the cell changes, and
//! disposes widgets that scroll out of the pool's working set.

mod creator;
mod widget_factory;

pub use creator::{ColumnWidgetCreator, WidgetCreator};
pub use widget_factory::{BINDING_DATA_KEY, BindingData, WidgetFactory};
