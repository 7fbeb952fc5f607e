//! Stock cell widgets.

mod label;
mod text_field;

pub use label::{CELL_APPEARANCE, Label};
pub use text_field::TextField;
