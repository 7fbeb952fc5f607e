//! Widget construction strategies for the factory.

use crate::column::Column;
use crate::error::{Error, Result};
use crate::widget::WidgetRef;

/// Builds the widgets a [`WidgetFactory`](super::WidgetFactory) pools.
///
/// Both methods default to an [`Error::Unimplemented`] failure, so a creator
/// that forgets a hook reports it the first time the hook is needed.
pub trait WidgetCreator: Send + Sync {
    /// Creates a display widget for a cell of `column`.
    fn create_widget(&self, _column: &Column) -> Result<WidgetRef> {
        Err(Error::unimplemented::<Self>("create_widget"))
    }

    /// Creates an editor for a cell of `column`, or `None` to decline.
    fn create_editor(&self, _column: &Column) -> Result<Option<WidgetRef>> {
        Err(Error::unimplemented::<Self>("create_editor"))
    }
}

/// The standard creator: asks the column for its widgets.
#[derive(Debug, Default, Clone, Copy)]
pub struct ColumnWidgetCreator;

impl WidgetCreator for ColumnWidgetCreator {
    fn create_widget(&self, column: &Column) -> Result<WidgetRef> {
        column.create_widget_for_display()
    }

    fn create_editor(&self, column: &Column) -> Result<Option<WidgetRef>> {
        column.create_widget_for_edit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;
    impl WidgetCreator for Bare {}

    #[test]
    fn test_missing_hooks_fail() {
        let column = Column::new("x");
        match Bare.create_widget(&column) {
            Err(Error::Unimplemented { operation, type_name }) => {
                assert_eq!(operation, "create_widget");
                assert!(type_name.ends_with("Bare"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            Bare.create_editor(&column),
            Err(Error::Unimplemented { operation: "create_editor", .. })
        ));
    }

    #[test]
    fn test_column_creator_uses_column() {
        let column = Column::new("x");
        let widget = ColumnWidgetCreator.create_widget(&column).unwrap();
        assert_eq!(widget.appearance().as_deref(), Some(crate::widget::CELL_APPEARANCE));
        assert!(ColumnWidgetCreator.create_editor(&column).unwrap().is_some());
    }
}
