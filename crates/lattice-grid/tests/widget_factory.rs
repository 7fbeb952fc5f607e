//! Widget pooling against a materialized data source.

use std::sync::Arc;

use lattice_grid::prelude::*;
use serde_json::json;

fn grid(rows: i64, paths: &[&str]) -> (Arc<MemoryDataSource>, Arc<WidgetFactory>) {
    let source = Arc::new(MemoryDataSource::new(rows, paths.len() as i64));
    let columns =
        Columns::from_columns(paths.iter().map(|path| Arc::new(Column::new(*path)))).unwrap();
    let factory = WidgetFactory::new();
    factory.set_columns(Some(columns)).unwrap();
    factory.set_data_source(Some(source.clone()));
    (source, factory)
}

fn window(row: i64, rows: i64, columns: i64) -> Range {
    Range::new(Position::new(row, 0), rows, columns)
}

#[tokio::test]
async fn test_same_cell_same_widget() {
    let (source, factory) = grid(100, &["value", "value"]);
    source.make_available(window(0, 5, 2)).await.unwrap();

    let first = factory.update_widget_for(2, 1).unwrap();
    let second = factory.widget_for(2, 1).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.value(), json!("2:1"));
    assert_eq!(factory.widget_count(), 1);

    factory.dispose_widget(&first).unwrap();
    let fresh = factory.widget_for(2, 1).unwrap();
    assert!(!Arc::ptr_eq(&first, &fresh));
    assert!(first.is_disposed());
    assert!(!fresh.is_disposed());
}

#[tokio::test]
async fn test_scrolling_rebinds_to_new_models() {
    let (source, factory) = grid(100, &["value", "value"]);
    source.make_available(window(0, 5, 2)).await.unwrap();
    for pos in &window(0, 5, 2) {
        factory.update_widget_for(pos.row(), pos.column()).unwrap();
    }
    let widget = factory.widget_for(3, 1).unwrap();
    let before = factory.model_for_widget(widget.as_ref()).unwrap();
    let scrolled_out = factory.widget_for(1, 1).unwrap();

    source.make_available(window(3, 5, 2)).await.unwrap();
    for pos in &window(3, 5, 2) {
        factory.update_widget_for(pos.row(), pos.column()).unwrap();
    }

    // Row 3 kept its model, so its widget kept its binding.
    let after = factory.model_for_widget(widget.as_ref()).unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(factory.widget_for(7, 0).unwrap().value(), json!("7:0"));
    assert_eq!(factory.widget_count(), 16);

    // Row 1 left the window; refreshing it drops the stale model.
    factory.update_widget_for(1, 1).unwrap();
    assert!(factory.model_for_widget(scrolled_out.as_ref()).is_none());
}

#[tokio::test]
async fn test_model_updates_reach_widget() {
    let (source, factory) = grid(10, &["value"]);
    source.make_available(window(0, 2, 1)).await.unwrap();
    let widget = factory.update_widget_for(1, 0).unwrap();

    let model = source.model_for_position(Position::new(1, 0)).unwrap();
    model.set_value("value", json!("changed")).unwrap();
    assert_eq!(widget.value(), json!("changed"));
}

#[tokio::test]
async fn test_editor_writes_back_to_model() {
    let (source, factory) = grid(10, &["value"]);
    source.make_available(window(0, 3, 1)).await.unwrap();
    let display = factory.update_widget_for(2, 0).unwrap();
    let editor = factory.update_editor_for(2, 0).unwrap().unwrap();
    assert_eq!(editor.value(), json!("2:0"));

    editor.set_value(json!("typed"));
    let model = source.model_for_position(Position::new(2, 0)).unwrap();
    assert_eq!(model.value("value"), Some(json!("typed")));
    assert_eq!(display.value(), json!("typed"));
}

#[tokio::test]
async fn test_read_only_grid_locks_editors() {
    let (source, factory) = grid(10, &["value"]);
    let grid = Arc::new(DataGrid::new());
    factory.columns().unwrap().set_data_grid(Some(grid.clone())).unwrap();
    source.make_available(window(0, 1, 1)).await.unwrap();

    let editor = factory.update_editor_for(0, 0).unwrap().unwrap();
    let display = factory.update_widget_for(0, 0).unwrap();
    assert!(!editor.is_read_only());
    assert!(display.is_enabled());

    grid.set_read_only(true);
    assert!(editor.is_read_only());
    assert!(editor.is_enabled());
    assert!(!display.is_enabled());

    grid.set_read_only(false);
    assert!(!editor.is_read_only());
    assert!(display.is_enabled());
}

#[tokio::test]
async fn test_dispose_all_leaves_models_untouched() {
    let (source, factory) = grid(10, &["value", "value"]);
    source.make_available(window(0, 2, 2)).await.unwrap();
    for pos in &window(0, 2, 2) {
        factory.update_widget_for(pos.row(), pos.column()).unwrap();
        factory.update_editor_for(pos.row(), pos.column()).unwrap();
    }
    let model = source.model_for_position(Position::new(1, 1)).unwrap();
    assert_eq!(model.property_changed().connection_count(), 2);

    factory.dispose_all_widgets().unwrap();
    assert_eq!(factory.widget_count(), 0);
    assert_eq!(factory.editor_count(), 0);
    assert_eq!(model.property_changed().connection_count(), 0);
    assert!(!model.is_disposed());
}
