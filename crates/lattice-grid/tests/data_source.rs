//! Window materialization through the public data source API.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use futures_util::FutureExt;
use lattice_grid::source::{
    DataSource, GridModel, MemoryDataSource, ModelLoader, ModelRef, Position, Range, RecordLoader,
    RecordModel,
};
use lattice_grid::{Error, Result};
use lattice_grid_core::Signal;
use parking_lot::Mutex;
use serde_json::Value;

type DisposeHook = Box<dyn FnOnce() + Send>;

/// A record model that counts how often it is disposed.
struct CountingModel {
    record: RecordModel,
    disposals: AtomicUsize,
    on_dispose: Mutex<Option<DisposeHook>>,
}

impl CountingModel {
    fn disposals(&self) -> usize {
        self.disposals.load(Ordering::SeqCst)
    }

    /// Runs `hook` the first time the model is disposed.
    fn on_dispose(&self, hook: impl FnOnce() + Send + 'static) {
        *self.on_dispose.lock() = Some(Box::new(hook));
    }
}

impl fmt::Debug for CountingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountingModel")
            .field("position", &self.record.position())
            .field("disposals", &self.disposals())
            .finish_non_exhaustive()
    }
}

impl GridModel for CountingModel {
    fn position(&self) -> Position {
        self.record.position()
    }

    fn value(&self, path: &str) -> Option<Value> {
        self.record.value(path)
    }

    fn set_value(&self, path: &str, value: Value) -> Result<()> {
        self.record.set_value(path, value)
    }

    fn property_changed(&self) -> &Arc<Signal<String>> {
        self.record.property_changed()
    }

    fn dispose(&self) {
        self.disposals.fetch_add(1, Ordering::SeqCst);
        self.record.dispose();
        let hook = self.on_dispose.lock().take();
        if let Some(hook) = hook {
            hook();
        }
    }

    fn is_disposed(&self) -> bool {
        self.record.is_disposed()
    }
}

/// A loader that remembers every model it created.
#[derive(Clone, Default)]
struct TrackingLoader {
    created: Arc<Mutex<Vec<Arc<CountingModel>>>>,
}

impl TrackingLoader {
    fn created(&self) -> Vec<Arc<CountingModel>> {
        self.created.lock().clone()
    }

    fn created_at(&self, pos: Position) -> Option<Arc<CountingModel>> {
        self.created
            .lock()
            .iter()
            .rev()
            .find(|model| model.position() == pos)
            .cloned()
    }
}

impl ModelLoader for TrackingLoader {
    fn load(&self, position: Position) -> Result<ModelRef> {
        let model = Arc::new(CountingModel {
            record: RecordModel::new(position, serde_json::json!({ "value": position.to_id() })),
            disposals: AtomicUsize::new(0),
            on_dispose: Mutex::new(None),
        });
        self.created.lock().push(model.clone());
        Ok(model)
    }
}

/// Every model the loader created is either live in the source and never
/// disposed, or gone from it and disposed exactly once.
fn assert_disposed_once_unless_live(loader: &TrackingLoader, source: &MemoryDataSource) {
    for model in loader.created() {
        let model_ref: ModelRef = model.clone();
        let live = source
            .model_for_position(model.position())
            .is_some_and(|current| Arc::ptr_eq(&current, &model_ref));
        let expected = if live { 0 } else { 1 };
        assert_eq!(model.disposals(), expected, "{model:?} live={live}");
    }
}

fn range(row: i64, column: i64, rows: i64, columns: i64) -> Range {
    Range::new(Position::new(row, column), rows, columns)
}

fn snapshot(source: &MemoryDataSource, window: Range) -> HashMap<Position, ModelRef> {
    window
        .iter()
        .filter_map(|pos| source.model_for_position(pos).map(|model| (pos, model)))
        .collect()
}

#[tokio::test]
async fn test_scroll_down_keeps_shared_rows() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let loader = TrackingLoader::default();
    let source = MemoryDataSource::with_loader(100, 100, loader.clone());

    let first = range(0, 0, 10, 5);
    source.make_available(first).await.unwrap();
    let before = snapshot(&source, first);
    assert_eq!(before.len(), 50);

    let second = range(5, 0, 10, 5);
    source.make_available(second).await.unwrap();
    assert!(source.is_available(&second));
    assert!(!source.is_available(&first));

    for row in 5..10 {
        for column in 0..5 {
            let pos = Position::new(row, column);
            let now = source.model_for_position(pos).unwrap();
            assert!(Arc::ptr_eq(&before[&pos], &now), "identity lost at {pos}");
            assert!(!now.is_disposed());
        }
    }
    for row in 0..5 {
        for column in 0..5 {
            let pos = Position::new(row, column);
            assert!(before[&pos].is_disposed(), "{pos} should be disposed");
            assert!(source.model_for_position(pos).is_none());
        }
    }
    for row in 10..15 {
        let pos = Position::new(row, 2);
        let model = source.model_for_position(pos).unwrap();
        assert!(!before.values().any(|old| Arc::ptr_eq(old, &model)));
    }

    // 50 initial models plus 25 for rows 10-14.
    assert_eq!(loader.created().len(), 75);
    assert_eq!(
        loader.created().iter().filter(|model| model.is_disposed()).count(),
        25
    );
}

#[tokio::test]
async fn test_model_position_round_trip() {
    let source = MemoryDataSource::default();
    let window = range(30, 10, 4, 4);
    source.make_available(window).await.unwrap();

    for pos in &window {
        let model = source.model_for_position(pos).unwrap();
        assert_eq!(source.position_of_model(model.as_ref()), pos);
        assert_eq!(model.value("value"), Some(serde_json::json!(pos.to_id())));
    }
}

#[tokio::test]
async fn test_unmaterialized_positions_never_fetch() {
    let loader = TrackingLoader::default();
    let source = MemoryDataSource::with_loader(100, 100, loader.clone());
    assert!(source.model_for_position(Position::new(0, 0)).is_none());
    assert!(!source.is_available(&range(0, 0, 1, 1)));
    assert!(loader.created().is_empty());
}

#[tokio::test]
async fn test_failure_never_claims_availability() {
    let source = MemoryDataSource::with_loader(100, 100, |pos: Position| -> Result<ModelRef> {
        if pos == Position::new(7, 3) {
            Err(Error::fetch(pos, "row locked"))
        } else {
            RecordLoader.load(pos)
        }
    });

    let window = range(5, 0, 5, 5);
    let err = source.make_available(window).await.unwrap_err();
    assert!(matches!(err, Error::Fetch { position, .. } if position == Position::new(7, 3)));
    assert!(!source.is_available(&window));
    assert!(source.materialized_range().is_none());
    assert_eq!(source.model_count(), 0);

    // A window avoiding the bad cell still works.
    let ok = range(0, 0, 5, 5);
    source.make_available(ok).await.unwrap();
    assert!(source.is_available(&ok));
}

#[tokio::test]
async fn test_horizontal_scroll_keeps_first_column() {
    let source = MemoryDataSource::default();
    source.make_available(range(0, 0, 10, 4)).await.unwrap();
    let frozen: Vec<ModelRef> = (0..10)
        .map(|row| source.model_for_position(Position::new(row, 0)).unwrap())
        .collect();

    source.make_available(range(0, 40, 10, 4)).await.unwrap();
    for (row, model) in (0..10).zip(&frozen) {
        let now = source.model_for_position(Position::new(row, 0)).unwrap();
        assert!(Arc::ptr_eq(model, &now));
    }
    assert!(source.is_available(&range(0, 0, 10, 1)));
    assert!(source.is_available(&range(0, 40, 10, 4)));
    assert!(!source.is_available(&range(0, 0, 10, 2)));
}

#[tokio::test]
async fn test_shrinking_columns_evicts() {
    let source = MemoryDataSource::new(50, 50);
    source.make_available(range(0, 0, 5, 10)).await.unwrap();
    let doomed = source.model_for_position(Position::new(1, 8)).unwrap();

    source.set_num_columns(6);
    assert_eq!(source.size(), Position::new(50, 6));
    assert!(doomed.is_disposed());
    assert_eq!(source.materialized_range(), Some(range(0, 0, 5, 6)));
    assert!(source.is_available(&range(0, 0, 5, 6)));
    assert_eq!(source.model_count(), 30);
}

#[tokio::test]
async fn test_models_disposed_exactly_once() {
    let loader = TrackingLoader::default();
    let source = MemoryDataSource::with_loader(100, 100, loader.clone());

    source.make_available(range(0, 0, 10, 5)).await.unwrap();
    source.make_available(range(5, 0, 10, 5)).await.unwrap();
    assert_disposed_once_unless_live(&loader, &source);

    // Horizontal scroll keeps column zero; scrolling back reloads the rest.
    source.make_available(range(5, 20, 10, 5)).await.unwrap();
    source.make_available(range(5, 20, 10, 5)).await.unwrap();
    source.make_available(range(5, 0, 10, 5)).await.unwrap();
    assert_disposed_once_unless_live(&loader, &source);

    source.set_num_rows(12);
    source.set_num_columns(3);
    assert_disposed_once_unless_live(&loader, &source);

    source.make_available(range(0, 0, 3, 3)).await.unwrap();
    assert_disposed_once_unless_live(&loader, &source);
    assert_eq!(source.model_count(), 9);
}

#[tokio::test]
async fn test_request_made_during_eviction_is_superseded() {
    let loader = TrackingLoader::default();
    let source = Arc::new(MemoryDataSource::with_loader(100, 100, loader.clone()));
    source.make_available(range(0, 0, 2, 2)).await.unwrap();

    // Disposing (0,1) starts and finishes a request for another window.
    let inner = range(50, 50, 2, 2);
    let inner_result = Arc::new(Mutex::new(None));
    {
        let source: Weak<MemoryDataSource> = Arc::downgrade(&source);
        let inner_result = inner_result.clone();
        loader
            .created_at(Position::new(0, 1))
            .unwrap()
            .on_dispose(move || {
                if let Some(source) = source.upgrade() {
                    let result = source.make_available(inner).now_or_never();
                    *inner_result.lock() = Some(result.is_some_and(|result| result.is_ok()));
                }
            });
    }

    let outer = range(10, 10, 2, 2);
    source.make_available(outer).await.unwrap();

    assert_eq!(*inner_result.lock(), Some(true));
    assert_eq!(source.materialized_range(), Some(outer));
    assert!(source.is_available(&outer));
    assert!(!source.is_available(&inner));
    assert!(source.model_for_position(Position::new(50, 50)).is_none());
    assert_disposed_once_unless_live(&loader, &source);
    assert_eq!(source.model_count(), 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_settle_on_one_window() {
    let loader = TrackingLoader::default();
    let source = Arc::new(MemoryDataSource::with_loader(1_000, 50, loader.clone()));
    let windows: Vec<Range> = (0..8).map(|i| range(i * 40, i * 3, 20, 6)).collect();

    let tasks: Vec<_> = windows
        .iter()
        .copied()
        .map(|window| {
            let source = source.clone();
            tokio::spawn(async move {
                for _ in 0..10 {
                    source.make_available(window).await.unwrap();
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let published = source.materialized_range().unwrap();
    assert!(windows.contains(&published));
    assert!(source.is_available(&published));
    let expected: std::collections::HashSet<Position> =
        published.iter().chain(published.rows_iter()).collect();
    assert_eq!(source.model_count(), expected.len());
    for pos in &expected {
        assert!(!source.model_for_position(*pos).unwrap().is_disposed());
    }
    assert_disposed_once_unless_live(&loader, &source);
}
