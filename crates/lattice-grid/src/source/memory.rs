//! In-memory reference data source.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use lattice_grid_core::logging::targets;
use lattice_grid_core::{PerfSpan, Property, Signal};
use parking_lot::Mutex;
use serde_json::json;

use super::data_source::DataSource;
use super::model::{ModelRef, RecordModel};
use super::position::Position;
use super::range::Range;
use crate::error::Result;

/// Creates the model for a position entering the materialized window.
///
/// Any `Fn(Position) -> Result<ModelRef>` closure is a loader.
pub trait ModelLoader: Send + Sync {
    /// Creates the model for `position`.
    ///
    /// # Errors
    ///
    /// A failure aborts the whole `make_available` call that requested it.
    fn load(&self, position: Position) -> Result<ModelRef>;
}

impl<F> ModelLoader for F
where
    F: Fn(Position) -> Result<ModelRef> + Send + Sync,
{
    fn load(&self, position: Position) -> Result<ModelRef> {
        self(position)
    }
}

/// The default loader: a [`RecordModel`] whose `value` attribute is the cell id.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordLoader;

impl ModelLoader for RecordLoader {
    fn load(&self, position: Position) -> Result<ModelRef> {
        Ok(Arc::new(RecordModel::new(
            position,
            json!({ "value": position.to_id() }),
        )))
    }
}

#[derive(Default)]
struct Window {
    models: HashMap<Position, ModelRef>,
    /// `None` until the first window is published, and while a new one is
    /// being committed.
    range: Option<Range>,
    generation: u64,
}

/// A data source that materializes models in memory.
///
/// Models are produced on demand by a [`ModelLoader`]. When the window moves,
/// models at positions present in both the old and the new window are kept
/// (so widgets stay bound to the same instance while scrolling), models
/// leaving the window are disposed, and the first column of every row in the
/// new window is kept or created so a frozen first column survives
/// horizontal scrolling.
///
/// # Example
///
/// ```
/// use lattice_grid::source::{DataSource, MemoryDataSource, Position, Range};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let source = MemoryDataSource::new(100, 100);
/// let window = Range::new(Position::new(0, 0), 10, 5);
/// assert!(!source.is_available(&window));
///
/// source.make_available(window).await.unwrap();
/// assert!(source.is_available(&window));
/// assert!(source.model_for_position(Position::new(3, 4)).is_some());
/// # }
/// ```
pub struct MemoryDataSource {
    num_rows: Property<i64>,
    num_columns: Property<i64>,
    loader: Box<dyn ModelLoader>,
    window: Mutex<Window>,
    size_changed: Signal<Position>,
}

impl Default for MemoryDataSource {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ROWS, Self::DEFAULT_COLUMNS)
    }
}

impl MemoryDataSource {
    /// Row count used by [`Default`].
    pub const DEFAULT_ROWS: i64 = 100;
    /// Column count used by [`Default`].
    pub const DEFAULT_COLUMNS: i64 = 100;

    /// Creates a source of the given size using the [`RecordLoader`].
    pub fn new(num_rows: i64, num_columns: i64) -> Self {
        Self::with_loader(num_rows, num_columns, RecordLoader)
    }

    /// Creates a source of the given size with a custom loader.
    pub fn with_loader(num_rows: i64, num_columns: i64, loader: impl ModelLoader + 'static) -> Self {
        Self {
            num_rows: Property::new(num_rows.max(0)),
            num_columns: Property::new(num_columns.max(0)),
            loader: Box::new(loader),
            window: Mutex::new(Window::default()),
            size_changed: Signal::new(),
        }
    }

    /// Returns the number of rows.
    pub fn num_rows(&self) -> i64 {
        self.num_rows.get()
    }

    /// Sets the number of rows, evicting models beyond it.
    pub fn set_num_rows(&self, num_rows: i64) {
        if self.num_rows.set(num_rows.max(0)) {
            self.apply_size();
        }
    }

    /// Returns the number of columns.
    pub fn num_columns(&self) -> i64 {
        self.num_columns.get()
    }

    /// Sets the number of columns, evicting models beyond it.
    pub fn set_num_columns(&self, num_columns: i64) {
        if self.num_columns.set(num_columns.max(0)) {
            self.apply_size();
        }
    }

    /// Returns the published materialized window, if any.
    pub fn materialized_range(&self) -> Option<Range> {
        self.window.lock().range
    }

    /// Returns the number of live models.
    pub fn model_count(&self) -> usize {
        self.window.lock().models.len()
    }

    fn apply_size(&self) {
        let size = self.size();
        let evicted: Vec<ModelRef> = {
            let mut window = self.window.lock();
            let outside: Vec<Position> = window
                .models
                .keys()
                .filter(|pos| pos.row() >= size.row() || pos.column() >= size.column())
                .copied()
                .collect();
            let evicted = outside
                .iter()
                .filter_map(|pos| window.models.remove(pos))
                .collect();
            if let Some(range) = window.range {
                window.range = Some(range.clamp_to(size));
            }
            evicted
        };

        tracing::debug!(target: targets::SOURCE, %size, evicted = evicted.len(), "data size changed");
        for model in &evicted {
            model.dispose();
        }
        self.size_changed.emit(size);
    }

    #[tracing::instrument(skip(self), target = "lattice_grid::source", level = "debug")]
    fn materialize(&self, range: Range) -> Result<()> {
        let _perf = PerfSpan::new("make_available");
        let wanted: Vec<Position> = range.iter().chain(range.rows_iter()).collect();

        loop {
            let existing: HashSet<Position> = self.window.lock().models.keys().copied().collect();

            // Load outside the lock; loaders are host code.
            let mut loaded: HashMap<Position, ModelRef> = HashMap::new();
            for &pos in &wanted {
                if existing.contains(&pos) || loaded.contains_key(&pos) {
                    continue;
                }
                match self.loader.load(pos) {
                    Ok(model) => {
                        loaded.insert(pos, model);
                    }
                    Err(err) => {
                        tracing::warn!(target: targets::SOURCE, %range, %pos, error = %err, "failed to materialize window");
                        for model in loaded.values() {
                            model.dispose();
                        }
                        return Err(err);
                    }
                }
            }

            let (evicted, reused, generation) = {
                let mut window = self.window.lock();
                let complete = wanted
                    .iter()
                    .all(|pos| window.models.contains_key(pos) || loaded.contains_key(pos));
                if !complete {
                    // Models were evicted while loading; start over from the new state.
                    drop(window);
                    for model in loaded.values() {
                        model.dispose();
                    }
                    continue;
                }

                let mut previous = std::mem::take(&mut window.models);
                let mut models = HashMap::with_capacity(wanted.len());
                let mut reused = 0usize;
                for &pos in &wanted {
                    if models.contains_key(&pos) {
                        continue;
                    }
                    let model = match previous.remove(&pos) {
                        Some(model) => {
                            reused += 1;
                            Some(model)
                        }
                        None => loaded.remove(&pos),
                    };
                    if let Some(model) = model {
                        models.insert(pos, model);
                    }
                }

                window.models = models;
                window.range = None;
                window.generation += 1;

                let mut evicted: Vec<ModelRef> = previous.into_values().collect();
                evicted.extend(loaded.into_values());
                (evicted, reused, window.generation)
            };

            for model in &evicted {
                model.dispose();
            }

            let mut window = self.window.lock();
            if window.generation != generation {
                // Another request committed while evicted models were being
                // disposed. This one completes later, so it commits again.
                drop(window);
                tracing::debug!(target: targets::SOURCE, %range, "window superseded during eviction, recommitting");
                continue;
            }
            window.range = Some(range);
            tracing::debug!(
                target: targets::SOURCE,
                %range,
                models = window.models.len(),
                reused,
                evicted = evicted.len(),
                "window materialized"
            );
            return Ok(());
        }
    }
}

impl DataSource for MemoryDataSource {
    fn size(&self) -> Position {
        Position::new(self.num_rows.get(), self.num_columns.get())
    }

    fn is_available(&self, range: &Range) -> bool {
        self.window
            .lock()
            .range
            .is_some_and(|window| window.eclipses(range) || window.column_zero().eclipses(range))
    }

    fn make_available(&self, range: Range) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move { self.materialize(range) })
    }

    fn model_for_position(&self, pos: Position) -> Option<ModelRef> {
        self.window.lock().models.get(&pos).cloned()
    }

    fn size_changed(&self) -> &Signal<Position> {
        &self.size_changed
    }
}

impl fmt::Debug for MemoryDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let window = self.window.lock();
        f.debug_struct("MemoryDataSource")
            .field("size", &self.size())
            .field("range", &window.range)
            .field("models", &window.models.len())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(MemoryDataSource: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn range(row: i64, column: i64, rows: i64, columns: i64) -> Range {
        Range::new(Position::new(row, column), rows, columns)
    }

    #[tokio::test]
    async fn test_make_available_publishes_exact_range() {
        let source = MemoryDataSource::default();
        let window = range(0, 0, 10, 5);
        source.make_available(window).await.unwrap();

        assert_eq!(source.materialized_range(), Some(window));
        assert!(source.is_available(&window));
        assert!(source.is_available(&range(2, 1, 3, 3)));
        assert!(!source.is_available(&range(0, 0, 11, 5)));
        assert!(!source.is_available(&range(0, 5, 1, 1)));
        assert_eq!(source.model_count(), 50);
    }

    #[tokio::test]
    async fn test_column_zero_carve_out() {
        let source = MemoryDataSource::default();
        source.make_available(range(0, 0, 10, 5)).await.unwrap();
        let sticky = source.model_for_position(Position::new(4, 0)).unwrap();

        // Scroll right: column 0 of each row stays materialized.
        source.make_available(range(0, 3, 10, 5)).await.unwrap();
        let kept = source.model_for_position(Position::new(4, 0)).unwrap();
        assert!(Arc::ptr_eq(&sticky, &kept));
        assert!(!sticky.is_disposed());
        assert!(source.is_available(&range(0, 0, 10, 1)));
        assert!(source.model_for_position(Position::new(4, 1)).is_none());
    }

    #[tokio::test]
    async fn test_column_zero_created_for_new_rows() {
        let source = MemoryDataSource::default();
        source.make_available(range(20, 3, 5, 5)).await.unwrap();
        assert!(source.is_available(&range(20, 0, 5, 1)));
        for row in 20..25 {
            assert!(source.model_for_position(Position::new(row, 0)).is_some());
        }
    }

    #[tokio::test]
    async fn test_size_change_evicts_and_clamps() {
        let source = MemoryDataSource::new(100, 100);
        source.make_available(range(0, 0, 10, 10)).await.unwrap();
        let outside = source.model_for_position(Position::new(8, 8)).unwrap();
        let inside = source.model_for_position(Position::new(2, 2)).unwrap();

        let sizes = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sizes_clone = sizes.clone();
        source.size_changed().connect(move |size| sizes_clone.lock().push(*size));

        source.set_num_rows(5);
        source.set_num_rows(5);

        assert_eq!(sizes.lock().as_slice(), [Position::new(5, 100)]);
        assert!(outside.is_disposed());
        assert!(!inside.is_disposed());
        assert!(source.model_for_position(Position::new(8, 8)).is_none());
        assert_eq!(source.materialized_range(), Some(range(0, 0, 5, 10)));
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_window_untouched() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        let source = MemoryDataSource::with_loader(100, 100, move |pos: Position| -> Result<ModelRef> {
            attempts_clone.fetch_add(1, Ordering::SeqCst);
            if pos.row() >= 50 {
                Err(Error::fetch(pos, "backing store unavailable"))
            } else {
                RecordLoader.load(pos)
            }
        });

        let first = range(40, 0, 5, 2);
        source.make_available(first).await.unwrap();
        let before = source.model_for_position(Position::new(44, 1)).unwrap();

        let result = source.make_available(range(44, 0, 10, 2)).await;
        assert!(matches!(result, Err(Error::Fetch { .. })));

        assert_eq!(source.materialized_range(), Some(first));
        assert!(source.is_available(&first));
        assert!(!source.is_available(&range(44, 0, 10, 2)));
        let after = source.model_for_position(Position::new(44, 1)).unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert!(!after.is_disposed());
        assert!(attempts.load(Ordering::SeqCst) > 10);
    }

    #[tokio::test]
    async fn test_overlapping_requests_last_completed_wins() {
        let source = MemoryDataSource::default();
        let a = range(0, 0, 5, 5);
        let b = range(50, 50, 5, 5);

        let first = source.make_available(a);
        let second = source.make_available(b);
        second.await.unwrap();
        first.await.unwrap();

        assert_eq!(source.materialized_range(), Some(a));
        assert!(source.is_available(&a));
        assert!(!source.is_available(&b));
        assert!(source.model_for_position(Position::new(52, 52)).is_none());
    }
}
