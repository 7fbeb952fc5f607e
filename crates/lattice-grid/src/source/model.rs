//! Models backing grid cells.
//!
//! A model is the record a data source associates with a [`Position`]. The
//! grid core only needs three things from it: its own position (so the data
//! source can map a model back to its cell), path-based attribute access, and
//! a change notification per attribute path.
//!
//! Attribute paths are dotted (`address.city`) or slash separated
//! (`address/city`); a leading slash is ignored. Numeric segments index into
//! arrays.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lattice_grid_core::Signal;
use lattice_grid_core::logging::targets;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use super::position::Position;
use crate::error::{Error, Result};

/// Shared handle to a model.
pub type ModelRef = Arc<dyn GridModel>;

/// A record backing one grid cell.
///
/// # Implementation Requirements
///
/// - [`position`](GridModel::position) must return the cell the model was
///   created for; data sources derive the inverse mapping from it.
/// - [`set_value`](GridModel::set_value) must emit
///   [`property_changed`](GridModel::property_changed) with the normalized
///   path, and only when the stored value actually changed.
pub trait GridModel: Send + Sync + fmt::Debug {
    /// Returns the position this model was created for.
    fn position(&self) -> Position;

    /// Reads the attribute at `path`, or `None` if it does not exist.
    fn value(&self, path: &str) -> Option<Value>;

    /// Writes the attribute at `path`, creating intermediate objects as needed.
    ///
    /// # Errors
    ///
    /// Fails if the path cannot be written (e.g. it descends into a scalar)
    /// or the model has been disposed.
    fn set_value(&self, path: &str, value: Value) -> Result<()>;

    /// Signal emitted with the normalized path of every changed attribute.
    fn property_changed(&self) -> &Arc<Signal<String>>;

    /// Releases the model. Called by the owning data source on eviction.
    fn dispose(&self);

    /// Returns `true` once [`dispose`](GridModel::dispose) has been called.
    fn is_disposed(&self) -> bool;
}

/// Splits an attribute path into its segments.
pub fn path_segments(path: &str) -> Vec<&str> {
    path.split(['.', '/']).filter(|s| !s.is_empty()).collect()
}

/// Normalizes an attribute path to its dotted form.
pub fn normalize_path(path: &str) -> String {
    path_segments(path).join(".")
}

/// Returns `true` if a change at `changed` can affect the value read at `bound`.
///
/// That is the case when either path is a prefix of the other: replacing
/// `address` changes `address.city`, and writing `address.city` changes what
/// a binding on `address` sees.
pub fn path_affects(changed: &str, bound: &str) -> bool {
    let changed = path_segments(changed);
    let bound = path_segments(bound);
    let common = changed.len().min(bound.len());
    changed[..common] == bound[..common]
}

/// Reads `path` from a JSON document.
pub fn lookup_path(root: &Value, path: &str) -> Option<Value> {
    let mut current = root;
    for segment in path_segments(path) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current.clone())
}

/// Writes `value` at `path` in a JSON document, returning the previous value.
///
/// Missing intermediate objects are created; `null` intermediates are
/// replaced by objects.
///
/// # Errors
///
/// Fails for an empty path, an out-of-range array index, or a path that
/// descends into a scalar.
pub fn assign_path(root: &mut Value, path: &str, value: Value) -> Result<Option<Value>> {
    let segments = path_segments(path);
    let Some((last, parents)) = segments.split_last() else {
        return Err(Error::invalid_path(path, "path is empty"));
    };

    let mut current = root;
    for segment in parents {
        if current.is_null() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            Value::Array(items) => {
                let index = parse_index(path, segment, items.len())?;
                &mut items[index]
            }
            _ => return Err(Error::invalid_path(path, format!("'{segment}' is not a container"))),
        };
    }

    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    match current {
        Value::Object(map) => Ok(map.insert(last.to_string(), value)),
        Value::Array(items) => {
            let index = parse_index(path, last, items.len())?;
            Ok(Some(std::mem::replace(&mut items[index], value)))
        }
        _ => Err(Error::invalid_path(path, format!("parent of '{last}' is not a container"))),
    }
}

fn parse_index(path: &str, segment: &str, len: usize) -> Result<usize> {
    match segment.parse::<usize>() {
        Ok(index) if index < len => Ok(index),
        _ => Err(Error::invalid_path(
            path,
            format!("'{segment}' is not an index below {len}"),
        )),
    }
}

/// A model holding a JSON document.
///
/// This is the model [`MemoryDataSource`](super::MemoryDataSource) creates by
/// default.
///
/// # Example
///
/// ```
/// use lattice_grid::source::{GridModel, Position, RecordModel};
/// use serde_json::json;
///
/// let model = RecordModel::new(Position::new(0, 1), json!({ "name": { "first": "Ada" } }));
/// assert_eq!(model.value("name.first"), Some(json!("Ada")));
///
/// model.set_value("name/last", json!("Lovelace")).unwrap();
/// assert_eq!(model.value("name.last"), Some(json!("Lovelace")));
/// ```
pub struct RecordModel {
    position: Position,
    data: RwLock<Value>,
    property_changed: Arc<Signal<String>>,
    disposed: AtomicBool,
}

impl RecordModel {
    /// Creates a model for `position` holding `data`.
    pub fn new(position: Position, data: Value) -> Self {
        Self {
            position,
            data: RwLock::new(data),
            property_changed: Arc::new(Signal::new()),
            disposed: AtomicBool::new(false),
        }
    }

    /// Returns a copy of the whole document.
    pub fn data(&self) -> Value {
        self.data.read().clone()
    }
}

impl GridModel for RecordModel {
    fn position(&self) -> Position {
        self.position
    }

    fn value(&self, path: &str) -> Option<Value> {
        lookup_path(&self.data.read(), path)
    }

    fn set_value(&self, path: &str, value: Value) -> Result<()> {
        if self.is_disposed() {
            return Err(Error::ModelDisposed {
                position: self.position,
            });
        }
        let changed = {
            let mut data = self.data.write();
            let new_value = value.clone();
            assign_path(&mut data, path, value)?.as_ref() != Some(&new_value)
        };
        if changed {
            self.property_changed.emit(normalize_path(path));
        }
        Ok(())
    }

    fn property_changed(&self) -> &Arc<Signal<String>> {
        &self.property_changed
    }

    fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            tracing::trace!(target: targets::SOURCE, position = %self.position, "model disposed");
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for RecordModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordModel")
            .field("position", &self.position)
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(RecordModel: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_path_segments() {
        assert_eq!(path_segments("a.b.c"), vec!["a", "b", "c"]);
        assert_eq!(path_segments("/a/b"), vec!["a", "b"]);
        assert_eq!(normalize_path("a/b.c"), "a.b.c");
        assert!(path_segments("").is_empty());
    }

    #[test]
    fn test_path_affects() {
        assert!(path_affects("name", "name"));
        assert!(path_affects("address", "address.city"));
        assert!(path_affects("address/city", "address"));
        assert!(!path_affects("address.zip", "address.city"));
        assert!(!path_affects("name", "nickname"));
    }

    #[test]
    fn test_lookup_nested_and_arrays() {
        let doc = json!({ "tags": ["x", "y"], "a": { "b": 3 } });
        assert_eq!(lookup_path(&doc, "a.b"), Some(json!(3)));
        assert_eq!(lookup_path(&doc, "tags/1"), Some(json!("y")));
        assert_eq!(lookup_path(&doc, "tags.5"), None);
        assert_eq!(lookup_path(&doc, "a.b.c"), None);
    }

    #[test]
    fn test_assign_creates_intermediates() {
        let mut doc = Value::Null;
        assert_eq!(assign_path(&mut doc, "a.b", json!(1)).unwrap(), None);
        assert_eq!(doc, json!({ "a": { "b": 1 } }));
        assert_eq!(assign_path(&mut doc, "a.b", json!(2)).unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_assign_rejects_scalars() {
        let mut doc = json!({ "a": 5 });
        assert!(matches!(
            assign_path(&mut doc, "a.b", json!(1)),
            Err(Error::InvalidPath { .. })
        ));
        assert!(assign_path(&mut doc, "", json!(1)).is_err());
    }

    #[test]
    fn test_set_value_notifies_only_on_change() {
        let model = RecordModel::new(Position::new(1, 1), json!({ "value": "a" }));
        let count = Arc::new(AtomicUsize::new(0));
        let paths = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let count_clone = count.clone();
        let paths_clone = paths.clone();
        model.property_changed().connect(move |path| {
            count_clone.fetch_add(1, Ordering::SeqCst);
            paths_clone.lock().push(path.clone());
        });

        model.set_value("value", json!("a")).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);

        model.set_value("/value", json!("b")).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(paths.lock().as_slice(), ["value".to_string()]);
    }

    #[test]
    fn test_disposed_model_rejects_writes() {
        let model = RecordModel::new(Position::new(2, 0), json!({}));
        model.dispose();
        model.dispose();
        assert!(model.is_disposed());
        assert!(matches!(
            model.set_value("value", json!(1)),
            Err(Error::ModelDisposed { .. })
        ));
    }
}
