//! Binding ledger.
//!
//! Wiring a widget to a model creates signal connections in several places:
//! on the model (value bindings), on the widget (reverse bindings for
//! editors) and on the column (effective-state listeners). A [`Bindings`]
//! ledger records each of them so they can all be released together when the
//! widget is rebound to a different model or disposed.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lattice_grid_core::logging::targets;
use lattice_grid_core::{ConnectionId, SignalEmitter};
use parking_lot::Mutex;
use serde_json::Value;

use crate::column::BindingOptions;
use crate::source::{GridModel, ModelRef, path_affects};
use crate::widget::{CellWidget, WidgetRef};

/// What a ledger entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// A value binding between a model attribute and a widget.
    Binding,
    /// A plain listener, such as effective-state sync.
    Listener,
}

struct Entry {
    owner: Arc<dyn SignalEmitter>,
    id: ConnectionId,
    kind: BindingKind,
}

/// A disposable set of connections created when binding a widget.
///
/// [`dispose`](Bindings::dispose) disconnects every entry exactly once. It is
/// idempotent, and entries added after disposal are released immediately.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lattice_grid::binding::Bindings;
/// use lattice_grid_core::Signal;
///
/// let changed = Arc::new(Signal::<i32>::new());
/// let bindings = Bindings::new(None);
/// let id = changed.connect(|_| {});
/// bindings.add_listener(changed.clone(), id);
///
/// bindings.dispose();
/// assert_eq!(changed.connection_count(), 0);
/// ```
pub struct Bindings {
    model: Option<ModelRef>,
    entries: Mutex<Vec<Entry>>,
    disposed: AtomicBool,
}

impl Bindings {
    /// Creates an empty ledger for a widget bound to `model`.
    pub fn new(model: Option<ModelRef>) -> Self {
        Self {
            model,
            entries: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
        }
    }

    /// Returns the model the ledger was created for.
    pub fn model(&self) -> Option<&ModelRef> {
        self.model.as_ref()
    }

    /// Records a connection on `owner`.
    pub fn add(&self, owner: Arc<dyn SignalEmitter>, id: ConnectionId, kind: BindingKind) {
        if self.is_disposed() {
            tracing::warn!(target: targets::BINDING, ?kind, "connection added to disposed bindings; releasing");
            owner.disconnect(id);
            return;
        }
        self.entries.lock().push(Entry { owner, id, kind });
    }

    /// Records a value binding.
    pub fn add_binding(&self, owner: Arc<dyn SignalEmitter>, id: ConnectionId) {
        self.add(owner, id, BindingKind::Binding);
    }

    /// Records a listener.
    pub fn add_listener(&self, owner: Arc<dyn SignalEmitter>, id: ConnectionId) {
        self.add(owner, id, BindingKind::Listener);
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Returns the number of live entries of `kind`.
    pub fn count(&self, kind: BindingKind) -> usize {
        self.entries.lock().iter().filter(|e| e.kind == kind).count()
    }

    /// Returns `true` once [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Releases every entry.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let entries = std::mem::take(&mut *self.entries.lock());
        tracing::trace!(target: targets::BINDING, count = entries.len(), "releasing bindings");
        for entry in entries {
            if !entry.owner.disconnect(entry.id) {
                tracing::warn!(target: targets::BINDING, kind = ?entry.kind, "connection was already released");
            }
        }
    }
}

impl Drop for Bindings {
    fn drop(&mut self) {
        if !self.is_disposed() && !self.entries.get_mut().is_empty() {
            tracing::warn!(target: targets::BINDING, "bindings dropped without dispose; releasing");
            self.dispose();
        }
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindings")
            .field("model", &self.model.as_ref().map(|m| m.position()))
            .field("entries", &self.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

static_assertions::assert_impl_all!(Bindings: Send, Sync);

/// Binds `model[path]` to the widget's value.
///
/// The current value is transferred immediately, and again whenever the model
/// reports a change to `path`, a parent of it, or a child of it. A missing
/// attribute transfers as `null`.
pub fn bind_model_to_widget(
    bindings: &Bindings,
    model: &ModelRef,
    path: &str,
    widget: &WidgetRef,
    options: BindingOptions,
) {
    transfer(model.as_ref(), widget.as_ref(), path, &options);

    let weak_model = Arc::downgrade(model);
    let weak_widget = Arc::downgrade(widget);
    let bound_path = path.to_string();
    let id = model.property_changed().connect(move |changed: &String| {
        if !path_affects(changed, &bound_path) {
            return;
        }
        if let (Some(model), Some(widget)) = (weak_model.upgrade(), weak_widget.upgrade()) {
            transfer(model.as_ref(), widget.as_ref(), &bound_path, &options);
        }
    });
    bindings.add_binding(model.property_changed().clone(), id);
}

fn transfer(model: &dyn GridModel, widget: &dyn CellWidget, path: &str, options: &BindingOptions) {
    let value = model.value(path).unwrap_or(Value::Null);
    widget.set_value(options.convert(value));
}

/// Binds the widget's value back into `model[path]`.
///
/// Only user-driven changes are transferred; there is no initial transfer.
/// Write failures are logged and otherwise ignored.
pub fn bind_widget_to_model(
    bindings: &Bindings,
    widget: &WidgetRef,
    model: &ModelRef,
    path: &str,
    options: BindingOptions,
) {
    let weak_model = Arc::downgrade(model);
    let bound_path = path.to_string();
    let id = widget.value_changed().connect(move |value: &Value| {
        let Some(model) = weak_model.upgrade() else {
            return;
        };
        if let Err(err) = model.set_value(&bound_path, options.convert(value.clone())) {
            tracing::warn!(
                target: targets::BINDING,
                position = %model.position(),
                path = %bound_path,
                error = %err,
                "failed to write widget value to model"
            );
        }
    });
    bindings.add_binding(widget.value_changed().clone(), id);
}
