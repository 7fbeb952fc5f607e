//! Shared widget state.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lattice_grid_core::{Property, Signal};
use parking_lot::Mutex;
use serde_json::Value;

/// Out-of-band data attached to a widget under a string key.
pub type UserData = Arc<dyn Any + Send + Sync>;

/// State common to every cell widget.
///
/// Concrete widgets embed a `WidgetBase` and expose it through
/// [`CellWidget::widget_base`](super::CellWidget::widget_base); the trait's
/// default methods are implemented on top of it.
pub struct WidgetBase {
    type_name: &'static str,
    value: Property<Value>,
    value_changed: Arc<Signal<Value>>,
    enabled: Property<bool>,
    read_only: Property<bool>,
    appearance: Property<Option<String>>,
    user_data: Mutex<HashMap<String, UserData>>,
    disposed: AtomicBool,
}

impl WidgetBase {
    /// Creates the base for a widget of type `T`.
    pub fn new<T: ?Sized + 'static>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            value: Property::new(Value::Null),
            value_changed: Arc::new(Signal::new()),
            enabled: Property::new(true),
            read_only: Property::new(false),
            appearance: Property::new(None),
            user_data: Mutex::new(HashMap::new()),
            disposed: AtomicBool::new(false),
        }
    }

    /// Returns the concrete widget's type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the current value.
    pub fn value(&self) -> Value {
        self.value.get()
    }

    /// Sets the value, emitting `value_changed` if it changed.
    pub fn set_value(&self, value: Value) -> bool {
        if self.value.set(value.clone()) {
            self.value_changed.emit(value);
            true
        } else {
            false
        }
    }

    /// Signal emitted with the new value on every change.
    pub fn value_changed(&self) -> &Arc<Signal<Value>> {
        &self.value_changed
    }

    /// Returns whether the widget accepts interaction.
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Sets the enabled state.
    pub fn set_enabled(&self, enabled: bool) -> bool {
        self.enabled.set(enabled)
    }

    /// Returns the stored read-only flag.
    pub fn is_read_only(&self) -> bool {
        self.read_only.get()
    }

    /// Sets the stored read-only flag.
    pub fn set_read_only(&self, read_only: bool) -> bool {
        self.read_only.set(read_only)
    }

    /// Returns the appearance token.
    pub fn appearance(&self) -> Option<String> {
        self.appearance.get()
    }

    /// Sets the appearance token.
    pub fn set_appearance(&self, appearance: Option<String>) -> bool {
        self.appearance.set(appearance)
    }

    /// Returns the user data stored under `key`.
    pub fn user_data(&self, key: &str) -> Option<UserData> {
        self.user_data.lock().get(key).cloned()
    }

    /// Stores (`Some`) or clears (`None`) the user data under `key`.
    pub fn set_user_data(&self, key: &str, data: Option<UserData>) {
        let mut user_data = self.user_data.lock();
        match data {
            Some(data) => {
                user_data.insert(key.to_string(), data);
            }
            None => {
                user_data.remove(key);
            }
        }
    }

    /// Marks the widget disposed, dropping its user data and value observers.
    ///
    /// Returns `false` if it was already disposed.
    pub fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return false;
        }
        let user_data = std::mem::take(&mut *self.user_data.lock());
        drop(user_data);
        self.value_changed.disconnect_all();
        true
    }

    /// Returns `true` once [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for WidgetBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetBase")
            .field("type_name", &self.type_name)
            .field("value", &self.value.get())
            .field("enabled", &self.is_enabled())
            .field("read_only", &self.is_read_only())
            .field("appearance", &self.appearance())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(WidgetBase: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    struct Dummy;

    #[test]
    fn test_value_change_notifies_once() {
        let base = WidgetBase::new::<Dummy>();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        base.value_changed().connect(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(base.set_value(json!("a")));
        assert!(!base.set_value(json!("a")));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(base.type_name().ends_with("Dummy"));
    }

    #[test]
    fn test_user_data_slots() {
        let base = WidgetBase::new::<Dummy>();
        base.set_user_data("k", Some(Arc::new(7_u32)));
        let data = base.user_data("k").unwrap();
        assert_eq!(data.downcast_ref::<u32>(), Some(&7));

        base.set_user_data("k", None);
        assert!(base.user_data("k").is_none());
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let base = WidgetBase::new::<Dummy>();
        base.set_user_data("k", Some(Arc::new(())));
        base.value_changed().connect(|_| {});

        assert!(base.dispose());
        assert!(!base.dispose());
        assert!(base.is_disposed());
        assert!(base.user_data("k").is_none());
        assert_eq!(base.value_changed().connection_count(), 0);
    }
}
