//! Per-key observable cache for flat parameter values.
//!
//! Each key has its own subscriber list, so a widget that renders one parameter is only
//! notified when that exact key changes. Entries are created on first `set` or `subscribe`
//! and live as long as the store.

use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::{Rc, Weak},
};

use derive_ex::derive_ex;
use serde::{Deserialize, Serialize};
use slabmap::SlabMap;

use crate::subscription::Subscription;


/// A primitive parameter value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Str(String),
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}
impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}
impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_owned())
    }
}
impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}
impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Number(v) => write!(f, "{v}"),
            ParamValue::Str(v) => write!(f, "{v}"),
        }
    }
}

pub type ParameterStore = ObservableStore<ParamValue>;

type Callback<V> = Rc<dyn Fn(&V)>;

/// Key/value cache with per-key subscriptions.
///
/// Cloning the handle shares the underlying store. All operations are synchronous and
/// callbacks run after the store's internal borrow is released, so a callback may read,
/// `set`, subscribe or unsubscribe freely.
#[derive_ex(Clone, bound())]
pub struct ObservableStore<V: 'static>(Rc<RefCell<StoreData<V>>>);

impl<V: PartialEq + Clone + 'static> ObservableStore<V> {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(StoreData {
            entries: HashMap::new(),
        })))
    }

    /// Returns the current value of `key`, or `None` if it was never set.
    pub fn get(&self, key: &str) -> Option<V> {
        self.0.borrow().entries.get(key)?.value.clone()
    }

    /// Stores `value` under `key` and notifies that key's subscribers.
    ///
    /// Does nothing if the stored value is already equal to `value`. Equality is `PartialEq`,
    /// so setting a `NaN` number notifies every time.
    ///
    /// If a subscriber sets `key` again, the remaining subscribers of this call are skipped;
    /// the nested call has already notified all of them with the newer value.
    pub fn set(&self, key: &str, value: V) {
        let (callbacks, generation) = {
            let mut data = self.0.borrow_mut();
            let entry = data.entry(key);
            if entry.value.as_ref() == Some(&value) {
                return;
            }
            entry.value = Some(value.clone());
            entry.generation += 1;
            (entry.callbacks(), entry.generation)
        };
        log::trace!("`{key}` changed, notifying {} subscriber(s)", callbacks.len());
        for f in callbacks {
            if !self.is_current(key, generation) {
                log::trace!("`{key}` changed again during notification");
                break;
            }
            f(&value);
        }
    }

    fn is_current(&self, key: &str, generation: u64) -> bool {
        self.0
            .borrow()
            .entries
            .get(key)
            .is_some_and(|e| e.generation == generation)
    }

    /// Applies [`set`](Self::set) to every entry, in iteration order.
    pub fn bulk_set<K: AsRef<str>>(&self, values: impl IntoIterator<Item = (K, V)>) {
        for (key, value) in values {
            self.set(key.as_ref(), value);
        }
    }

    /// Registers `f` to be called with the new value whenever `key` changes.
    pub fn subscribe(&self, key: &str, f: impl Fn(&V) + 'static) -> Subscription {
        let id = self.0.borrow_mut().entry(key).subscribers.insert(Rc::new(f));
        let key = key.to_owned();
        Subscription::from_weak_fn(Rc::downgrade(&self.0), move |data| {
            if let Some(entry) = data.borrow_mut().entries.get_mut(&key) {
                entry.subscribers.remove(id);
            }
        })
    }

    pub fn subscriber_count(&self, key: &str) -> usize {
        self.0
            .borrow()
            .entries
            .get(key)
            .map_or(0, |e| e.subscribers.len())
    }

    /// Number of entries, including entries that only have subscribers.
    pub fn len(&self) -> usize {
        self.0.borrow().entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn downgrade(&self) -> WeakObservableStore<V> {
        WeakObservableStore(Rc::downgrade(&self.0))
    }
}

impl<V: PartialEq + Clone + 'static> Default for ObservableStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug + 'static> fmt::Debug for ObservableStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(data) => f
                .debug_map()
                .entries(data.entries.iter().map(|(k, e)| (k, &e.value)))
                .finish(),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}

/// Non-owning handle to an [`ObservableStore`], for use inside its own callbacks.
#[derive_ex(Clone, bound())]
pub struct WeakObservableStore<V: 'static>(Weak<RefCell<StoreData<V>>>);

impl<V: 'static> WeakObservableStore<V> {
    pub fn upgrade(&self) -> Option<ObservableStore<V>> {
        self.0.upgrade().map(ObservableStore)
    }
}

struct StoreData<V: 'static> {
    entries: HashMap<String, Entry<V>>,
}
impl<V: 'static> StoreData<V> {
    fn entry(&mut self, key: &str) -> &mut Entry<V> {
        self.entries
            .entry(key.to_owned())
            .or_insert_with(Entry::new)
    }
}

struct Entry<V: 'static> {
    value: Option<V>,
    generation: u64,
    subscribers: SlabMap<Callback<V>>,
}
impl<V: 'static> Entry<V> {
    fn new() -> Self {
        Self {
            value: None,
            generation: 0,
            subscribers: SlabMap::new(),
        }
    }
    fn callbacks(&self) -> Vec<Callback<V>> {
        self.subscribers.iter().map(|(_, f)| f.clone()).collect()
    }
}
