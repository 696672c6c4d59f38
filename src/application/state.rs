use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

type StateValue = Arc<dyn Any + Send + Sync>;

/// Key-value extension state attached to an [`Application`](super::Application)
///
/// Values are stored behind `Arc` and looked up by key and type. Cloning an
/// `AppState` clones the handle, not the storage.
///
/// # Example
/// ```
/// use pyramidion::application::AppState;
///
/// let state = AppState::new();
/// state.insert("greeting", String::from("hello"));
///
/// assert_eq!(state.get::<String>("greeting").as_deref(), Some(&"hello".to_string()));
/// assert!(state.get::<u32>("greeting").is_none());
/// ```
#[derive(Clone, Default)]
pub struct AppState {
    values: Arc<DashMap<String, StateValue>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any previous entry
    pub fn insert<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        self.insert_arc(key, Arc::new(value));
    }

    /// Store an already shared value under `key`
    pub fn insert_arc<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: Arc<T>) {
        self.values.insert(key.into(), value);
    }

    /// Look up `key` as a `T`. Returns `None` if missing or of another type.
    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<T>> {
        let entry = self.values.get(key)?;
        Arc::clone(entry.value()).downcast::<T>().ok()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Remove `key`, returning whether it was present
    pub fn remove(&self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether both handles point at the same storage
    pub fn ptr_eq(&self, other: &AppState) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.values.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        f.debug_struct("AppState").field("keys", &keys).finish()
    }
}
