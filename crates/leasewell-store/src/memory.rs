//! In-memory [`KeyValueStore`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use leasewell_core::kv::KeyValueStore;

/// String-keyed map behind a mutex. Used both as the "persisted" store
/// (tests can clone it across a simulated restart) and as the transient
/// store (tests drop it to simulate a restart).
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().expect("kv store poisoned").get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.inner
            .lock()
            .expect("kv store poisoned")
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.inner.lock().expect("kv store poisoned").remove(key);
    }

    fn clear(&self) {
        self.inner.lock().expect("kv store poisoned").clear();
    }
}
