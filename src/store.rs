//! Host storage collaborators.
//!
//! The host platform owns persistence: a durable key-value option table and a
//! bounded-lifetime cache ("transients"). The clients only ever talk to these
//! two traits, so a host integration adapts its own facilities and the test
//! suite substitutes the in-memory implementations below.
//!
//! Keys are already namespaced by product slug when they reach a store, so
//! concurrent instances for different products never collide.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Durable key-value storage (survives process restarts).
pub trait OptionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn delete(&self, key: &str);
}

/// Key-value cache with a bounded lifetime per entry.
///
/// An entry past its lifetime is treated as absent; `get` must never return
/// expired data.
pub trait TransientStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str, lifetime: Duration);
    fn delete(&self, key: &str);
}

// === In-Memory Implementations ===

/// Process-local option store, for tests and standalone use.
#[derive(Debug, Default)]
pub struct MemoryOptionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryOptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptionStore for MemoryOptionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn delete(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}

/// Process-local transient store with a controllable clock.
///
/// `advance` shifts the store's notion of "now" forward, which lets expiry
/// behavior be asserted without sleeping through real lifetimes.
#[derive(Debug)]
pub struct MemoryTransientStore {
    entries: Mutex<HashMap<String, (String, DateTime<Utc>)>>,
    skew: Mutex<Duration>,
}

impl Default for MemoryTransientStore {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            skew: Mutex::new(Duration::zero()),
        }
    }
}

impl MemoryTransientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift the store's clock forward.
    pub fn advance(&self, by: Duration) {
        let mut skew = self.skew.lock().unwrap();
        *skew += by;
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now() + *self.skew.lock().unwrap()
    }
}

impl TransientStore for MemoryTransientStore {
    fn get(&self, key: &str) -> Option<String> {
        let now = self.now();
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > now => Some(value.clone()),
            Some(_) => {
                // Expired entries are dropped on read.
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, value: &str, lifetime: Duration) {
        let expires_at = self.now() + lifetime;
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), expires_at));
    }

    fn delete(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}
