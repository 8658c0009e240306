use cached::{Cached, UnboundCache};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Mutex;

pub const COORDS_KEY: &str = "coords";
pub const RAMADAN_DATE_KEY: &str = "ramadanDate";
pub const HIJRI_YEAR_KEY: &str = "hijriYear";

/// String key/value storage that lives exactly as long as one session.
/// Values of the providers are stored as JSON text.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

/// Session store backed by process memory; gone when the process ends
pub struct MemorySession {
    entries: Mutex<UnboundCache<String, String>>,
}

impl MemorySession {
    pub fn new() -> Self {
        MemorySession { entries: Mutex::new(UnboundCache::new()) }
    }
}
impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().ok()?;
        entries.cache_get(&key.to_string()).cloned()
    }

    fn set(&self, key: &str, value: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.cache_set(key.to_string(), value);
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.cache_remove(&key.to_string());
        }
    }
}

/// Reads a JSON value, treating malformed entries like missing ones.
pub fn load<T: DeserializeOwned>(store: &dyn SessionStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring malformed session entry '{}': {}", key, e);
            store.remove(key);
            None
        }
    }
}

pub fn save<T: Serialize>(store: &dyn SessionStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => store.set(key, raw),
        Err(e) => log::warn!("Could not store session entry '{}': {}", key, e),
    }
}
