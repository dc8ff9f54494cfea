//! Per-bucket persistence of the last focused object key.
//!
//! Storage is best-effort: if the backing file cannot be read or written,
//! navigation still works, just without cross-visit focus memory. No
//! operation here ever surfaces an error.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

pub trait FocusStore: Send {
    fn get(&self, bucket: &str) -> Option<String>;
    fn set(&self, bucket: &str, key: &str);
    fn remove(&self, bucket: &str);
}

fn bucket_entry(bucket: &str) -> String {
    format!("lastFocusedObject:{}", bucket)
}

/// JSON-file backed store, one flat map for all buckets.
pub struct FileFocusStore {
    path: PathBuf,
}

impl FileFocusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> HashMap<String, String> {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return HashMap::new();
        };
        serde_json::from_str(&raw).unwrap_or_default()
    }

    fn save(&self, map: &HashMap<String, String>) {
        let Ok(raw) = serde_json::to_string_pretty(map) else {
            return;
        };
        if let Err(e) = std::fs::write(&self.path, raw) {
            log::debug!("focus store write failed: {}", e);
        }
    }
}

impl FocusStore for FileFocusStore {
    fn get(&self, bucket: &str) -> Option<String> {
        self.load().get(&bucket_entry(bucket)).cloned()
    }

    fn set(&self, bucket: &str, key: &str) {
        let mut map = self.load();
        map.insert(bucket_entry(bucket), key.to_string());
        self.save(&map);
    }

    fn remove(&self, bucket: &str) {
        let mut map = self.load();
        if map.remove(&bucket_entry(bucket)).is_some() {
            self.save(&map);
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryFocusStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryFocusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FocusStore for MemoryFocusStore {
    fn get(&self, bucket: &str) -> Option<String> {
        self.map
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&bucket_entry(bucket))
            .cloned()
    }

    fn set(&self, bucket: &str, key: &str) {
        self.map
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(bucket_entry(bucket), key.to_string());
    }

    fn remove(&self, bucket: &str) {
        self.map
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&bucket_entry(bucket));
    }
}
