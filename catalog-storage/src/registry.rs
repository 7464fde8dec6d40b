//! The per-catalog reader/writer lock registry (spec.md §5): `Store` and
//! `Delete` take the write side; HTTP handlers take the read side for the
//! whole duration of copying the response body, so a deletion can never
//! race a streaming response into an empty file.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, catalog: &str) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock().expect("lock registry poisoned");
        locks
            .entry(catalog.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }
}
