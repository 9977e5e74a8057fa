//! localStorage backend for the session store.

use gloo::console;
use gloo::storage::{LocalStorage, Storage};

use crate::core::session::StorageBackend;

/// Browser localStorage backend; write failures are logged, not propagated,
/// since a full or blocked store must not break the login flow itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserStorage;

impl StorageBackend for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        LocalStorage::get::<String>(key).ok()
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Err(err) = LocalStorage::set(key, value) {
            console::error!("storage write failed", key.to_string(), err.to_string());
        }
    }

    fn remove(&mut self, key: &str) {
        LocalStorage::delete(key);
    }
}
