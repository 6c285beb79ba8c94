//! Local persistence and the remote points ledger
//!
//! Features:
//! - `LocalStore`: integer values under fixed keys (LocalStorage on web)
//! - `ledger`: wallet-keyed cumulative points, best-effort and async
//!
//! Every failure here degrades to a default; callers log and carry on.

pub mod ledger;

use std::collections::HashMap;

pub use ledger::{LedgerEntry, LedgerError, MemoryLedger, PointsLedger};

#[cfg(target_arch = "wasm32")]
pub use ledger::{BrowserLedger, HttpLedger, WebLedger};

/// Failures writing to a local store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Local storage is not available")]
    Unavailable,
    #[error("Failed to write key {key}: {reason}")]
    WriteFailed { key: String, reason: String },
}

/// Integer key/value persistence
///
/// Absent and unreadable values both read as `None`.
pub trait LocalStore {
    fn get(&self, key: &str) -> Option<u64>;
    fn set(&mut self, key: &str, value: u64) -> Result<(), StoreError>;
}

/// In-memory store for tests and native runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one value
    pub fn with_value(key: &str, value: u64) -> Self {
        let mut store = Self::new();
        store.values.insert(key.to_string(), value);
        store
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Option<u64> {
        self.values.get(key).copied()
    }

    fn set(&mut self, key: &str, value: u64) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Parse a stored decimal value, tolerating whitespace
pub fn parse_stored_integer(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok()
}

/// Browser LocalStorage, values kept as decimal strings
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct WebStorage;

#[cfg(target_arch = "wasm32")]
impl WebStorage {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }

    /// Raw string read, shared with the other LocalStorage-backed stores
    pub(crate) fn get_raw(key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok()?
    }

    pub(crate) fn set_raw(key: &str, value: &str) -> Result<(), StoreError> {
        let storage = Self::storage().ok_or(StoreError::Unavailable)?;
        storage
            .set_item(key, value)
            .map_err(|e| StoreError::WriteFailed {
                key: key.to_string(),
                reason: format!("{:?}", e),
            })
    }
}

#[cfg(target_arch = "wasm32")]
impl LocalStore for WebStorage {
    fn get(&self, key: &str) -> Option<u64> {
        Self::get_raw(key).as_deref().and_then(parse_stored_integer)
    }

    fn set(&mut self, key: &str, value: u64) -> Result<(), StoreError> {
        Self::set_raw(key, &value.to_string())
    }
}
