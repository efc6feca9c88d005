//! Key/value backend abstraction
//!
//! The store persists each collection as one string value under a fixed key.
//! Backends only need whole-value get/set/remove; they never see records.

use std::collections::HashMap;
use std::sync::Mutex;

use super::error::{StorageError, StorageResult};

/// Persistent key/value substrate used by the store
///
/// Implementations must make `set` atomic per key: a reader either sees the
/// old value or the new one, never a partial write.
pub trait Backend: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace the value stored under `key`
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`; removing a missing key succeeds
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Short backend name for status output
    fn name(&self) -> &'static str;
}

/// In-process backend
///
/// Optionally enforces a hard byte limit over all stored keys and values,
/// rejecting any write that would push the total past it.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
    limit: Option<u64>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend that rejects writes beyond `limit` bytes
    pub fn with_limit(limit: u64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            limit: Some(limit),
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries();

        if let Some(limit) = self.limit {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let required = (others + key.len() + value.len()) as u64;
            if required > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    required,
                    limit,
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries().remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Memory backend whose reads can be made to fail per key
#[cfg(test)]
pub(crate) struct FlakyBackend {
    inner: MemoryBackend,
    failing: std::sync::Arc<Mutex<Vec<String>>>,
}

#[cfg(test)]
impl FlakyBackend {
    /// Returns the backend and a handle listing the keys whose reads fail
    pub(crate) fn new() -> (Self, std::sync::Arc<Mutex<Vec<String>>>) {
        let failing = std::sync::Arc::new(Mutex::new(Vec::new()));
        let backend = Self {
            inner: MemoryBackend::new(),
            failing: std::sync::Arc::clone(&failing),
        };
        (backend, failing)
    }
}

#[cfg(test)]
impl Backend for FlakyBackend {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let failing = self
            .failing
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if failing.iter().any(|k| k == key) {
            return Err(StorageError::ReadError {
                path: key.into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "injected read failure"),
            });
        }
        drop(failing);
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.inner.remove(key)
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}
