//! Key/value map owned by a single scope.
//!
//! # Design
//! - `TaskContext` is a handle; clones observe the same underlying map.
//! - Pinned entries cannot be overwritten or removed for the life of the map.
//! - Only causal descendants of one scope ever hold a handle, so the lock is
//!   uncontended in practice.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{ContextError, ContextResult};

/// Mutable key/value context bound to one logical task.
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    inner: Arc<Mutex<ContextMap>>,
}

#[derive(Debug, Default)]
struct ContextMap {
    entries: HashMap<String, String>,
    pinned: HashSet<String>,
}

impl TaskContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context holding a single, unpinned entry.
    #[must_use]
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let context = Self::new();
        context.lock().entries.insert(key.into(), value.into());
        context
    }

    /// Create a context whose single entry is pinned from the start.
    #[must_use]
    pub fn pinned(key: impl Into<String>, value: impl Into<String>) -> Self {
        let context = Self::new();
        {
            let key = key.into();
            let mut map = context.lock();
            map.entries.insert(key.clone(), value.into());
            map.pinned.insert(key);
        }
        context
    }

    /// Read the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().entries.get(key).cloned()
    }

    /// Store `value` under `key`, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::PinnedKey`] if `key` was pinned.
    pub fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> ContextResult<Option<String>> {
        let key = key.into();
        let mut map = self.lock();
        if map.pinned.contains(&key) {
            return Err(ContextError::PinnedKey { key });
        }
        Ok(map.entries.insert(key, value.into()))
    }

    /// Store `value` under `key` and freeze it for the life of the context.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::PinnedKey`] if `key` is already pinned.
    pub fn pin(&self, key: impl Into<String>, value: impl Into<String>) -> ContextResult<()> {
        let key = key.into();
        let mut map = self.lock();
        if map.pinned.contains(&key) {
            return Err(ContextError::PinnedKey { key });
        }
        map.entries.insert(key.clone(), value.into());
        map.pinned.insert(key);
        Ok(())
    }

    /// Remove the entry stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::PinnedKey`] if `key` was pinned.
    pub fn remove(&self, key: &str) -> ContextResult<Option<String>> {
        let mut map = self.lock();
        if map.pinned.contains(key) {
            return Err(ContextError::PinnedKey {
                key: key.to_string(),
            });
        }
        Ok(map.entries.remove(key))
    }

    /// Whether an entry exists under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Whether `key` was pinned.
    #[must_use]
    pub fn is_pinned(&self, key: &str) -> bool {
        self.lock().pinned.contains(key)
    }

    /// Number of entries in the context.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the context holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Whether both handles point at the same context instance.
    #[must_use]
    pub fn same_context(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn lock(&self) -> MutexGuard<'_, ContextMap> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_entries() -> ContextResult<()> {
        let context = TaskContext::new();
        let handle = context.clone();
        handle.set("tenant", "acme")?;

        assert_eq!(context.get("tenant").as_deref(), Some("acme"));
        assert!(context.same_context(&handle));
        assert!(!context.same_context(&TaskContext::new()));
        Ok(())
    }

    #[test]
    fn set_returns_previous_value() -> ContextResult<()> {
        let context = TaskContext::with_entry("attempt", "1");
        assert_eq!(context.set("attempt", "2")?.as_deref(), Some("1"));
        assert_eq!(context.get("attempt").as_deref(), Some("2"));
        assert_eq!(context.len(), 1);
        Ok(())
    }

    #[test]
    fn pinned_entries_reject_writes_and_removal() -> ContextResult<()> {
        let context = TaskContext::new();
        context.pin("correlationId", "abc")?;

        assert!(context.is_pinned("correlationId"));
        assert_eq!(
            context.set("correlationId", "other"),
            Err(ContextError::PinnedKey {
                key: "correlationId".to_string()
            })
        );
        assert!(context.remove("correlationId").is_err());
        assert!(context.pin("correlationId", "again").is_err());
        assert_eq!(context.get("correlationId").as_deref(), Some("abc"));
        Ok(())
    }

    #[test]
    fn pinned_constructor_freezes_entry() {
        let context = TaskContext::pinned("correlationId", "fixed");
        assert!(context.is_pinned("correlationId"));
        assert!(context.set("correlationId", "moved").is_err());
        assert!(context.set("other", "fine").is_ok());
        assert_eq!(context.len(), 2);
    }

    #[test]
    fn remove_clears_unpinned_entries() -> ContextResult<()> {
        let context = TaskContext::with_entry("scratch", "value");
        assert_eq!(context.remove("scratch")?.as_deref(), Some("value"));
        assert!(context.is_empty());
        assert!(!context.contains("scratch"));
        assert_eq!(context.remove("scratch")?, None);
        Ok(())
    }
}
