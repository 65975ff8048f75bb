//! Namespaced raw key-value store.
//!
//! Backs session/task/proactive-state persistence that does not need the
//! relational query surface of [`crate::Database`]. An in-memory
//! implementation is always available for tests; `SurrealKvStore` persists
//! to disk via embedded SurrealKV.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{StorageError, StorageResult};

fn validate(namespace: &str, key: &str) -> StorageResult<()> {
    if namespace.is_empty() || key.is_empty() {
        return Err(StorageError::InvalidKey(
            "namespace and key must be non-empty".into(),
        ));
    }
    if namespace.contains('\0') || key.contains('\0') {
        return Err(StorageError::InvalidKey(
            "namespace/key must not contain null bytes".into(),
        ));
    }
    Ok(())
}

fn composite(namespace: &str, key: &str) -> String {
    format!("{namespace}\0{key}")
}

/// Namespaced byte-level key-value store.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch a value.
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>>;
    /// Store a value, overwriting any existing entry.
    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()>;
    /// Remove a value.
    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<()>;
    /// List all keys (without namespace prefix) in a namespace.
    async fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>>;
}

/// In-memory [`KvStore`], used by tests and the `unclaude-test` fixtures.
#[derive(Default)]
pub struct MemoryKvStore {
    data: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryKvStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate(namespace, key)?;
        let guard = self
            .data
            .read()
            .map_err(|_| StorageError::Database("kv store lock poisoned".into()))?;
        Ok(guard.get(&composite(namespace, key)).cloned())
    }

    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()> {
        validate(namespace, key)?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| StorageError::Database("kv store lock poisoned".into()))?;
        guard.insert(composite(namespace, key), value);
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<()> {
        validate(namespace, key)?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| StorageError::Database("kv store lock poisoned".into()))?;
        guard.remove(&composite(namespace, key));
        Ok(())
    }

    async fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>> {
        if namespace.is_empty() {
            return Err(StorageError::InvalidKey("namespace must be non-empty".into()));
        }
        let prefix = format!("{namespace}\0");
        let guard = self
            .data
            .read()
            .map_err(|_| StorageError::Database("kv store lock poisoned".into()))?;
        Ok(guard
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix).map(str::to_string))
            .collect())
    }
}

/// Ergonomic wrapper binding a [`KvStore`] to a fixed namespace, with
/// typed JSON convenience methods.
pub struct ScopedKvStore<'a> {
    store: &'a dyn KvStore,
    namespace: String,
}

impl<'a> ScopedKvStore<'a> {
    /// Bind `store` to `namespace`.
    #[must_use]
    pub fn new(store: &'a dyn KvStore, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// Fetch and JSON-decode a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored bytes are not valid JSON for `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.store.get(&self.namespace, key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// JSON-encode and store a value.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` fails to serialize or the underlying
    /// store write fails.
    pub async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> StorageResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.store.set(&self.namespace, key, bytes).await
    }

    /// Remove a key.
    ///
    /// # Errors
    ///
    /// Propagates the underlying store's delete error.
    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        self.store.delete(&self.namespace, key).await
    }

    /// List keys under this namespace.
    ///
    /// # Errors
    ///
    /// Propagates the underlying store's list error.
    pub async fn list_keys(&self) -> StorageResult<Vec<String>> {
        self.store.list_keys(&self.namespace).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = MemoryKvStore::new();
        store.set("ns", "k", b"v".to_vec()).await.unwrap();
        assert_eq!(store.get("ns", "k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let store = MemoryKvStore::new();
        store.set("ns", "k", b"v".to_vec()).await.unwrap();
        store.delete("ns", "k").await.unwrap();
        assert_eq!(store.get("ns", "k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_keys_is_namespace_scoped() {
        let store = MemoryKvStore::new();
        store.set("a", "one", b"1".to_vec()).await.unwrap();
        store.set("a", "two", b"2".to_vec()).await.unwrap();
        store.set("b", "three", b"3".to_vec()).await.unwrap();
        let mut keys = store.list_keys("a").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["one".to_string(), "two".to_string()]);
    }

    #[tokio::test]
    async fn scoped_json_round_trips() {
        let store = MemoryKvStore::new();
        let scoped = ScopedKvStore::new(&store, "proactive");
        scoped.set_json("last_run", &42u64).await.unwrap();
        let value: Option<u64> = scoped.get_json("last_run").await.unwrap();
        assert_eq!(value, Some(42));
    }
}
