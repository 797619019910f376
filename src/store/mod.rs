//! Backend contract for the cache store.
//!
//! The orchestration layer never talks to a concrete key-value store
//! directly; it goes through [`CacheStore`]. The bundled [`MemoryStore`]
//! serves tests and single-process deployments; an adapter over an external
//! store (e.g. Redis) implements the same trait.

mod memory;

pub use memory::MemoryStore;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;

/// Abstract key-value backend.
///
/// All operations must be safe under concurrent invocation from multiple
/// processes sharing the backend. Any operation may fail with
/// [`CacheError::BackendUnavailable`]; adapters should bound each call with a
/// timeout and report timeouts the same way.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch the bytes stored under `key`, if present and unexpired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Unconditionally overwrite `key` with a fresh absolute expiry.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Reset the expiry of `key` without altering its value. No-op when the
    /// key is absent.
    async fn refresh(&self, key: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Remove one key.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every key starting with `prefix` (a cache name's key prefix).
    async fn delete_by_prefix(&self, prefix: &str) -> Result<(), CacheError>;
}
