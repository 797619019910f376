//! In-process cache store backed by Moka.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::sync::Cache;
use tracing::debug;

use super::CacheStore;
use crate::error::CacheError;

/// One stored entry: the encoded value plus the TTL it was written with.
///
/// The TTL rides along with the bytes so the per-entry expiry policy can
/// read it back; cloning is cheap because the bytes are shared.
#[derive(Clone)]
struct StoredValue {
    bytes: Arc<[u8]>,
    ttl: Duration,
}

/// Expiry policy that honors the TTL carried by each entry.
///
/// Reads never extend an entry's life here; TTI renewal is an explicit
/// `refresh` decided by the manager's policy, not by the store.
struct PerEntryTtl;

impl Expiry<String, StoredValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Bundled in-process [`CacheStore`].
///
/// Thread-safe and clone-friendly (clones share the same underlying cache).
/// Operations cannot actually lose contact with the backend, but they still
/// go through the fallible contract so callers exercise the same paths as
/// with a remote store.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Cache<String, StoredValue>,
}

impl MemoryStore {
    /// Create a store bounded to `max_capacity` entries.
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .support_invalidation_closures()
            .build();
        Self { inner }
    }

    /// Number of live entries.
    ///
    /// Note: may lag behind concurrent operations.
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.inner.get(key).map(|v| v.bytes.to_vec()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        self.inner
            .insert(key.to_string(), StoredValue { bytes: value.into(), ttl });
        Ok(())
    }

    async fn refresh(&self, key: &str, ttl: Duration) -> Result<(), CacheError> {
        // Re-inserting the same bytes runs the entry through the update
        // expiry, which picks up the new TTL.
        if let Some(existing) = self.inner.get(key) {
            self.inner
                .insert(key.to_string(), StoredValue { bytes: existing.bytes, ttl });
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.inner.invalidate(key);
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<(), CacheError> {
        debug!(prefix, "Invalidating entries by prefix");
        let prefix = prefix.to_string();
        self.inner
            .invalidate_entries_if(move |key, _| key.starts_with(&prefix))
            .map_err(CacheError::backend)?;
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}
