//! Cache orchestration.
//!
//! [`CacheManager`] sits between a service's business operations and its
//! backing data store. It never talks to the authoritative store itself;
//! reads go through a caller-supplied loader and writes through a
//! caller-supplied writer, while the manager handles key derivation, policy
//! resolution, encoding, expiry renewal, stampede control and eviction.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{CacheSettings, FailurePolicy};
use crate::error::CacheError;
use crate::group::InvalidationGroup;
use crate::key::{CacheKeyBuilder, KeyComponent};
use crate::policy::{CachePolicy, PolicyRegistry};
use crate::store::CacheStore;

/// Orchestrates cache-aside reads and write-through writes over a
/// [`CacheStore`].
///
/// Construct one at the composition root and share it by [`Arc`]; there is
/// no ambient global instance.
///
/// Values are stored as an encoded `Option<V>`: `Some` for real values,
/// `None` as the "cached miss" tombstone written when a policy allows null
/// caching.
pub struct CacheManager {
    store: Arc<dyn CacheStore>,
    policies: PolicyRegistry,
    read_failure: FailurePolicy,
    write_failure: FailurePolicy,
    /// Per-key gates for single-flight loads. A gate exists only while a
    /// load is in flight (or waiters still hold it).
    inflight: DashMap<String, Arc<Mutex<()>>>,
}

impl CacheManager {
    /// Create a manager over the given store with the given settings.
    ///
    /// Fails if any configured policy is invalid (e.g. a zero TTL).
    pub fn new(store: Arc<dyn CacheStore>, settings: CacheSettings) -> Result<Self, CacheError> {
        let policies =
            PolicyRegistry::new(settings.default_policy(), settings.per_cache_overrides)?;
        info!(
            overrides = policies.override_names().count(),
            "Cache manager initialized"
        );
        Ok(Self {
            store,
            policies,
            read_failure: settings.read_failure,
            write_failure: settings.write_failure,
            inflight: DashMap::new(),
        })
    }

    /// Cache-aside read.
    ///
    /// Checks the cache first; on a hit the value is decoded and, under a
    /// TTI policy, its expiry refreshed. On a miss the loader produces a
    /// fresh value, which is cached with the policy TTL unless it is absent
    /// and the policy forbids null caching. `Ok(None)` means the loader
    /// reported "not found".
    ///
    /// At most one load per key is in flight per process; concurrent callers
    /// for the same key wait on the in-flight load and then re-check the
    /// cache. Cross-process stampedes are not eliminated.
    ///
    /// The loader must be idempotent and side-effect-free from the cache's
    /// perspective; it is invoked zero or one time per call.
    pub async fn get_or_load<V, L, Fut>(
        &self,
        cache_name: &str,
        components: &[KeyComponent],
        loader: L,
    ) -> Result<Option<V>, CacheError>
    where
        V: Serialize + DeserializeOwned,
        L: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Option<V>>>,
    {
        let key = CacheKeyBuilder::build(cache_name, components)?;
        let policy = self.policies.resolve(cache_name);

        if let Some(hit) = self.try_read(cache_name, &key, policy).await? {
            return Ok(hit);
        }

        // Miss. Take the per-key gate so only one load runs at a time.
        let gate = self
            .inflight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = gate.lock().await;

        let result = self.load_and_fill(cache_name, &key, policy, loader).await;

        drop(guard);
        // Drop the gate once no other caller holds it (map + our clone).
        self.inflight
            .remove_if(&key, |_, g| Arc::strong_count(g) <= 2);

        result
    }

    /// Write-through write with caller-known key components (the update
    /// path).
    ///
    /// The writer persists the mutation against the authoritative store
    /// first; only on success is the cache set, with the writer's canonical
    /// result. On writer failure the cache is left untouched and the error
    /// propagates. The entry is never set speculatively.
    pub async fn put_through<V, W, Fut>(
        &self,
        cache_name: &str,
        components: &[KeyComponent],
        value: V,
        writer: W,
    ) -> Result<V, CacheError>
    where
        V: Serialize,
        W: FnOnce(V) -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        // Key problems are fatal before the mutation runs.
        let key = CacheKeyBuilder::build(cache_name, components)?;
        let canonical = writer(value).await.map_err(CacheError::Writer)?;
        self.fill_after_write(cache_name, &key, &canonical).await?;
        Ok(canonical)
    }

    /// Write-through write whose key components derive from the writer's
    /// canonical result (the create path: server-assigned identifiers flow
    /// into the cache key).
    ///
    /// If key derivation fails, the mutation has already been persisted;
    /// the error only means the result was not cached.
    pub async fn put_through_keyed<V, W, Fut, K>(
        &self,
        cache_name: &str,
        value: V,
        writer: W,
        key_fn: K,
    ) -> Result<V, CacheError>
    where
        V: Serialize,
        W: FnOnce(V) -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
        K: FnOnce(&V) -> Vec<KeyComponent>,
    {
        let canonical = writer(value).await.map_err(CacheError::Writer)?;
        let key = CacheKeyBuilder::build(cache_name, &key_fn(&canonical))?;
        self.fill_after_write(cache_name, &key, &canonical).await?;
        Ok(canonical)
    }

    /// Delete one specific key.
    pub async fn evict(
        &self,
        cache_name: &str,
        components: &[KeyComponent],
    ) -> Result<(), CacheError> {
        let key = CacheKeyBuilder::build(cache_name, components)?;
        debug!(cache = cache_name, key, "Evicting entry");
        match self.store.delete(&key).await {
            Ok(()) => Ok(()),
            Err(err) => self.on_write_failure("delete", cache_name, err),
        }
    }

    /// Delete every entry under a cache name, regardless of which components
    /// were used to build its keys.
    pub async fn evict_all(&self, cache_name: &str) -> Result<(), CacheError> {
        let prefix = CacheKeyBuilder::prefix(cache_name)?;
        debug!(cache = cache_name, "Evicting all entries");
        match self.store.delete_by_prefix(&prefix).await {
            Ok(()) => Ok(()),
            Err(err) => self.on_write_failure("delete_by_prefix", cache_name, err),
        }
    }

    /// Evict every member cache of an invalidation group.
    ///
    /// Best-effort: every member is attempted even when one fails; the first
    /// failure (if the write path is fail-closed) is returned afterwards.
    pub async fn evict_group(&self, group: &InvalidationGroup) -> Result<(), CacheError> {
        debug!(group = group.name(), members = group.len(), "Evicting group");
        let mut first_err = None;
        for cache_name in group.members() {
            if let Err(err) = self.evict_all(cache_name).await {
                warn!(
                    group = group.name(),
                    cache = cache_name,
                    error = %err,
                    "Group eviction member failed"
                );
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Check the store for `key`. `Ok(Some(hit))` is a cache hit (the inner
    /// option distinguishes a real value from a tombstone); `Ok(None)` is a
    /// miss, which a decode failure or a fail-open backend error also
    /// becomes.
    async fn try_read<V: DeserializeOwned>(
        &self,
        cache_name: &str,
        key: &str,
        policy: &CachePolicy,
    ) -> Result<Option<Option<V>>, CacheError> {
        let bytes = match self.store.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(cache = cache_name, key, "Cache miss");
                return Ok(None);
            }
            Err(err) => {
                if self.read_failure == FailurePolicy::FailClosed {
                    return Err(err);
                }
                warn!(
                    cache = cache_name,
                    key,
                    error = %err,
                    "Backend unavailable on read, failing open to loader"
                );
                return Ok(None);
            }
        };

        match policy.codec.decode::<Option<V>>(&bytes) {
            Ok(value) => {
                debug!(cache = cache_name, key, "Cache hit");
                if policy.tti_enabled {
                    if let Err(err) = self.store.refresh(key, policy.ttl).await {
                        if self.read_failure == FailurePolicy::FailClosed {
                            return Err(err);
                        }
                        warn!(cache = cache_name, key, error = %err, "Expiry refresh failed");
                    }
                }
                Ok(Some(value))
            }
            Err(err) => {
                // Corrupt entry: drop it and treat the read as a miss.
                warn!(
                    cache = cache_name,
                    key,
                    error = %err,
                    "Dropping undecodable cache entry"
                );
                if let Err(err) = self.store.delete(key).await {
                    warn!(cache = cache_name, key, error = %err, "Failed to drop corrupt entry");
                }
                Ok(None)
            }
        }
    }

    /// Holding the per-key gate: re-check the store, then run the loader and
    /// populate the cache with its result.
    async fn load_and_fill<V, L, Fut>(
        &self,
        cache_name: &str,
        key: &str,
        policy: &CachePolicy,
        loader: L,
    ) -> Result<Option<V>, CacheError>
    where
        V: Serialize + DeserializeOwned,
        L: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Option<V>>>,
    {
        // A concurrent leader may have filled the entry while we waited.
        if let Some(hit) = self.try_read(cache_name, key, policy).await? {
            return Ok(hit);
        }

        let loaded = loader().await.map_err(CacheError::Loader)?;

        if loaded.is_none() && !policy.cache_nulls {
            debug!(cache = cache_name, key, "Loader reported absent, not cached");
            return Ok(None);
        }

        let bytes = match policy.codec.encode(&loaded) {
            Ok(bytes) => bytes,
            Err(err) => {
                // Skip caching but still hand the caller the loaded value.
                warn!(cache = cache_name, key, error = %err, "Encode failed, skipping cache");
                return Ok(loaded);
            }
        };

        if let Err(err) = self.store.set(key, bytes, policy.ttl).await {
            if self.read_failure == FailurePolicy::FailClosed {
                return Err(err);
            }
            warn!(cache = cache_name, key, error = %err, "Backend unavailable, load not cached");
        } else {
            debug!(cache = cache_name, key, "Loaded value cached");
        }

        Ok(loaded)
    }

    /// Cache the canonical result of a successful write.
    async fn fill_after_write<V: Serialize>(
        &self,
        cache_name: &str,
        key: &str,
        canonical: &V,
    ) -> Result<(), CacheError> {
        let policy = self.policies.resolve(cache_name);
        let bytes = match policy.codec.encode(&Some(canonical)) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(cache = cache_name, key, error = %err, "Encode failed, skipping cache");
                return Ok(());
            }
        };
        match self.store.set(key, bytes, policy.ttl).await {
            Ok(()) => {
                debug!(cache = cache_name, key, "Write-through entry cached");
                Ok(())
            }
            Err(err) => self.on_write_failure("set", cache_name, err),
        }
    }

    fn on_write_failure(
        &self,
        op: &'static str,
        cache_name: &str,
        err: CacheError,
    ) -> Result<(), CacheError> {
        if self.write_failure == FailurePolicy::FailClosed {
            return Err(err);
        }
        warn!(op, cache = cache_name, error = %err, "Backend unavailable on write, failing open");
        Ok(())
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("read_failure", &self.read_failure)
            .field("write_failure", &self.write_failure)
            .field("inflight", &self.inflight.len())
            .finish()
    }
}
