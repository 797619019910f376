//! Construction-time configuration for the cache manager.
//!
//! A [`CacheSettings`] value is built by the composition root and handed to
//! [`CacheManager::new`](crate::CacheManager::new); nothing here is read from
//! the environment or mutated after startup.

use std::collections::HashMap;
use std::time::Duration;

use crate::policy::{CachePolicy, SerializationFormat};

/// How the manager reacts when the backend fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Swallow the backend error, log it, and proceed without the cache.
    FailOpen,
    /// Propagate the backend error to the caller.
    FailClosed,
}

/// Static configuration for a [`CacheManager`](crate::CacheManager).
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// TTL applied when no per-cache override exists.
    pub default_ttl: Duration,

    /// Whether unconfigured caches renew expiry on read.
    pub default_tti_enabled: bool,

    /// Whether unconfigured caches store "not found" tombstones.
    pub default_cache_nulls: bool,

    /// Codec for unconfigured caches.
    pub default_codec: SerializationFormat,

    /// Per-cache policy overrides, keyed by cache name.
    pub per_cache_overrides: HashMap<String, CachePolicy>,

    /// Reaction to backend failure on the read path (get, refresh,
    /// set-after-load).
    pub read_failure: FailurePolicy,

    /// Reaction to backend failure on the write path (set-after-write,
    /// evictions).
    pub write_failure: FailurePolicy,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(120),
            default_tti_enabled: false,
            default_cache_nulls: false,
            default_codec: SerializationFormat::Json,
            per_cache_overrides: HashMap::new(),
            // A cache outage degrades read latency, never read correctness;
            // writes surface the outage so callers know the cache may be stale.
            read_failure: FailurePolicy::FailOpen,
            write_failure: FailurePolicy::FailClosed,
        }
    }
}

impl CacheSettings {
    /// Set the default TTL (builder pattern).
    #[must_use]
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Enable TTI renewal for unconfigured caches.
    #[must_use]
    pub fn default_tti_enabled(mut self, enabled: bool) -> Self {
        self.default_tti_enabled = enabled;
        self
    }

    /// Allow tombstones for unconfigured caches.
    #[must_use]
    pub fn default_cache_nulls(mut self, enabled: bool) -> Self {
        self.default_cache_nulls = enabled;
        self
    }

    /// Set the codec for unconfigured caches.
    #[must_use]
    pub fn default_codec(mut self, codec: SerializationFormat) -> Self {
        self.default_codec = codec;
        self
    }

    /// Register a policy override for one cache name.
    #[must_use]
    pub fn with_cache(mut self, cache_name: impl Into<String>, policy: CachePolicy) -> Self {
        self.per_cache_overrides.insert(cache_name.into(), policy);
        self
    }

    /// Set the read-path failure policy.
    #[must_use]
    pub fn read_failure(mut self, policy: FailurePolicy) -> Self {
        self.read_failure = policy;
        self
    }

    /// Set the write-path failure policy.
    #[must_use]
    pub fn write_failure(mut self, policy: FailurePolicy) -> Self {
        self.write_failure = policy;
        self
    }

    /// The policy applied to cache names without an override.
    pub fn default_policy(&self) -> CachePolicy {
        CachePolicy {
            ttl: self.default_ttl,
            tti_enabled: self.default_tti_enabled,
            cache_nulls: self.default_cache_nulls,
            codec: self.default_codec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fail_open_reads_fail_closed_writes() {
        let settings = CacheSettings::default();
        assert_eq!(settings.read_failure, FailurePolicy::FailOpen);
        assert_eq!(settings.write_failure, FailurePolicy::FailClosed);
        assert!(!settings.default_cache_nulls);
    }

    #[test]
    fn test_builder_chain() {
        let settings = CacheSettings::default()
            .default_ttl(Duration::from_secs(60))
            .default_tti_enabled(true)
            .with_cache("itemCache", CachePolicy::individual())
            .write_failure(FailurePolicy::FailOpen);

        assert_eq!(settings.default_policy().ttl, Duration::from_secs(60));
        assert!(settings.default_policy().tti_enabled);
        assert!(settings.per_cache_overrides.contains_key("itemCache"));
        assert_eq!(settings.write_failure, FailurePolicy::FailOpen);
    }
}
