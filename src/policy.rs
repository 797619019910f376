//! Per-cache policies and the policy registry.
//!
//! A [`CachePolicy`] describes how entries under one cache name behave: how
//! long they live, whether access renews them, whether "not found" results
//! are cached, and which codec serializes values. Policies are resolved by
//! cache name through a [`PolicyRegistry`] built once at startup.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CacheError;

/// Wire codec for cached values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerializationFormat {
    /// Human-readable JSON via serde_json.
    #[default]
    Json,
    /// Compact binary via bincode.
    Bincode,
}

impl SerializationFormat {
    /// Encode a value for storage.
    pub fn encode<V: Serialize>(&self, value: &V) -> Result<Vec<u8>, CacheError> {
        match self {
            Self::Json => {
                serde_json::to_vec(value).map_err(|e| CacheError::Serialization(e.into()))
            }
            Self::Bincode => {
                bincode::serialize(value).map_err(|e| CacheError::Serialization(e.into()))
            }
        }
    }

    /// Decode a stored value.
    pub fn decode<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<V, CacheError> {
        match self {
            Self::Json => {
                serde_json::from_slice(bytes).map_err(|e| CacheError::Serialization(e.into()))
            }
            Self::Bincode => {
                bincode::deserialize(bytes).map_err(|e| CacheError::Serialization(e.into()))
            }
        }
    }
}

/// Behavior of entries under one cache name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// Expiry applied on every write.
    ///
    /// Under `tti_enabled` this is reinterpreted as an idle timeout: every
    /// successful read resets it.
    pub ttl: Duration,

    /// Renew the entry's expiry on every successful read (time-to-idle).
    pub tti_enabled: bool,

    /// Cache a tombstone when the loader reports "not found".
    pub cache_nulls: bool,

    /// Codec for values under this cache name.
    pub codec: SerializationFormat,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(120),
            tti_enabled: false,
            cache_nulls: false,
            codec: SerializationFormat::Json,
        }
    }
}

impl CachePolicy {
    /// Set the TTL (builder pattern).
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Enable or disable TTI renewal on read.
    #[must_use]
    pub fn tti_enabled(mut self, enabled: bool) -> Self {
        self.tti_enabled = enabled;
        self
    }

    /// Allow caching "not found" tombstones.
    #[must_use]
    pub fn cache_nulls(mut self, enabled: bool) -> Self {
        self.cache_nulls = enabled;
        self
    }

    /// Set the value codec.
    #[must_use]
    pub fn codec(mut self, codec: SerializationFormat) -> Self {
        self.codec = codec;
        self
    }

    /// Profile for collection-level caches (e.g. "read all" results).
    /// Longer fixed TTL, not renewed by access.
    pub fn collection() -> Self {
        Self {
            ttl: Duration::from_secs(120),
            tti_enabled: false,
            cache_nulls: false,
            codec: SerializationFormat::Json,
        }
    }

    /// Profile for individual-entity caches.
    /// Short TTL renewed on every read, compact codec.
    pub fn individual() -> Self {
        Self {
            ttl: Duration::from_secs(20),
            tti_enabled: true,
            cache_nulls: false,
            codec: SerializationFormat::Bincode,
        }
    }
}

/// Resolves cache names to policies, falling back to a default.
///
/// Built once at startup and immutable afterwards. Unknown cache names
/// resolve to the default policy rather than failing.
#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    default: CachePolicy,
    overrides: HashMap<String, CachePolicy>,
}

impl PolicyRegistry {
    /// Build a registry from a default policy and per-cache overrides.
    ///
    /// Fails if any policy (default or override) carries a zero TTL.
    pub fn new(
        default: CachePolicy,
        overrides: HashMap<String, CachePolicy>,
    ) -> Result<Self, CacheError> {
        Self::validate("<default>", &default)?;
        for (name, policy) in &overrides {
            Self::validate(name, policy)?;
        }
        Ok(Self { default, overrides })
    }

    /// Resolve the policy for a cache name.
    pub fn resolve(&self, cache_name: &str) -> &CachePolicy {
        self.overrides.get(cache_name).unwrap_or(&self.default)
    }

    /// Names with an explicit override registered.
    pub fn override_names(&self) -> impl Iterator<Item = &str> {
        self.overrides.keys().map(String::as_str)
    }

    fn validate(name: &str, policy: &CachePolicy) -> Result<(), CacheError> {
        if policy.ttl.is_zero() {
            return Err(CacheError::InvalidKeyComponent(format!(
                "policy for {name:?} has a zero TTL"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_falls_back_to_default() {
        let mut overrides = HashMap::new();
        overrides.insert("itemCache".to_string(), CachePolicy::individual());
        let registry = PolicyRegistry::new(CachePolicy::collection(), overrides).unwrap();

        assert!(registry.resolve("itemCache").tti_enabled);
        // Unknown names never fail.
        let fallback = registry.resolve("somethingElse");
        assert_eq!(fallback, &CachePolicy::collection());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let bad = CachePolicy::default().ttl(Duration::ZERO);
        assert!(PolicyRegistry::new(bad, HashMap::new()).is_err());

        let mut overrides = HashMap::new();
        overrides.insert("x".to_string(), CachePolicy::default().ttl(Duration::ZERO));
        assert!(PolicyRegistry::new(CachePolicy::default(), overrides).is_err());
    }

    #[test]
    fn test_profiles_match_domain_defaults() {
        let collection = CachePolicy::collection();
        assert_eq!(collection.ttl, Duration::from_secs(120));
        assert!(!collection.tti_enabled);

        let individual = CachePolicy::individual();
        assert_eq!(individual.ttl, Duration::from_secs(20));
        assert!(individual.tti_enabled);
        assert_eq!(individual.codec, SerializationFormat::Bincode);
    }

    #[test]
    fn test_codec_round_trip() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Item {
            id: u64,
            name: String,
        }

        let item = Item { id: 41, name: "keyboard".to_string() };
        for codec in [SerializationFormat::Json, SerializationFormat::Bincode] {
            let bytes = codec.encode(&item).unwrap();
            let back: Item = codec.decode(&bytes).unwrap();
            assert_eq!(back, item);
        }
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = SerializationFormat::Json.decode::<u64>(b"not json").unwrap_err();
        assert!(matches!(err, CacheError::Serialization(_)));
    }
}
