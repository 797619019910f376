//! Error taxonomy for the orchestration layer.

use thiserror::Error;

/// Errors surfaced by cache operations.
///
/// Loader and writer failures are always propagated verbatim; backend
/// failures may be swallowed on the read path depending on the configured
/// [`FailurePolicy`](crate::FailurePolicy).
#[derive(Debug, Error)]
pub enum CacheError {
    /// A cache name or key component contained the key delimiter, or was
    /// otherwise unusable. Fatal to the call, never retried.
    #[error("invalid key component: {0}")]
    InvalidKeyComponent(String),

    /// The backing key-value store could not be reached or rejected the
    /// operation. Transient.
    #[error("cache backend unavailable: {0}")]
    BackendUnavailable(#[source] anyhow::Error),

    /// A value could not be encoded for caching or decoded from a cached
    /// entry. The manager handles this internally (decode failures become
    /// misses, encode failures skip caching); it only escapes through the
    /// codec API itself.
    #[error("serialization failed: {0}")]
    Serialization(#[source] anyhow::Error),

    /// The caller-supplied loader failed. Nothing was cached.
    #[error("loader failed: {0}")]
    Loader(#[source] anyhow::Error),

    /// The caller-supplied writer failed. The cache was left untouched.
    #[error("writer failed: {0}")]
    Writer(#[source] anyhow::Error),
}

impl CacheError {
    /// Wrap a backend client error.
    pub fn backend(err: impl Into<anyhow::Error>) -> Self {
        Self::BackendUnavailable(err.into())
    }
}
