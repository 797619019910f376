//! Deterministic cache key construction.
//!
//! Keys take the form `"{cacheName}::{c1},{c2},...,{cn}"`. Component order is
//! semantically significant: it must match the loader's parameter order, and
//! two keys with the same components in a different order are distinct keys.

use std::fmt;

use crate::error::CacheError;

/// Separator between the cache name and the component list.
pub const NAME_DELIMITER: &str = "::";

/// Separator between individual key components.
pub const COMPONENT_DELIMITER: char = ',';

/// A single scalar component of a cache key.
///
/// Rendering is canonical and locale-independent: integers in plain decimal,
/// strings verbatim, booleans as `true`/`false`. Identical inputs therefore
/// produce identical keys across process restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyComponent {
    Str(String),
    Int(i64),
    UInt(u64),
    Bool(bool),
}

impl fmt::Display for KeyComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for KeyComponent {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for KeyComponent {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for KeyComponent {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for KeyComponent {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u64> for KeyComponent {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<u32> for KeyComponent {
    fn from(value: u32) -> Self {
        Self::UInt(value.into())
    }
}

impl From<bool> for KeyComponent {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Builds cache key strings from a cache name and ordered scalar components.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Build the key `"{cacheName}::{c1},{c2},...,{cn}"`.
    ///
    /// Fails with [`CacheError::InvalidKeyComponent`] if the cache name is
    /// empty or contains the name delimiter, or if any string component
    /// contains either delimiter unescaped.
    pub fn build(cache_name: &str, components: &[KeyComponent]) -> Result<String, CacheError> {
        Self::validate_name(cache_name)?;

        let mut key = String::with_capacity(cache_name.len() + 2 + components.len() * 8);
        key.push_str(cache_name);
        key.push_str(NAME_DELIMITER);

        for (i, component) in components.iter().enumerate() {
            if let KeyComponent::Str(s) = component {
                if s.contains(COMPONENT_DELIMITER) || s.contains(NAME_DELIMITER) {
                    return Err(CacheError::InvalidKeyComponent(format!(
                        "string component {s:?} contains a key delimiter"
                    )));
                }
            }
            if i > 0 {
                key.push(COMPONENT_DELIMITER);
            }
            key.push_str(&component.to_string());
        }

        Ok(key)
    }

    /// The prefix shared by every key under `cache_name`, used for
    /// evict-all-entries operations.
    pub fn prefix(cache_name: &str) -> Result<String, CacheError> {
        Self::validate_name(cache_name)?;
        Ok(format!("{cache_name}{NAME_DELIMITER}"))
    }

    fn validate_name(cache_name: &str) -> Result<(), CacheError> {
        if cache_name.is_empty() {
            return Err(CacheError::InvalidKeyComponent(
                "cache name must not be empty".to_string(),
            ));
        }
        if cache_name.contains(NAME_DELIMITER) {
            return Err(CacheError::InvalidKeyComponent(format!(
                "cache name {cache_name:?} contains the name delimiter"
            )));
        }
        Ok(())
    }
}
