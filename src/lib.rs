//! Cacheside - Cache orchestration layer
//!
//! Sits between a service's business operations and its backing data store,
//! coordinating a volatile TTL/TTI-bound cache with the authoritative store
//! under concurrent traffic. Supported strategies are cache-aside reads and
//! write-through writes; write-behind is deliberately out of scope.
//!
//! ## Architecture
//!
//! - `key` - Deterministic composite key construction
//! - `policy` - Per-cache-name TTL/TTI/codec policies with a default
//! - `store` - Backend contract plus a bundled in-process store (Moka)
//! - `manager` - Cache-aside / write-through orchestration, single-flight
//! - `group` - Named cache sets evicted together on mutation
//! - `config` - Construction-time settings
//!
//! The manager only ever reaches the authoritative store through two narrow
//! contracts supplied per call: a *loader* (produce a fresh value for a key)
//! and a *writer* (persist a mutation and return the canonical result).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cacheside::{CacheManager, CachePolicy, CacheSettings, MemoryStore};
//!
//! # #[derive(serde::Serialize, serde::Deserialize)]
//! # struct Item { id: u64 }
//! # async fn demo() -> Result<(), cacheside::CacheError> {
//! let settings = CacheSettings::default()
//!     .with_cache("itemCache", CachePolicy::individual())
//!     .with_cache("itemAllCache", CachePolicy::collection());
//! let manager = CacheManager::new(Arc::new(MemoryStore::default()), settings)?;
//!
//! let item = manager
//!     .get_or_load("itemCache", &[41i64.into()], || async {
//!         // fetch from the authoritative store
//!         Ok(Some(Item { id: 41 }))
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod group;
mod key;
mod manager;
mod policy;
mod store;

pub use config::{CacheSettings, FailurePolicy};
pub use error::CacheError;
pub use group::InvalidationGroup;
pub use key::{CacheKeyBuilder, KeyComponent};
pub use manager::CacheManager;
pub use policy::{CachePolicy, PolicyRegistry, SerializationFormat};
pub use store::{CacheStore, MemoryStore};
