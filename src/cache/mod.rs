//! Caching subsystem.
//!
//! - [`RequestKey`]: canonical, order-independent identity of a backend
//!   operation. Shared by the result caches, the in-flight deduplicator and
//!   the throttle.
//!
//! - [`ResultCache`]: bounded last-success cache with optional TTL and
//!   first-in-first-out eviction. The gateway owns one instance per kind of
//!   response (document lists, AI artifacts, search results, suggestions).

pub mod key;
pub mod result;

pub use key::RequestKey;
pub use result::{CacheConfig, CacheEntry, ResultCache};
