//! Read-through / write-through caching between the HTTP layer and the
//! data-access functions.
//!
//! Every entity collection is addressed by a cache key (entity kind plus
//! scope). Reads inside the freshness window are served from memory;
//! concurrent reads of one key coalesce into a single in-flight fetch.
//! Mutations go to the database first and, only on success, patch every
//! cached list that logically contains the affected row — so other screens
//! sharing a key see the change without a refetch. Parent entities named by
//! the invalidation table are marked stale instead.

mod coalesce;
pub mod freshness;
pub mod key;
pub mod list_cache;
mod records;
pub mod store;

pub use freshness::FreshnessPolicy;
pub use key::{invalidation_targets, CacheKey, EntityKind, Scope};
pub use list_cache::{CacheRecord, ListCache};
pub use store::Store;
