//! In-memory storage for fetched feeds.

mod cache;

pub use cache::{
    CacheEntry, CacheSlot, CacheStats, JsonCache, Lookup, TtlCache, DEFAULT_CAPACITY,
    DEFAULT_TTL,
};
