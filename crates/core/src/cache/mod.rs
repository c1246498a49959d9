//! In-process caching utilities.

mod ttl_cache;

pub use ttl_cache::TtlCache;
