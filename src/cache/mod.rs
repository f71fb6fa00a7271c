//! In-memory TTL cache.
//!
//! A generic key/value store where every entry carries an absolute
//! expiration instant. Expired entries are hidden from reads immediately and
//! physically removed by a periodic sweep (see [`crate::infra::sweeper`]).
//!
//! ```toml
//! [cache]
//! ttl_seconds = 3600
//! sweep_interval_seconds = 300
//! ```

mod config;
mod lock;
mod store;

pub use config::CacheConfig;
pub use store::TtlCache;

pub(crate) use lock::{rw_read, rw_write};

pub const METRIC_CACHE_HIT: &str = "folio_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "folio_cache_miss_total";
pub const METRIC_CACHE_SWEPT: &str = "folio_cache_swept_total";
