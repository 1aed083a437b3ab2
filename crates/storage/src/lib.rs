//! Storage for the heatmap tile service.
//!
//! - In-memory cache of rendered tiles
//! - Track supply: the `TrackSource` trait and an in-memory store

pub mod cache_key;
pub mod tile_cache;
pub mod track_store;

pub use cache_key::{CustomGradientKey, TileCacheKey};
pub use tile_cache::{CacheStatsSnapshot, TileMemoryCache, TileMemoryCacheStats, DEFAULT_CACHE_MB};
pub use track_store::{InMemoryTrackStore, NewTrack, Track, TrackRecord, TrackSource};
