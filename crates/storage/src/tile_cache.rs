//! In-memory cache for rendered heatmap tiles.
//!
//! ## Eviction
//!
//! There is no LRU bookkeeping. When an insert would push the total size
//! past the configured limit, the whole map is dropped first and the new
//! tile becomes the only entry. Tiles are cheap to re-render and this keeps
//! the hot path to a single hash lookup.
//!
//! ## Metrics
//!
//! - `size_bytes`: Current memory usage
//! - `entry_count`: Number of cached tiles
//! - `hits`/`misses`: Cache hit rate
//! - `overflow_clears`: Number of times an insert emptied the cache
//! - `entries_evicted`: Entries dropped by overflow clears
//! - `oversize_rejected`: Tiles larger than the whole cache, never stored

use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Default limit, 100 MiB.
pub const DEFAULT_CACHE_MB: usize = 100;

/// Map and byte count, always updated together under one lock.
#[derive(Default)]
struct CacheState {
    entries: HashMap<String, Bytes>,
    total_size: u64,
}

/// In-memory tile cache with whole-map eviction.
pub struct TileMemoryCache {
    state: RwLock<CacheState>,
    max_bytes: u64,
    stats: Arc<TileMemoryCacheStats>,
}

/// Statistics for the tile memory cache.
///
/// All fields are atomic for lock-free reads from metrics endpoints.
#[derive(Default)]
pub struct TileMemoryCacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub inserts: AtomicU64,
    pub overflow_clears: AtomicU64,
    pub entries_evicted: AtomicU64,
    pub oversize_rejected: AtomicU64,
    pub admin_clears: AtomicU64,
    pub size_bytes: AtomicU64,
    pub entry_count: AtomicU64,
}

/// Point-in-time copy of [`TileMemoryCacheStats`].
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub inserts: u64,
    pub overflow_clears: u64,
    pub entries_evicted: u64,
    pub oversize_rejected: u64,
    pub admin_clears: u64,
    pub size_bytes: u64,
    pub entry_count: u64,
    pub max_bytes: u64,
    pub utilization: f64,
}

impl TileMemoryCacheStats {
    /// Calculate cache hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

impl TileMemoryCache {
    /// Create a cache holding at most `max_size_mb` mebibytes of tiles.
    pub fn new(max_size_mb: usize) -> Self {
        Self::with_max_bytes((max_size_mb as u64) * 1024 * 1024)
    }

    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self {
            state: RwLock::new(CacheState::default()),
            max_bytes,
            stats: Arc::new(TileMemoryCacheStats::default()),
        }
    }

    /// Get a tile, counting the hit or miss.
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        let state = self.state.read().await;

        match state.entries.get(key) {
            Some(data) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(data.clone())
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a tile.
    ///
    /// If the insert would exceed the limit, every existing entry is dropped
    /// first. The size check, the clear and the insert happen under one
    /// write guard. Returns `false` when the tile alone is larger than the
    /// cache and was not stored.
    pub async fn put(&self, key: impl Into<String>, data: Bytes) -> bool {
        let key = key.into();
        let tile_size = data.len() as u64;

        if tile_size > self.max_bytes {
            self.stats.oversize_rejected.fetch_add(1, Ordering::Relaxed);
            warn!(
                key = %key,
                tile_bytes = tile_size,
                max_bytes = self.max_bytes,
                "Tile larger than cache capacity, not caching"
            );
            return false;
        }

        let mut state = self.state.write().await;

        let replaced = state.entries.get(&key).map_or(0, |old| old.len() as u64);
        if state.total_size - replaced + tile_size > self.max_bytes {
            let evicted = state.entries.len() as u64;
            let freed = state.total_size;
            state.entries.clear();
            state.total_size = 0;

            self.stats.overflow_clears.fetch_add(1, Ordering::Relaxed);
            self.stats.entries_evicted.fetch_add(evicted, Ordering::Relaxed);

            info!(
                entries_evicted = evicted,
                bytes_freed_mb = format!("{:.2}", freed as f64 / (1024.0 * 1024.0)),
                max_size_mb = format!("{:.2}", self.max_bytes as f64 / (1024.0 * 1024.0)),
                "Tile cache full, cleared"
            );
        }

        let old = state.entries.insert(key, data);
        if let Some(old) = old {
            state.total_size -= old.len() as u64;
        }
        state.total_size += tile_size;

        self.stats.inserts.fetch_add(1, Ordering::Relaxed);
        self.publish_size(&state);
        true
    }

    /// Drop every entry. Counters other than size and entry count survive.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        let evicted = state.entries.len();
        state.entries.clear();
        state.total_size = 0;

        self.stats.admin_clears.fetch_add(1, Ordering::Relaxed);
        self.publish_size(&state);

        info!(entries_cleared = evicted, "Tile cache cleared");
    }

    fn publish_size(&self, state: &CacheState) {
        self.stats.size_bytes.store(state.total_size, Ordering::Relaxed);
        self.stats
            .entry_count
            .store(state.entries.len() as u64, Ordering::Relaxed);
    }

    /// Shared handle to the live counters.
    pub fn stats(&self) -> Arc<TileMemoryCacheStats> {
        Arc::clone(&self.stats)
    }

    pub fn snapshot(&self) -> CacheStatsSnapshot {
        let s = &self.stats;
        CacheStatsSnapshot {
            hits: s.hits.load(Ordering::Relaxed),
            misses: s.misses.load(Ordering::Relaxed),
            hit_rate: s.hit_rate(),
            inserts: s.inserts.load(Ordering::Relaxed),
            overflow_clears: s.overflow_clears.load(Ordering::Relaxed),
            entries_evicted: s.entries_evicted.load(Ordering::Relaxed),
            oversize_rejected: s.oversize_rejected.load(Ordering::Relaxed),
            admin_clears: s.admin_clears.load(Ordering::Relaxed),
            size_bytes: s.size_bytes.load(Ordering::Relaxed),
            entry_count: s.entry_count.load(Ordering::Relaxed),
            max_bytes: self.max_bytes,
            utilization: self.utilization(),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.state.read().await.entries.contains_key(key)
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Get current cache size in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.stats.size_bytes.load(Ordering::Relaxed)
    }

    /// Get current cache utilization ratio (0.0 - 1.0).
    pub fn utilization(&self) -> f64 {
        if self.max_bytes == 0 {
            0.0
        } else {
            self.size_bytes() as f64 / self.max_bytes as f64
        }
    }
}

impl Default for TileMemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_MB)
    }
}
