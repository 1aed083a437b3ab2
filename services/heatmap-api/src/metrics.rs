//! Application metrics collection and reporting.

use metrics::{counter, gauge, histogram};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use storage::CacheStatsSnapshot;
use tokio::sync::RwLock;

/// Metrics collector for the heatmap API.
#[derive(Debug)]
pub struct MetricsCollector {
    /// Request counts
    pub tile_requests: AtomicU64,
    pub invalid_requests: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub empty_tiles: AtomicU64,

    /// Render stats
    pub renders_total: AtomicU64,
    pub render_errors: AtomicU64,
    pub tracks_drawn: AtomicU64,
    pub tracks_undecodable: AtomicU64,

    /// Ingestion
    pub tracks_ingested: AtomicU64,

    /// Timing stats (stored as microseconds)
    render_times: RwLock<TimingStats>,
    track_query_times: RwLock<TimingStats>,
    png_encode_times: RwLock<TimingStats>,

    start_time: Instant,
}

#[derive(Debug, Default)]
struct TimingStats {
    count: u64,
    total_us: u64,
    min_us: u64,
    max_us: u64,
    last_us: u64,
}

impl TimingStats {
    fn record(&mut self, duration_us: u64) {
        self.count += 1;
        self.total_us += duration_us;
        self.last_us = duration_us;
        if self.min_us == 0 || duration_us < self.min_us {
            self.min_us = duration_us;
        }
        if duration_us > self.max_us {
            self.max_us = duration_us;
        }
    }

    fn avg_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.total_us as f64 / self.count as f64) / 1000.0
        }
    }

    fn last_ms(&self) -> f64 {
        self.last_us as f64 / 1000.0
    }

    fn max_ms(&self) -> f64 {
        self.max_us as f64 / 1000.0
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            tile_requests: AtomicU64::new(0),
            invalid_requests: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            empty_tiles: AtomicU64::new(0),
            renders_total: AtomicU64::new(0),
            render_errors: AtomicU64::new(0),
            tracks_drawn: AtomicU64::new(0),
            tracks_undecodable: AtomicU64::new(0),
            tracks_ingested: AtomicU64::new(0),
            render_times: RwLock::new(TimingStats::default()),
            track_query_times: RwLock::new(TimingStats::default()),
            png_encode_times: RwLock::new(TimingStats::default()),
            start_time: Instant::now(),
        }
    }

    pub fn record_tile_request(&self) {
        self.tile_requests.fetch_add(1, Ordering::Relaxed);
        counter!("heatmap_tile_requests_total").increment(1);
    }

    /// Record a request rejected before any lookup
    pub fn record_invalid_request(&self, code: &'static str) {
        self.invalid_requests.fetch_add(1, Ordering::Relaxed);
        counter!("heatmap_invalid_requests_total", "code" => code).increment(1);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        counter!("heatmap_tile_cache_hits_total").increment(1);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
        counter!("heatmap_tile_cache_misses_total").increment(1);
    }

    /// Record a tile served transparent because nothing was drawn
    pub fn record_empty_tile(&self) {
        self.empty_tiles.fetch_add(1, Ordering::Relaxed);
        counter!("heatmap_empty_tiles_total").increment(1);
    }

    /// Record how many candidate tracks were drawn and how many failed to decode
    pub fn record_tracks(&self, candidates: usize, drawn: usize, undecodable: usize) {
        self.tracks_drawn.fetch_add(drawn as u64, Ordering::Relaxed);
        self.tracks_undecodable
            .fetch_add(undecodable as u64, Ordering::Relaxed);
        histogram!("heatmap_tile_candidate_tracks").record(candidates as f64);
        counter!("heatmap_tracks_drawn_total").increment(drawn as u64);
        if undecodable > 0 {
            counter!("heatmap_tracks_undecodable_total").increment(undecodable as u64);
        }
    }

    pub fn record_tracks_ingested(&self, count: u64) {
        self.tracks_ingested.fetch_add(count, Ordering::Relaxed);
        counter!("heatmap_tracks_ingested_total").increment(count);
    }

    /// Record a render operation
    pub async fn record_render(&self, duration_us: u64, success: bool) {
        self.renders_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.render_errors.fetch_add(1, Ordering::Relaxed);
            counter!("heatmap_render_errors_total").increment(1);
        }
        counter!("heatmap_renders_total").increment(1);
        histogram!("heatmap_tile_render_seconds").record(duration_us as f64 / 1_000_000.0);

        self.render_times.write().await.record(duration_us);
    }

    /// Record the time spent asking the track source for candidates
    pub async fn record_track_query(&self, duration_us: u64) {
        histogram!("heatmap_track_query_seconds").record(duration_us as f64 / 1_000_000.0);
        self.track_query_times.write().await.record(duration_us);
    }

    pub async fn record_png_encode(&self, duration_us: u64) {
        histogram!("heatmap_png_encode_seconds").record(duration_us as f64 / 1_000_000.0);
        self.png_encode_times.write().await.record(duration_us);
    }

    /// Publish tile cache statistics as gauges
    pub fn record_tile_cache_stats(&self, stats: &CacheStatsSnapshot) {
        gauge!("heatmap_tile_cache_hit_rate_percent").set(stats.hit_rate);
        gauge!("heatmap_tile_cache_size_bytes").set(stats.size_bytes as f64);
        gauge!("heatmap_tile_cache_entries").set(stats.entry_count as f64);
        gauge!("heatmap_tile_cache_overflow_clears").set(stats.overflow_clears as f64);
        gauge!("heatmap_tile_cache_utilization_percent").set(stats.utilization);
    }

    /// Get current metrics snapshot
    pub async fn snapshot(&self) -> MetricsSnapshot {
        let render_times = self.render_times.read().await;
        let track_query_times = self.track_query_times.read().await;
        let png_encode_times = self.png_encode_times.read().await;

        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            tile_requests: self.tile_requests.load(Ordering::Relaxed),
            invalid_requests: self.invalid_requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            empty_tiles: self.empty_tiles.load(Ordering::Relaxed),
            renders_total: self.renders_total.load(Ordering::Relaxed),
            render_errors: self.render_errors.load(Ordering::Relaxed),
            tracks_drawn: self.tracks_drawn.load(Ordering::Relaxed),
            tracks_undecodable: self.tracks_undecodable.load(Ordering::Relaxed),
            tracks_ingested: self.tracks_ingested.load(Ordering::Relaxed),
            render_avg_ms: render_times.avg_ms(),
            render_last_ms: render_times.last_ms(),
            render_max_ms: render_times.max_ms(),
            track_query_avg_ms: track_query_times.avg_ms(),
            png_encode_avg_ms: png_encode_times.avg_ms(),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable view of [`MetricsCollector`].
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub tile_requests: u64,
    pub invalid_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub empty_tiles: u64,
    pub renders_total: u64,
    pub render_errors: u64,
    pub tracks_drawn: u64,
    pub tracks_undecodable: u64,
    pub tracks_ingested: u64,
    pub render_avg_ms: f64,
    pub render_last_ms: f64,
    pub render_max_ms: f64,
    pub track_query_avg_ms: f64,
    pub png_encode_avg_ms: f64,
}

/// Helper for timing operations
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}
