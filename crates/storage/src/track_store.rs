//! Track supply for tile rendering.
//!
//! [`TrackSource`] is the contract the renderer needs from whatever stores
//! activities: "give me every track whose bounding box touches these
//! bounds and matches these filters". [`InMemoryTrackStore`] implements it
//! over a vector of records whose boxes are computed once at ingestion.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use heatmap_common::{HeatmapError, HeatmapResult, MercatorBounds, TrackFilters};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// An encoded track and its precomputed Web Mercator bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub polyline: String,
    pub bbox: Option<MercatorBounds>,
}

/// A stored track with the attributes filters look at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackRecord {
    pub id: u64,
    pub activity_type: Option<String>,
    pub start_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub track: Track,
}

/// Ingestion payload, also the element type of a seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTrack {
    pub polyline: String,
    #[serde(default)]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

/// Source of candidate tracks for a tile.
#[async_trait]
pub trait TrackSource: Send + Sync {
    /// Tracks whose bbox intersects `bounds` (edges inclusive) and that
    /// pass `filters`.
    async fn find_tracks(
        &self,
        bounds: &MercatorBounds,
        filters: &TrackFilters,
    ) -> HeatmapResult<Vec<Track>>;
}

/// Tracks held in memory.
pub struct InMemoryTrackStore {
    records: RwLock<Vec<TrackRecord>>,
    next_id: AtomicU64,
}

impl InMemoryTrackStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Validate and store a track, computing its bounding box.
    ///
    /// A polyline that does not decode is rejected. One that decodes but
    /// has no projectable point is stored without a box and will never be
    /// returned by [`TrackSource::find_tracks`].
    pub async fn insert(&self, new: NewTrack) -> HeatmapResult<TrackRecord> {
        let points = polyline::decode(&new.polyline)
            .map_err(|e| HeatmapError::MalformedPolyline(e.to_string()))?;
        let bbox = projection::bbox_of_points(&points);

        let record = TrackRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            activity_type: new.activity_type.filter(|t| !t.is_empty()),
            start_date: new.start_date,
            track: Track {
                polyline: new.polyline,
                bbox,
            },
        };

        if bbox.is_none() {
            warn!(id = record.id, points = points.len(), "Track has no projectable points");
        } else {
            debug!(id = record.id, points = points.len(), "Track stored");
        }

        self.records.write().await.push(record.clone());
        Ok(record)
    }

    /// Load a JSON array of [`NewTrack`] from disk.
    ///
    /// Entries that fail validation are logged and skipped; returns how many
    /// were stored.
    pub async fn load_json_file(&self, path: impl AsRef<Path>) -> HeatmapResult<usize> {
        let path = path.as_ref();
        let contents = tokio::fs::read(path).await?;
        let tracks: Vec<NewTrack> = serde_json::from_slice(&contents)?;
        let total = tracks.len();

        let mut loaded = 0;
        for (index, track) in tracks.into_iter().enumerate() {
            match self.insert(track).await {
                Ok(_) => loaded += 1,
                Err(e) => warn!(index, error = %e, "Skipping invalid track in seed file"),
            }
        }

        info!(path = %path.display(), loaded, total, "Loaded tracks");
        Ok(loaded)
    }

    pub async fn get(&self, id: u64) -> Option<TrackRecord> {
        self.records.read().await.iter().find(|r| r.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for InMemoryTrackStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrackSource for InMemoryTrackStore {
    async fn find_tracks(
        &self,
        bounds: &MercatorBounds,
        filters: &TrackFilters,
    ) -> HeatmapResult<Vec<Track>> {
        let records = self.records.read().await;

        Ok(records
            .iter()
            .filter(|r| r.track.bbox.is_some_and(|b| b.intersects(bounds)))
            .filter(|r| filters.matches(r.activity_type.as_deref(), r.start_date))
            .map(|r| r.track.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_track(polyline: &str) -> NewTrack {
        NewTrack {
            polyline: polyline.to_string(),
            activity_type: None,
            start_date: None,
        }
    }

    #[tokio::test]
    async fn test_insert_computes_bbox() {
        let store = InMemoryTrackStore::new();
        let record = store.insert(new_track("_p~iF~ps|U_ulLnnqC_mqNvxq`@")).await.unwrap();

        assert_eq!(record.id, 1);
        assert_eq!(record.track.bbox, projection::bbox_of("_p~iF~ps|U_ulLnnqC_mqNvxq`@"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_malformed_polyline() {
        let store = InMemoryTrackStore::new();
        let err = store.insert(new_track("_p~iF")).await.unwrap_err();

        assert!(matches!(err, HeatmapError::MalformedPolyline(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_empty_track_is_stored_but_never_found() {
        let store = InMemoryTrackStore::new();
        let record = store.insert(new_track("")).await.unwrap();
        assert!(record.track.bbox.is_none());

        let everything = MercatorBounds::new(f64::MIN, f64::MIN, f64::MAX, f64::MAX);
        let found = store
            .find_tracks(&everything, &TrackFilters::default())
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_ids_increase() {
        let store = InMemoryTrackStore::new();
        let a = store.insert(new_track("??")).await.unwrap();
        let b = store.insert(new_track("??")).await.unwrap();
        assert!(b.id > a.id);
        assert_eq!(store.get(b.id).await.unwrap().id, b.id);
        assert!(store.get(999).await.is_none());
    }
}
