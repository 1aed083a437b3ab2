//! Integration tests for the in-memory track store.

use chrono::NaiveDate;
use heatmap_common::{TileCoord, TrackFilters};
use polyline::LngLat;
use projection::tile_bounds;
use storage::{InMemoryTrackStore, NewTrack, TrackSource};
use std::io::Write;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn sf_track(activity_type: &str, start: &str) -> NewTrack {
    NewTrack {
        polyline: polyline::encode(&[LngLat::new(-122.40, 37.75), LngLat::new(-122.29, 37.76)]),
        activity_type: Some(activity_type.to_string()),
        start_date: Some(date(start)),
    }
}

async fn seeded_store() -> InMemoryTrackStore {
    let store = InMemoryTrackStore::new();
    store.insert(sf_track("Run", "2024-01-05")).await.unwrap();
    store.insert(sf_track("Ride", "2024-02-10")).await.unwrap();
    store.insert(sf_track("Run", "2024-03-15")).await.unwrap();
    store
}

// ============================================================================
// Spatial pre-filter
// ============================================================================

#[tokio::test]
async fn test_finds_tracks_in_both_neighbouring_tiles() {
    let store = seeded_store().await;
    let filters = TrackFilters::default();

    for x in [163, 164] {
        let bounds = tile_bounds(&TileCoord::new(10, x, 395));
        assert_eq!(store.find_tracks(&bounds, &filters).await.unwrap().len(), 3);
    }
}

#[tokio::test]
async fn test_far_tile_finds_nothing() {
    let store = seeded_store().await;
    let bounds = tile_bounds(&TileCoord::new(10, 0, 0));
    let found = store
        .find_tracks(&bounds, &TrackFilters::default())
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_expanded_bounds_pick_up_nearby_tracks() {
    let store = InMemoryTrackStore::new();
    // Just east of tile 162's eastern edge, inside tile 163.
    store
        .insert(NewTrack {
            polyline: polyline::encode(&[LngLat::new(-122.69, 37.75)]),
            activity_type: None,
            start_date: None,
        })
        .await
        .unwrap();

    let bounds = tile_bounds(&TileCoord::new(10, 162, 395));
    let filters = TrackFilters::default();
    assert!(store.find_tracks(&bounds, &filters).await.unwrap().is_empty());
    assert_eq!(
        store.find_tracks(&bounds.expand(0.1), &filters).await.unwrap().len(),
        1
    );
}

// ============================================================================
// Attribute filters
// ============================================================================

#[tokio::test]
async fn test_activity_type_filter() {
    let store = seeded_store().await;
    let bounds = tile_bounds(&TileCoord::new(10, 163, 395));

    let runs = TrackFilters::parse(Some("Run"), None, None).unwrap();
    assert_eq!(store.find_tracks(&bounds, &runs).await.unwrap().len(), 2);

    let swims = TrackFilters::parse(Some("Swim"), None, None).unwrap();
    assert!(store.find_tracks(&bounds, &swims).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_date_range_filter_is_inclusive() {
    let store = seeded_store().await;
    let bounds = tile_bounds(&TileCoord::new(10, 163, 395));

    let feb = TrackFilters::parse(None, Some("2024-02-10"), Some("2024-03-15")).unwrap();
    assert_eq!(store.find_tracks(&bounds, &feb).await.unwrap().len(), 2);

    let early_runs = TrackFilters::parse(Some("Run"), None, Some("2024-02-01")).unwrap();
    assert_eq!(store.find_tracks(&bounds, &early_runs).await.unwrap().len(), 1);
}

// ============================================================================
// Seed file
// ============================================================================

#[tokio::test]
async fn test_load_json_file_skips_bad_entries() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
            {{"polyline": "_p~iF~ps|U_ulLnnqC_mqNvxq`@", "activity_type": "Ride", "start_date": "2024-05-01"}},
            {{"polyline": "_p~iF"}},
            {{"polyline": "??"}}
        ]"#
    )
    .unwrap();

    let store = InMemoryTrackStore::new();
    let loaded = store.load_json_file(file.path()).await.unwrap();

    assert_eq!(loaded, 2);
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn test_load_json_file_reports_bad_json() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();

    let store = InMemoryTrackStore::new();
    assert!(store.load_json_file(file.path()).await.is_err());
    assert!(store.load_json_file("/nonexistent/tracks.json").await.is_err());
}
