use bucket_scout::listing::{
    fetch_all_objects, FetchOptions, ListingError, ListingRequest, MAX_CLIENT_OBJECTS,
};
use bucket_scout::remote::{MemoryStore, ObjectItem, StoreError};
use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use tokio_test::assert_ok;

fn object(key: &str, bytes: u64) -> ObjectItem {
    ObjectItem {
        key: key.to_string(),
        original_bytes: bytes,
        stored_bytes: bytes / 2,
        compressed: true,
        modified: Utc.with_ymd_and_hms(2025, 5, 20, 8, 0, 0).unwrap(),
    }
}

fn flat_objects(count: usize) -> Vec<ObjectItem> {
    (0..count).map(|i| object(&format!("k{:05}", i), 100)).collect()
}

#[tokio::test]
async fn two_pages_accumulate_with_cumulative_progress() {
    let store = MemoryStore::new().with_bucket("b", flat_objects(1_000));
    let request = ListingRequest::new("b", "");

    let mut progress = Vec::new();
    let mut on_progress = |loaded: usize| progress.push(loaded);
    let cache = fetch_all_objects(
        &store,
        &request,
        FetchOptions {
            on_progress: Some(&mut on_progress),
            ..FetchOptions::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(cache.total_objects, 1_000);
    assert!(!cache.limited);
    assert_eq!(progress, vec![500, 1_000]);
}

#[tokio::test]
async fn client_ceiling_caps_the_dataset_and_flags_limited() {
    let store = MemoryStore::new().with_bucket("b", flat_objects(MAX_CLIENT_OBJECTS + 500));
    let request = ListingRequest::new("b", "");

    let cache = fetch_all_objects(&store, &request, FetchOptions::default())
        .await
        .unwrap();

    assert_eq!(cache.total_objects, MAX_CLIENT_OBJECTS);
    assert!(cache.limited);

    // The dataset is the first N keys in server order, never a sample.
    assert_eq!(cache.objects[0].key, "k00000");
    assert_eq!(
        cache.objects[MAX_CLIENT_OBJECTS - 1].key,
        format!("k{:05}", MAX_CLIENT_OBJECTS - 1)
    );

    // No page beyond the ceiling was requested: 15,500 keys at 500 per page
    // would be 31 pages, but the walk stops once page 30 fills the cap.
    assert_eq!(store.requests().len(), 30);
}

#[tokio::test]
async fn server_truncation_propagates_into_limited() {
    let store = MemoryStore::new()
        .with_bucket("b", flat_objects(800))
        .with_truncation(600);
    let request = ListingRequest::new("b", "");

    let cache =
        assert_ok!(fetch_all_objects(&store, &request, FetchOptions::default()).await);
    assert_eq!(cache.total_objects, 600);
    assert!(cache.limited);
}

#[tokio::test]
async fn derived_fields_agree_with_their_sources_after_fetch() {
    let modified = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
    let store = MemoryStore::new().with_bucket(
        "b",
        vec![ObjectItem {
            key: "Reports/Q4 Summary.PDF".to_string(),
            original_bytes: 9,
            stored_bytes: 3,
            compressed: true,
            modified,
        }],
    );

    let cache = fetch_all_objects(
        &store,
        &ListingRequest::new("b", "Reports/"),
        FetchOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(cache.total_objects, 1);
    for item in &cache.objects {
        assert_eq!(item.key_lower(), item.key.to_lowercase());
        assert_eq!(item.modified_ms(), item.modified.timestamp_millis());
    }
    assert_eq!(cache.objects[0].modified_ms(), modified.timestamp_millis());
}

#[tokio::test]
async fn preview_stage_feeds_the_callback_without_touching_the_result() {
    let store = MemoryStore::new().with_bucket("b", flat_objects(150));
    let request = ListingRequest::new("b", "");

    let mut previews = Vec::new();
    let mut on_preview = |cache: bucket_scout::listing::DirectoryCache| previews.push(cache);
    let cache = fetch_all_objects(
        &store,
        &request,
        FetchOptions {
            on_preview: Some(&mut on_preview),
            ..FetchOptions::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(previews.len(), 1);
    assert_eq!(previews[0].total_objects, 100);
    assert_eq!(cache.total_objects, 150);

    // The preview request is the cheap variant: first page, no metadata.
    let requests = store.requests();
    assert_eq!(requests[0].limit, 100);
    assert!(!requests[0].fetch_metadata);
    assert!(requests[1].fetch_metadata);
}

#[tokio::test]
async fn bypass_cache_applies_to_the_first_full_page_only() {
    let store = MemoryStore::new().with_bucket("b", flat_objects(1_200));
    let request = ListingRequest::new("b", "");

    let mut on_preview = |_cache: bucket_scout::listing::DirectoryCache| {};
    fetch_all_objects(
        &store,
        &request,
        FetchOptions {
            bypass_cache: true,
            on_preview: Some(&mut on_preview),
            ..FetchOptions::default()
        },
    )
    .await
    .unwrap();

    let requests = store.requests();
    let bypassed: Vec<bool> = requests.iter().map(|r| r.bypass_cache).collect();
    // Preview page, then three full pages; only the first full page bypasses.
    assert_eq!(bypassed, vec![false, true, false, false]);
}

#[tokio::test]
async fn directories_repeating_across_pages_are_deduped() {
    // 600 keys under one directory span two 500-item pages; the directory
    // must come out once.
    let mut objects: Vec<ObjectItem> = (0..600)
        .map(|i| object(&format!("docs/k{:05}", i), 10))
        .collect();
    objects.push(object("top.txt", 10));
    let store = MemoryStore::new().with_bucket("b", objects);

    let cache = fetch_all_objects(&store, &ListingRequest::new("b", ""), FetchOptions::default())
        .await
        .unwrap();

    assert_eq!(cache.directories, vec!["docs/".to_string()]);
    assert_eq!(cache.total_directories, 1);
    assert_eq!(cache.total_objects, 1);
}

#[tokio::test]
async fn store_failures_propagate_unmodified() {
    let store = MemoryStore::new()
        .with_bucket("b", flat_objects(1_000))
        .with_failure_after(1);

    let err = fetch_all_objects(&store, &ListingRequest::new("b", ""), FetchOptions::default())
        .await
        .unwrap_err();
    assert_matches!(err, ListingError::Store(StoreError::Transport(_)));
}

#[tokio::test]
async fn unknown_bucket_surfaces_as_a_store_error() {
    let store = MemoryStore::new();
    let err = fetch_all_objects(
        &store,
        &ListingRequest::new("missing", ""),
        FetchOptions::default(),
    )
    .await
    .unwrap_err();
    assert_matches!(err, ListingError::Store(StoreError::UnknownBucket(_)));
}

#[tokio::test]
async fn search_and_prefix_narrow_the_walk() {
    let store = MemoryStore::new().with_bucket(
        "b",
        vec![
            object("docs/alpha.md", 1),
            object("docs/beta.md", 1),
            object("src/alpha.rs", 1),
        ],
    );

    let mut request = ListingRequest::new("b", "docs/");
    request.search = Some("alpha".to_string());
    let cache = fetch_all_objects(&store, &request, FetchOptions::default())
        .await
        .unwrap();

    assert_eq!(cache.total_objects, 1);
    assert_eq!(cache.objects[0].key, "docs/alpha.md");
}
