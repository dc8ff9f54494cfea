//! Cancellation and supersession of in-flight listings.

use bucket_scout::app::App;
use bucket_scout::async_task::{run_worker, Task, TaskResult};
use bucket_scout::config::Config;
use bucket_scout::focus_store::MemoryFocusStore;
use bucket_scout::listing::{fetch_all_objects, FetchOptions, ListingError, ListingRequest};
use bucket_scout::main_lib::handle_task_result;
use bucket_scout::remote::{MemoryStore, ObjectItem};
use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn objects(count: usize) -> Vec<ObjectItem> {
    (0..count)
        .map(|i| ObjectItem {
            key: format!("k{:05}", i),
            original_bytes: 10,
            stored_bytes: 10,
            compressed: false,
            modified: Utc.with_ymd_and_hms(2025, 2, 2, 0, 0, 0).unwrap(),
        })
        .collect()
}

#[tokio::test]
async fn cancelling_the_token_stops_the_cursor_walk() {
    let store = MemoryStore::new()
        .with_bucket("b", objects(2_000))
        .with_page_delay(Duration::from_millis(30));
    let request = ListingRequest::new("b", "");
    let cancel = CancellationToken::new();

    let cancel_after_first_page = cancel.clone();
    let mut on_progress = move |_loaded: usize| {
        cancel_after_first_page.cancel();
    };

    let err = fetch_all_objects(
        &store,
        &request,
        FetchOptions {
            cancel: Some(&cancel),
            on_progress: Some(&mut on_progress),
            ..FetchOptions::default()
        },
    )
    .await
    .unwrap_err();

    assert_matches!(err, ListingError::Cancelled);
    // The walk stopped after the page that triggered the cancel.
    assert!(store.requests().len() <= 2);
}

#[tokio::test]
async fn a_pre_cancelled_token_fetches_nothing() {
    let store = MemoryStore::new().with_bucket("b", objects(10));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = fetch_all_objects(
        &store,
        &ListingRequest::new("b", ""),
        FetchOptions {
            cancel: Some(&cancel),
            ..FetchOptions::default()
        },
    )
    .await
    .unwrap_err();

    assert_matches!(err, ListingError::Cancelled);
    assert!(store.requests().is_empty());
}

#[tokio::test]
async fn starting_a_new_listing_cancels_the_previous_request() {
    let (task_tx, mut task_rx) = mpsc::channel::<Task>(32);
    let mut app = App::new(Config::load(), Box::new(MemoryFocusStore::new()), Some("b".to_string()));

    app.start_listing(&task_tx, false);
    let first = task_rx.try_recv().expect("first task queued");
    let Task::LoadListing {
        cancel: first_cancel,
        request_id: first_id,
        ..
    } = first
    else {
        panic!("expected listing task");
    };
    assert!(!first_cancel.is_cancelled());

    app.start_listing(&task_tx, false);
    assert!(first_cancel.is_cancelled());

    let second = task_rx.try_recv().expect("second task queued");
    let Task::LoadListing {
        request_id: second_id,
        cancel: second_cancel,
        ..
    } = second
    else {
        panic!("expected listing task");
    };
    assert!(second_id > first_id);
    assert!(!second_cancel.is_cancelled());
    assert_eq!(app.current_request_id, second_id);
}

#[tokio::test]
async fn worker_reports_cancellation_and_the_next_request_wins() {
    let store = MemoryStore::new()
        .with_bucket("b", objects(1_500))
        .with_page_delay(Duration::from_millis(20));
    let (task_tx, task_rx) = mpsc::channel::<Task>(32);
    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<TaskResult>();
    let worker = tokio::spawn(run_worker(task_rx, result_tx, store));

    let mut app = App::new(Config::load(), Box::new(MemoryFocusStore::new()), Some("b".to_string()));

    // Two rapid navigations: the first fetch is superseded mid-flight.
    app.start_listing(&task_tx, false);
    tokio::time::sleep(Duration::from_millis(5)).await;
    app.prefix = String::new();
    app.start_listing(&task_tx, false);

    let mut cancelled_seen = false;
    loop {
        let result = tokio::time::timeout(Duration::from_secs(10), result_rx.recv())
            .await
            .expect("worker timed out")
            .expect("worker hung up");
        match &result {
            TaskResult::ListingCancelled { .. } => cancelled_seen = true,
            TaskResult::ListingLoaded { request_id, .. } => {
                let id = *request_id;
                handle_task_result(&mut app, result);
                if id == app.current_request_id {
                    break;
                }
                continue;
            }
            _ => {}
        }
        handle_task_result(&mut app, result);
    }

    assert!(cancelled_seen, "superseded request should report cancellation");
    assert_eq!(
        app.cache.as_ref().map(|c| c.total_objects),
        Some(1_500),
        "the winning request's listing is applied"
    );
    assert!(!app.is_loading);

    worker.abort();
}
