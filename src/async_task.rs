//! Background worker for remote listing calls.
//!
//! The UI thread sends `Task`s over a bounded channel; the worker serves
//! them one at a time and streams `TaskResult`s back over an unbounded
//! channel (progress and preview events are emitted from synchronous
//! callbacks inside the fetch loop, so sends there must never block).
//! Results carry the request id they belong to; whoever applies them is
//! responsible for dropping results from a superseded request.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::listing::{fetch_all_objects, DirectoryCache, FetchOptions, ListingError, ListingRequest};
use crate::remote::{BucketStats, ObjectStore};

#[derive(Debug, Clone)]
pub enum Task {
    LoadBuckets,
    LoadListing {
        request: ListingRequest,
        request_id: u64,
        preview: bool,
        bypass_cache: bool,
        cancel: CancellationToken,
    },
}

#[derive(Debug, Clone)]
pub enum TaskResult {
    BucketsLoaded {
        buckets: Vec<BucketStats>,
    },
    ListingPreview {
        request_id: u64,
        cache: DirectoryCache,
    },
    ListingProgress {
        request_id: u64,
        loaded: usize,
    },
    ListingLoaded {
        request_id: u64,
        cache: DirectoryCache,
    },
    ListingCancelled {
        request_id: u64,
    },
    Error {
        message: String,
    },
}

pub async fn run_worker<S: ObjectStore>(
    mut task_receiver: mpsc::Receiver<Task>,
    result_sender: mpsc::UnboundedSender<TaskResult>,
    store: S,
) {
    while let Some(task) = task_receiver.recv().await {
        let result = match task {
            Task::LoadBuckets => match store.fetch_buckets().await {
                Ok(buckets) => TaskResult::BucketsLoaded { buckets },
                Err(e) => TaskResult::Error {
                    message: e.to_string(),
                },
            },
            Task::LoadListing {
                request,
                request_id,
                preview,
                bypass_cache,
                cancel,
            } => {
                load_listing(
                    &store,
                    &result_sender,
                    request,
                    request_id,
                    preview,
                    bypass_cache,
                    cancel,
                )
                .await
            }
        };

        if result_sender.send(result).is_err() {
            // Main thread has dropped the receiver, exit worker
            break;
        }
    }
}

async fn load_listing<S: ObjectStore>(
    store: &S,
    result_sender: &mpsc::UnboundedSender<TaskResult>,
    request: ListingRequest,
    request_id: u64,
    preview: bool,
    bypass_cache: bool,
    cancel: CancellationToken,
) -> TaskResult {
    log::info!(
        "loading listing {}/{} (request {})",
        request.bucket,
        request.prefix,
        request_id
    );

    let progress_sender = result_sender.clone();
    let mut on_progress = move |loaded: usize| {
        let _ = progress_sender.send(TaskResult::ListingProgress { request_id, loaded });
    };

    let preview_sender = result_sender.clone();
    let mut on_preview = move |cache: DirectoryCache| {
        let _ = preview_sender.send(TaskResult::ListingPreview { request_id, cache });
    };

    let options = FetchOptions {
        bypass_cache,
        cancel: Some(&cancel),
        on_progress: Some(&mut on_progress),
        on_preview: if preview { Some(&mut on_preview) } else { None },
    };

    match fetch_all_objects(store, &request, options).await {
        Ok(cache) => TaskResult::ListingLoaded { request_id, cache },
        Err(ListingError::Cancelled) => TaskResult::ListingCancelled { request_id },
        Err(e) => TaskResult::Error {
            message: e.to_string(),
        },
    }
}
