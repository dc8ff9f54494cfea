// Library module containing testable functions from main.rs

use crate::app::App;
use crate::async_task::TaskResult;
use crate::error::Result;
use crate::listing::{fetch_all_objects, FetchOptions, ListingRequest};
use crate::remote::ObjectStore;
use std::fs;

/// Fold one background result into the app. Listing results carry the
/// request id they were issued under; anything from a superseded request is
/// dropped so a slow old fetch can never clobber the current listing.
pub fn handle_task_result(app: &mut App, result: TaskResult) {
    match result {
        TaskResult::BucketsLoaded { buckets } => {
            app.is_loading = false;
            app.bucket_cursor = 0;
            app.status_message = format!("Loaded {} buckets", buckets.len());
            app.buckets = buckets;
        }
        TaskResult::ListingPreview { request_id, cache } => {
            if request_id != app.current_request_id {
                log::debug!("dropping stale preview (request {})", request_id);
                return;
            }
            app.preview = Some(cache);
            app.apply_sort();
        }
        TaskResult::ListingProgress { request_id, loaded } => {
            if request_id != app.current_request_id {
                return;
            }
            app.loaded_count = loaded;
        }
        TaskResult::ListingLoaded { request_id, cache } => {
            if request_id != app.current_request_id {
                // Async result is stale - ignore it
                log::debug!("dropping stale listing (request {})", request_id);
                return;
            }
            app.is_loading = false;
            app.preview = None;
            app.status_message = if cache.limited {
                format!(
                    "Loaded {} objects, {} directories (truncated)",
                    cache.total_objects, cache.total_directories
                )
            } else {
                format!(
                    "Loaded {} objects, {} directories",
                    cache.total_objects, cache.total_directories
                )
            };
            app.cache = Some(cache);
            app.apply_sort();

            // Restore remembered focus now that the real row set exists.
            let bucket = app.bucket.clone().unwrap_or_default();
            let prefix = app.prefix.clone();
            let items = app.flattened_items();
            app.keyboard
                .set_context(&bucket, &prefix, &items, app.focus_store.as_ref());
        }
        TaskResult::ListingCancelled { request_id } => {
            log::debug!("listing request {} cancelled", request_id);
            if request_id == app.current_request_id {
                app.is_loading = false;
            }
        }
        TaskResult::Error { message } => {
            app.is_loading = false;
            app.status_message = format!("Error: {}", message);
        }
    }
}

/// Headless listing snapshot for the `dump` subcommand.
pub async fn run_dump<S: ObjectStore>(
    store: &S,
    bucket: &str,
    prefix: &str,
    output_path: Option<&str>,
) -> Result<()> {
    let request = ListingRequest::new(bucket, prefix);
    let mut progress = |loaded: usize| {
        eprintln!("{} objects loaded", loaded);
    };
    let cache = fetch_all_objects(
        store,
        &request,
        FetchOptions {
            on_progress: Some(&mut progress),
            ..FetchOptions::default()
        },
    )
    .await?;

    let json = serde_json::to_string_pretty(&cache)?;
    match output_path {
        Some(path) => {
            fs::write(path, &json)?;
            println!("Listing saved to: {}", path);
        }
        None => {
            println!("{}", json);
        }
    }

    if cache.limited {
        eprintln!("Warning: listing was truncated");
    }

    Ok(())
}
