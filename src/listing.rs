//! Progressive object-listing cache.
//!
//! A listing is fetched in two stages: an optional cheap preview (first 100
//! names, no per-item metadata) so the UI can paint immediately, then the
//! full cursor walk at 500 items per page with metadata. Items are indexed
//! once on arrival so every later sort/filter pass works on pre-computed
//! fields. The accumulated dataset is capped at `MAX_CLIENT_OBJECTS`
//! regardless of what the server reports, which bounds memory for very large
//! buckets.

use std::collections::HashSet;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::remote::{
    CompressionFilter, ListRequest, ListResponse, ObjectItem, ObjectStore, SortKey, SortOrder,
    StoreError,
};

/// Upper bound on objects held client-side for one listing.
pub const MAX_CLIENT_OBJECTS: usize = 15_000;

/// Page size for the cheap preview request.
const PREVIEW_LIMIT: usize = 100;

/// Page size for the full metadata walk.
const FULL_PAGE_LIMIT: usize = 500;

/// An object item plus fields derived exactly once at indexing time.
/// `key_lower` and `modified_ms` are never written after construction, so
/// they always agree with their source fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedObjectItem {
    pub key: String,
    pub original_bytes: u64,
    pub stored_bytes: u64,
    pub compressed: bool,
    pub modified: chrono::DateTime<chrono::Utc>,
    key_lower: String,
    modified_ms: i64,
}

impl IndexedObjectItem {
    pub fn index(item: ObjectItem) -> Self {
        let key_lower = item.key.to_lowercase();
        let modified_ms = item.modified.timestamp_millis();
        Self {
            key: item.key,
            original_bytes: item.original_bytes,
            stored_bytes: item.stored_bytes,
            compressed: item.compressed,
            modified: item.modified,
            key_lower,
            modified_ms,
        }
    }

    pub fn key_lower(&self) -> &str {
        &self.key_lower
    }

    pub fn modified_ms(&self) -> i64 {
        self.modified_ms
    }

    pub fn savings_bytes(&self) -> u64 {
        self.original_bytes.saturating_sub(self.stored_bytes)
    }

    pub fn savings_pct(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        (self.savings_bytes() as f64 / self.original_bytes as f64) * 100.0
    }
}

/// The complete (or preview) listing for one (bucket, prefix, search,
/// compression) key. Rebuilt from scratch whenever that key changes; never
/// persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DirectoryCache {
    pub objects: Vec<IndexedObjectItem>,
    pub directories: Vec<String>,
    pub total_objects: usize,
    pub total_directories: usize,
    /// True when the server signalled truncation on any page, or the client
    /// ceiling was reached. Either way the dataset is the first N entries in
    /// server name order, never a sample.
    pub limited: bool,
}

impl DirectoryCache {
    fn from_parts(objects: Vec<IndexedObjectItem>, directories: Vec<String>, limited: bool) -> Self {
        let total_objects = objects.len();
        let total_directories = directories.len();
        Self {
            objects,
            directories,
            total_objects,
            total_directories,
            limited,
        }
    }

    fn from_single_page(response: ListResponse) -> Self {
        let objects = response
            .objects
            .into_iter()
            .map(IndexedObjectItem::index)
            .collect();
        let mut directories = Vec::new();
        let mut seen = HashSet::new();
        for dir in response.common_prefixes {
            if seen.insert(dir.clone()) {
                directories.push(dir);
            }
        }
        Self::from_parts(objects, directories, response.limited)
    }
}

/// The listing context a fetch runs against.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRequest {
    pub bucket: String,
    pub prefix: String,
    pub search: Option<String>,
    pub compressed: CompressionFilter,
}

impl ListingRequest {
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            search: None,
            compressed: CompressionFilter::Any,
        }
    }

    fn page(&self, cursor: Option<String>, limit: usize, fetch_metadata: bool, bypass_cache: bool) -> ListRequest {
        ListRequest {
            bucket: self.bucket.clone(),
            prefix: self.prefix.clone(),
            search: self.search.clone(),
            cursor,
            limit,
            // Display sorting happens client-side; the server is always asked
            // for name-ascending so cursoring stays deterministic.
            sort: SortKey::Name,
            order: SortOrder::Asc,
            compressed: self.compressed,
            fetch_metadata,
            bypass_cache,
        }
    }
}

/// Per-call knobs for `fetch_all_objects`.
pub struct FetchOptions<'a> {
    /// Forwarded to the service only on the very first full-stage page.
    pub bypass_cache: bool,
    /// Checked between pages; a cancelled token aborts the walk.
    pub cancel: Option<&'a CancellationToken>,
    /// Fires after every full-stage page with the cumulative object count.
    pub on_progress: Option<&'a mut (dyn FnMut(usize) + Send)>,
    /// Supplying this enables the preview stage.
    pub on_preview: Option<&'a mut (dyn FnMut(DirectoryCache) + Send)>,
}

impl Default for FetchOptions<'_> {
    fn default() -> Self {
        Self {
            bypass_cache: false,
            cancel: None,
            on_progress: None,
            on_preview: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("listing cancelled")]
    Cancelled,
}

/// Fetch the complete listing for `request`, streaming progress and an
/// optional preview along the way.
///
/// Store failures propagate unmodified; there is no retry here. Callers that
/// can be superseded (rapid prefix navigation) are expected to discard stale
/// results by request token, and may additionally cancel via the token in
/// `options`.
pub async fn fetch_all_objects<S: ObjectStore>(
    store: &S,
    request: &ListingRequest,
    mut options: FetchOptions<'_>,
) -> Result<DirectoryCache, ListingError> {
    if options.on_preview.is_some() {
        let response = store
            .fetch_objects(request.page(None, PREVIEW_LIMIT, false, false))
            .await?;
        let preview = DirectoryCache::from_single_page(response);
        log::debug!(
            "listing preview ready: {} objects, {} directories",
            preview.total_objects,
            preview.total_directories
        );
        if let Some(on_preview) = options.on_preview.as_mut() {
            on_preview(preview);
        }
    }

    let mut objects: Vec<IndexedObjectItem> = Vec::new();
    let mut directories: Vec<String> = Vec::new();
    let mut seen_dirs: HashSet<String> = HashSet::new();
    let mut limited = false;
    let mut cursor: Option<String> = None;
    let mut first_page = true;

    loop {
        if let Some(token) = options.cancel {
            if token.is_cancelled() {
                return Err(ListingError::Cancelled);
            }
        }

        // Bypass applies to the first page only; the service caches on exact
        // parameters, and bypassing mid-cursor could reorder the walk.
        let bypass = options.bypass_cache && first_page;
        first_page = false;

        let response = store
            .fetch_objects(request.page(cursor.take(), FULL_PAGE_LIMIT, true, bypass))
            .await?;

        for item in response.objects {
            if objects.len() >= MAX_CLIENT_OBJECTS {
                limited = true;
                break;
            }
            objects.push(IndexedObjectItem::index(item));
        }
        for dir in response.common_prefixes {
            if seen_dirs.insert(dir.clone()) {
                directories.push(dir);
            }
        }
        limited |= response.limited;

        if let Some(on_progress) = options.on_progress.as_mut() {
            on_progress(objects.len());
        }

        if objects.len() >= MAX_CLIENT_OBJECTS {
            // Ceiling hit: stop here and ignore any remaining cursor.
            limited = true;
            log::warn!(
                "listing for {}/{} capped at {} objects",
                request.bucket,
                request.prefix,
                MAX_CLIENT_OBJECTS
            );
            break;
        }

        match response.cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(DirectoryCache::from_parts(objects, directories, limited))
}

/// Reorder `items` in place. Name comparison is ordinal on the pre-computed
/// lower-cased key (deterministic across environments, unlike locale
/// collation). `Desc` is the ascending order reversed.
pub fn sort_objects(items: &mut [IndexedObjectItem], key: SortKey, order: SortOrder) {
    match key {
        SortKey::Name => items.sort_unstable_by(|a, b| a.key_lower.cmp(&b.key_lower)),
        SortKey::Size => items.sort_unstable_by(|a, b| a.original_bytes.cmp(&b.original_bytes)),
        SortKey::Modified => items.sort_unstable_by(|a, b| a.modified_ms.cmp(&b.modified_ms)),
    }
    if order == SortOrder::Desc {
        items.reverse();
    }
}

/// Ordinal sort into a new vector; the input is left alone.
pub fn sort_directories(dirs: &[String], order: SortOrder) -> Vec<String> {
    let mut sorted = dirs.to_vec();
    sorted.sort_unstable();
    if order == SortOrder::Desc {
        sorted.reverse();
    }
    sorted
}

/// Offset slice of one display page. Out-of-range pages yield an empty slice.
pub fn paginate_objects(items: &[IndexedObjectItem], page_index: usize, page_size: usize) -> &[IndexedObjectItem] {
    let start = page_index.saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Directories render before objects on a page; they get whatever slots the
/// page's objects left free, taken from the same page offset.
pub fn paginate_directories(
    dirs: &[String],
    page_index: usize,
    page_size: usize,
    objects_on_page: usize,
) -> &[String] {
    let remaining = page_size.saturating_sub(objects_on_page);
    if remaining == 0 {
        return &[];
    }
    let start = page_index.saturating_mul(page_size).min(dirs.len());
    let end = start.saturating_add(remaining).min(dirs.len());
    &dirs[start..end]
}

/// Display-facing pagination summary. `page_index` is 0-based everywhere
/// internally; only `current_page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationInfo {
    pub current_page: usize,
    pub total_pages: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

pub fn calculate_pagination_info(total_items: usize, page_index: usize, page_size: usize) -> PaginationInfo {
    let total_pages = if page_size == 0 {
        0
    } else {
        total_items.div_ceil(page_size)
    };
    PaginationInfo {
        current_page: page_index + 1,
        total_pages,
        has_previous: page_index > 0,
        has_next: page_index + 1 < total_pages,
    }
}
