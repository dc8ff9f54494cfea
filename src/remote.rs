//! Wire contracts for the remote listing collaborator and the in-memory
//! adapter used by the demo binary and tests.
//!
//! The real storage service is out of scope for this crate; everything talks
//! to it through the `ObjectStore` trait. The adapter here serves
//! deterministic, name-ascending pages with an opaque offset cursor and
//! delimiter-collapsed common prefixes, which is all the listing layer relies
//! on.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Sort criteria understood by both the server and the client-side reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Name,
    Size,
    Modified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Compression filter for a listing. `Any` disables the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionFilter {
    #[default]
    Any,
    Compressed,
    Uncompressed,
}

impl CompressionFilter {
    pub fn matches(&self, compressed: bool) -> bool {
        match self {
            CompressionFilter::Any => true,
            CompressionFilter::Compressed => compressed,
            CompressionFilter::Uncompressed => !compressed,
        }
    }

    pub fn cycle(&self) -> CompressionFilter {
        match self {
            CompressionFilter::Any => CompressionFilter::Compressed,
            CompressionFilter::Compressed => CompressionFilter::Uncompressed,
            CompressionFilter::Uncompressed => CompressionFilter::Any,
        }
    }
}

/// One object as reported by the listing service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectItem {
    pub key: String,
    pub original_bytes: u64,
    pub stored_bytes: u64,
    pub compressed: bool,
    pub modified: DateTime<Utc>,
}

/// Aggregate statistics for one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketStats {
    pub name: String,
    pub object_count: usize,
    pub original_bytes: u64,
    pub stored_bytes: u64,
}

impl BucketStats {
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

/// Parameters for one page request against the listing service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRequest {
    pub bucket: String,
    pub prefix: String,
    pub search: Option<String>,
    pub cursor: Option<String>,
    pub limit: usize,
    pub sort: SortKey,
    pub order: SortOrder,
    pub compressed: CompressionFilter,
    pub fetch_metadata: bool,
    /// Ask the service to skip its own response cache for this page.
    pub bypass_cache: bool,
}

/// One page of a listing: direct objects, collapsed directory prefixes, a
/// continuation cursor (`None` on the last page) and the server-side
/// truncation flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    pub objects: Vec<ObjectItem>,
    pub common_prefixes: Vec<String>,
    pub cursor: Option<String>,
    pub limited: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Schema(String),
    #[error("unknown bucket: {0}")]
    UnknownBucket(String),
}

/// The remote listing collaborator. Implementations must serve pages in
/// name-ascending key order and keep cursors stable across pages of one
/// logical listing.
pub trait ObjectStore: Send + Sync {
    fn fetch_objects(
        &self,
        request: ListRequest,
    ) -> impl Future<Output = Result<ListResponse, StoreError>> + Send;

    fn fetch_buckets(&self) -> impl Future<Output = Result<Vec<BucketStats>, StoreError>> + Send;
}

const CURSOR_PREFIX: &str = "offset:";

fn encode_cursor(offset: usize) -> String {
    format!("{}{}", CURSOR_PREFIX, offset)
}

fn decode_cursor(raw: &str) -> Result<usize, StoreError> {
    raw.strip_prefix(CURSOR_PREFIX)
        .and_then(|rest| rest.parse::<usize>().ok())
        .ok_or_else(|| StoreError::Schema(format!("invalid cursor: {}", raw)))
}

/// In-memory `ObjectStore`. Keys are held sorted per bucket; listing walks
/// every key under the requested prefix and collapses deeper keys into
/// common prefixes per page, so a directory spanning a page boundary shows
/// up in both pages (the client is expected to dedupe).
pub struct MemoryStore {
    buckets: BTreeMap<String, Vec<ObjectItem>>,
    truncate_after: Option<usize>,
    fail_after_pages: Option<usize>,
    page_delay: Option<Duration>,
    pages_served: AtomicUsize,
    requests: Mutex<Vec<ListRequest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
            truncate_after: None,
            fail_after_pages: None,
            page_delay: None,
            pages_served: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_bucket(mut self, name: &str, mut objects: Vec<ObjectItem>) -> Self {
        objects.sort_unstable_by(|a, b| a.key.cmp(&b.key));
        self.buckets.insert(name.to_string(), objects);
        self
    }

    /// Simulate server-side truncation: only the first `count` keys of any
    /// listing exist, and responses carry `limited = true` once keys were
    /// dropped.
    pub fn with_truncation(mut self, count: usize) -> Self {
        self.truncate_after = Some(count);
        self
    }

    /// Fail with a transport error once `pages` pages have been served.
    pub fn with_failure_after(mut self, pages: usize) -> Self {
        self.fail_after_pages = Some(pages);
        self
    }

    /// Sleep before serving each page, to give cancellation a window.
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = Some(delay);
        self
    }

    /// Every `ListRequest` this store has served, in arrival order.
    pub fn requests(&self) -> Vec<ListRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// A small fixed dataset for the interactive demo: release artifacts,
    /// a flat asset bucket, and a log bucket large enough to paginate.
    pub fn with_demo_data() -> Self {
        let ts = |day: u32, hour: u32| {
            Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        };

        let mut releases = Vec::new();
        for version in ["v1.0", "v1.1", "v2.0"] {
            for artifact in ["app-linux.tar.gz", "app-macos.tar.gz", "app-windows.zip", "SHA256SUMS"] {
                let compressed = artifact.ends_with(".gz") || artifact.ends_with(".zip");
                releases.push(ObjectItem {
                    key: format!("builds/{}/{}", version, artifact),
                    original_bytes: 48_000_000,
                    stored_bytes: if compressed { 9_500_000 } else { 48_000_000 },
                    compressed,
                    modified: ts(3, 12),
                });
            }
        }
        releases.push(ObjectItem {
            key: "README.md".to_string(),
            original_bytes: 4_096,
            stored_bytes: 4_096,
            compressed: false,
            modified: ts(1, 9),
        });

        let assets = (0..40u64)
            .map(|i| ObjectItem {
                key: format!("img-{:03}.png", i),
                original_bytes: 250_000 + i * 1_000,
                stored_bytes: 250_000 + i * 1_000,
                compressed: false,
                modified: ts(10, (i % 24) as u32),
            })
            .collect();

        let logs = (0..1_200u64)
            .map(|i| ObjectItem {
                key: format!("2025/06/{:02}/worker-{:04}.log.gz", (i % 28) + 1, i),
                original_bytes: 1_400_000,
                stored_bytes: 180_000,
                compressed: true,
                modified: ts(((i % 28) + 1) as u32, 4),
            })
            .collect();

        MemoryStore::new()
            .with_bucket("releases", releases)
            .with_bucket("assets", assets)
            .with_bucket("logs", logs)
    }

    fn filtered_keys<'a>(
        &'a self,
        request: &ListRequest,
    ) -> Result<Vec<&'a ObjectItem>, StoreError> {
        let objects = self
            .buckets
            .get(&request.bucket)
            .ok_or_else(|| StoreError::UnknownBucket(request.bucket.clone()))?;

        let search_lower = request.search.as_ref().map(|s| s.to_lowercase());
        Ok(objects
            .iter()
            .filter(|o| o.key.starts_with(&request.prefix))
            .filter(|o| {
                search_lower
                    .as_ref()
                    .map_or(true, |s| o.key.to_lowercase().contains(s))
            })
            .filter(|o| request.compressed.matches(o.compressed))
            .collect())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for MemoryStore {
    async fn fetch_objects(&self, request: ListRequest) -> Result<ListResponse, StoreError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        if let Some(delay) = self.page_delay {
            tokio::time::sleep(delay).await;
        }

        let served = self.pages_served.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = self.fail_after_pages {
            if served >= limit {
                return Err(StoreError::Transport("injected page failure".to_string()));
            }
        }

        let mut keys = self.filtered_keys(&request)?;
        let mut limited = false;
        if let Some(count) = self.truncate_after {
            if keys.len() > count {
                keys.truncate(count);
                limited = true;
            }
        }

        let offset = match request.cursor.as_deref() {
            Some(raw) => decode_cursor(raw)?,
            None => 0,
        };
        let end = offset.saturating_add(request.limit).min(keys.len());
        let page = keys.get(offset.min(keys.len())..end).unwrap_or(&[]);

        let mut objects = Vec::new();
        let mut common_prefixes = Vec::new();
        for item in page {
            let rest = &item.key[request.prefix.len()..];
            match rest.find('/') {
                Some(pos) => {
                    let dir = format!("{}{}/", request.prefix, &rest[..pos]);
                    if common_prefixes.last() != Some(&dir) {
                        common_prefixes.push(dir);
                    }
                }
                None => {
                    let mut object = (*item).clone();
                    if !request.fetch_metadata {
                        object.modified = DateTime::<Utc>::UNIX_EPOCH;
                    }
                    objects.push(object);
                }
            }
        }

        let cursor = if end < keys.len() {
            Some(encode_cursor(end))
        } else {
            None
        };

        log::debug!(
            "memory store: bucket={} prefix={} offset={} -> {} objects, {} prefixes, cursor={:?}",
            request.bucket,
            request.prefix,
            offset,
            objects.len(),
            common_prefixes.len(),
            cursor
        );

        Ok(ListResponse {
            objects,
            common_prefixes,
            cursor,
            limited,
        })
    }

    async fn fetch_buckets(&self) -> Result<Vec<BucketStats>, StoreError> {
        Ok(self
            .buckets
            .iter()
            .map(|(name, objects)| BucketStats {
                name: name.clone(),
                object_count: objects.len(),
                original_bytes: objects.iter().map(|o| o.original_bytes).sum(),
                stored_bytes: objects.iter().map(|o| o.stored_bytes).sum(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn object(key: &str, bytes: u64) -> ObjectItem {
        ObjectItem {
            key: key.to_string(),
            original_bytes: bytes,
            stored_bytes: bytes,
            compressed: false,
            modified: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn request(bucket: &str, prefix: &str, limit: usize) -> ListRequest {
        ListRequest {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            search: None,
            cursor: None,
            limit,
            sort: SortKey::Name,
            order: SortOrder::Asc,
            compressed: CompressionFilter::Any,
            fetch_metadata: true,
            bypass_cache: false,
        }
    }

    #[tokio::test]
    async fn pages_follow_cursor_in_name_order() {
        let store = MemoryStore::new().with_bucket(
            "b",
            vec![object("a.txt", 1), object("b.txt", 2), object("c.txt", 3)],
        );

        let first = store.fetch_objects(request("b", "", 2)).await.unwrap();
        assert_eq!(
            first.objects.iter().map(|o| o.key.as_str()).collect::<Vec<_>>(),
            vec!["a.txt", "b.txt"]
        );
        let cursor = first.cursor.expect("expected continuation cursor");

        let mut next = request("b", "", 2);
        next.cursor = Some(cursor);
        let second = store.fetch_objects(next).await.unwrap();
        assert_eq!(second.objects[0].key, "c.txt");
        assert_eq!(second.cursor, None);
    }

    #[tokio::test]
    async fn deeper_keys_collapse_into_common_prefixes() {
        let store = MemoryStore::new().with_bucket(
            "b",
            vec![
                object("docs/a.md", 1),
                object("docs/b.md", 1),
                object("root.txt", 1),
            ],
        );

        let page = store.fetch_objects(request("b", "", 10)).await.unwrap();
        assert_eq!(page.common_prefixes, vec!["docs/".to_string()]);
        assert_eq!(page.objects.len(), 1);
        assert_eq!(page.objects[0].key, "root.txt");
    }

    #[tokio::test]
    async fn unknown_bucket_is_an_error() {
        let store = MemoryStore::new();
        let err = store.fetch_objects(request("nope", "", 10)).await;
        assert!(matches!(err, Err(StoreError::UnknownBucket(_))));
    }

    #[tokio::test]
    async fn invalid_cursor_is_a_schema_error() {
        let store = MemoryStore::new().with_bucket("b", vec![object("a", 1)]);
        let mut req = request("b", "", 10);
        req.cursor = Some("garbage".to_string());
        let err = store.fetch_objects(req).await;
        assert!(matches!(err, Err(StoreError::Schema(_))));
    }

    #[tokio::test]
    async fn truncation_flags_the_response() {
        let store = MemoryStore::new()
            .with_bucket("b", vec![object("a", 1), object("b", 1), object("c", 1)])
            .with_truncation(2);

        let page = store.fetch_objects(request("b", "", 10)).await.unwrap();
        assert_eq!(page.objects.len(), 2);
        assert!(page.limited);
    }

    #[tokio::test]
    async fn bucket_stats_aggregate_sizes() {
        let store = MemoryStore::new().with_bucket("b", vec![object("a", 10), object("c", 30)]);
        let buckets = store.fetch_buckets().await.unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].object_count, 2);
        assert_eq!(buckets[0].original_bytes, 40);
    }
}
