//! In-memory document cache.
//!
//! Documents live in an LRU map bounded by entry count, with an optional TTL
//! checked on read. Fetches for the same key are serialized through a per-key
//! async gate, so concurrent requests for one new URL produce a single
//! upstream call and a single insert.

use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use lru::LruCache;
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use super::document::CachedDocument;
use crate::Error;
use crate::config::AppConfig;

/// Outcome of [`DocumentCache::get_or_fetch`].
#[derive(Debug, Clone)]
pub enum Lookup {
    /// Served from memory; no fetch ran.
    Hit(Arc<CachedDocument>),
    /// Freshly fetched and stored. `previous` is whatever the key held before,
    /// expired or not.
    Fetched { document: Arc<CachedDocument>, previous: Option<Arc<CachedDocument>> },
}

impl Lookup {
    pub fn document(&self) -> &Arc<CachedDocument> {
        match self {
            Lookup::Hit(document) | Lookup::Fetched { document, .. } => document,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    /// False only when a refetch returned byte-identical Markdown.
    pub fn has_changed(&self) -> bool {
        match self {
            Lookup::Hit(_) => false,
            Lookup::Fetched { document, previous } => {
                previous.as_ref().is_none_or(|p| p.content_hash != document.content_hash)
            }
        }
    }
}

/// Process-wide store of rendered documents, keyed by cache key.
pub struct DocumentCache {
    entries: Mutex<LruCache<String, Arc<CachedDocument>>>,
    inflight: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    ttl: Option<Duration>,
}

impl std::fmt::Debug for DocumentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl DocumentCache {
    pub fn new(max_entries: NonZeroUsize, ttl: Option<Duration>) -> Self {
        Self { entries: Mutex::new(LruCache::new(max_entries)), inflight: Mutex::new(HashMap::new()), ttl }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let max_entries = NonZeroUsize::new(config.cache_max_entries).unwrap_or(NonZeroUsize::MIN);
        Self::new(max_entries, config.cache_ttl())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Look up a live document, dropping it if it has outlived the TTL.
    pub fn get(&self, key: &str) -> Option<Arc<CachedDocument>> {
        let mut entries = self.entries.lock();
        let document = entries.get(key)?.clone();

        if self.is_expired(&document) {
            tracing::debug!(key, "cache entry expired");
            entries.pop(key);
            return None;
        }

        Some(document)
    }

    /// Store a document, replacing any previous one for the same key.
    ///
    /// Returns the replaced document, if there was one.
    pub fn insert(&self, document: CachedDocument) -> Option<Arc<CachedDocument>> {
        self.store(Arc::new(document))
    }

    /// Live documents, most recently used first. Does not affect LRU order.
    pub fn list(&self) -> Vec<Arc<CachedDocument>> {
        self.entries
            .lock()
            .iter()
            .filter(|(_, document)| !self.is_expired(document))
            .map(|(_, document)| document.clone())
            .collect()
    }

    /// Return the cached document for `key`, or run `fetch` and store its result.
    ///
    /// With `refresh` set, `fetch` always runs and the result replaces the
    /// current entry. A failed fetch leaves the cache untouched.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, refresh: bool, fetch: F) -> Result<Lookup, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedDocument, Error>>,
    {
        let slot = self.enter(key);
        let _permit = slot.gate.lock().await;

        let existing = self.entries.lock().get(key).cloned();
        if !refresh
            && let Some(document) = existing.as_ref()
            && !self.is_expired(document)
        {
            tracing::debug!(key, "cache hit");
            return Ok(Lookup::Hit(document.clone()));
        }

        tracing::debug!(key, refresh, "cache miss");
        let document = fetch().await?;
        if document.key != key {
            return Err(Error::InvalidInput(format!(
                "fetched document key {} does not match requested key {key}",
                document.key
            )));
        }

        let document = Arc::new(document);
        self.store(document.clone());

        Ok(Lookup::Fetched { document, previous: existing })
    }

    fn store(&self, document: Arc<CachedDocument>) -> Option<Arc<CachedDocument>> {
        let key = document.key.clone();
        let mut entries = self.entries.lock();

        match entries.push(key.clone(), document) {
            Some((old_key, old)) if old_key == key => Some(old),
            Some((evicted, _)) => {
                tracing::debug!(key = %evicted, "evicted least recently used document");
                None
            }
            None => None,
        }
    }

    fn is_expired(&self, document: &CachedDocument) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };

        Utc::now()
            .signed_duration_since(document.fetched_at)
            .to_std()
            .is_ok_and(|age| age >= ttl)
    }

    fn enter<'a>(&'a self, key: &'a str) -> InflightSlot<'a> {
        let gate = self.inflight.lock().entry(key.to_string()).or_default().clone();
        InflightSlot { cache: self, key, gate }
    }
}

/// Holds a key's fetch gate; removes it from the map once nobody else waits on it.
struct InflightSlot<'a> {
    cache: &'a DocumentCache,
    key: &'a str,
    gate: Arc<AsyncMutex<()>>,
}

impl Drop for InflightSlot<'_> {
    fn drop(&mut self) {
        let mut inflight = self.cache.inflight.lock();
        // the map's reference plus ours
        if Arc::strong_count(&self.gate) <= 2 {
            inflight.remove(self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::hash::compute_cache_key;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache(max_entries: usize) -> DocumentCache {
        DocumentCache::new(NonZeroUsize::new(max_entries).unwrap(), None)
    }

    fn doc(url: &str, markdown: &str) -> CachedDocument {
        CachedDocument::new(url, markdown, markdown.len(), Utc::now())
    }

    #[test]
    fn test_insert_and_get() {
        let cache = cache(4);
        assert!(cache.is_empty());

        let previous = cache.insert(doc("https://example.com/", "# Example"));
        assert!(previous.is_none());

        let key = compute_cache_key("https://example.com/");
        let found = cache.get(&key).unwrap();
        assert_eq!(found.markdown, "# Example");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_overwrites() {
        let cache = cache(4);
        cache.insert(doc("https://example.com/", "old"));
        let previous = cache.insert(doc("https://example.com/", "new"));

        assert_eq!(previous.unwrap().markdown, "old");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&compute_cache_key("https://example.com/")).unwrap().markdown, "new");
    }

    #[test]
    fn test_lru_eviction() {
        let cache = cache(2);
        cache.insert(doc("https://a.example/", "a"));
        cache.insert(doc("https://b.example/", "b"));

        // touch a so b becomes least recently used
        assert!(cache.get(&compute_cache_key("https://a.example/")).is_some());
        let previous = cache.insert(doc("https://c.example/", "c"));

        assert!(previous.is_none());
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&compute_cache_key("https://b.example/")).is_none());
        assert!(cache.get(&compute_cache_key("https://a.example/")).is_some());
        assert!(cache.get(&compute_cache_key("https://c.example/")).is_some());
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = DocumentCache::new(NonZeroUsize::new(4).unwrap(), Some(Duration::from_secs(60)));
        let stale = CachedDocument::new("https://old.example/", "old", 1, Utc::now() - chrono::Duration::hours(1));
        cache.insert(stale);
        cache.insert(doc("https://new.example/", "new"));

        assert!(cache.get(&compute_cache_key("https://old.example/")).is_none());
        assert!(cache.get(&compute_cache_key("https://new.example/")).is_some());
        assert_eq!(cache.list().len(), 1);
    }

    #[test]
    fn test_list() {
        let cache = cache(4);
        cache.insert(doc("https://a.example/", "a"));
        cache.insert(doc("https://b.example/", "b"));

        let urls: Vec<_> = cache.list().iter().map(|d| d.source_url.clone()).collect();
        assert_eq!(urls, vec!["https://b.example/", "https://a.example/"]);
    }

    #[tokio::test]
    async fn test_get_or_fetch_hit_skips_fetch() {
        let cache = cache(4);
        let url = "https://example.com/";
        let key = compute_cache_key(url);
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_fetch(&key, false, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(doc(url, "# Example"))
            })
            .await
            .unwrap();
        assert!(!first.is_hit());
        assert!(first.has_changed());

        let second = cache
            .get_or_fetch(&key, false, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(doc(url, "# Other"))
            })
            .await
            .unwrap();
        assert!(second.is_hit());
        assert_eq!(second.document().markdown, "# Example");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_fetch_refresh() {
        let cache = cache(4);
        let url = "https://example.com/";
        let key = compute_cache_key(url);

        cache.get_or_fetch(&key, false, || async { Ok(doc(url, "same")) }).await.unwrap();

        let unchanged = cache.get_or_fetch(&key, true, || async { Ok(doc(url, "same")) }).await.unwrap();
        assert!(!unchanged.is_hit());
        assert!(!unchanged.has_changed());

        let changed = cache.get_or_fetch(&key, true, || async { Ok(doc(url, "different")) }).await.unwrap();
        assert!(changed.has_changed());
        assert_eq!(cache.get(&key).unwrap().markdown, "different");
    }

    #[tokio::test]
    async fn test_get_or_fetch_failure_not_cached() {
        let cache = cache(4);
        let key = compute_cache_key("https://example.com/");

        let result = cache
            .get_or_fetch(&key, false, || async { Err(Error::FetchFailed("status 502".into())) })
            .await;

        assert!(matches!(result, Err(Error::FetchFailed(_))));
        assert!(cache.get(&key).is_none());
        assert!(cache.inflight.lock().is_empty());
    }

    #[tokio::test]
    async fn test_get_or_fetch_key_mismatch() {
        let cache = cache(4);
        let key = compute_cache_key("https://example.com/");

        let result = cache
            .get_or_fetch(&key, false, || async { Ok(doc("https://other.example/", "x")) })
            .await;

        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_fetches_single_flight() {
        let cache = Arc::new(cache(4));
        let calls = Arc::new(AtomicUsize::new(0));
        let url = "https://example.com/";
        let key = compute_cache_key(url);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                let key = key.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_fetch(&key, false, || async {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok(doc(url, "# Example"))
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            let lookup = task.await.unwrap().unwrap();
            assert_eq!(lookup.document().markdown, "# Example");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.inflight.lock().is_empty());
    }
}
