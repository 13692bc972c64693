//! The cached unit: one source URL rendered as Markdown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::hash::{compute_cache_key, compute_content_hash};
use super::uri::resource_uri;

/// A Markdown rendering of a single URL.
///
/// `key`, `uri` and `content_hash` are derived in [`CachedDocument::new`] and
/// never set independently, so a document always agrees with its source URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedDocument {
    pub key: String,
    pub source_url: String,
    pub uri: String,
    pub markdown: String,
    pub token_count: usize,
    pub content_hash: String,
    pub fetched_at: DateTime<Utc>,
}

impl CachedDocument {
    /// Build a document for a canonical source URL.
    pub fn new(
        source_url: impl Into<String>, markdown: impl Into<String>, token_count: usize, fetched_at: DateTime<Utc>,
    ) -> Self {
        let source_url = source_url.into();
        let markdown = markdown.into();
        let key = compute_cache_key(&source_url);
        let uri = resource_uri(&key);
        let content_hash = compute_content_hash(&markdown);

        Self { key, source_url, uri, markdown, token_count, content_hash, fetched_at }
    }

    /// Fetch time formatted the way it is reported to clients.
    pub fn fetched_at_rfc3339(&self) -> String {
        self.fetched_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }
}
