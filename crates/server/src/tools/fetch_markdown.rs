//! fetch_url_markdown tool implementation.
//!
//! Renders a URL to Markdown through the rendering service, caching the result
//! under a key derived from the canonical URL.

use chrono::Utc;
use jinamd_client::canonicalize;
use jinamd_core::{CachedDocument, Error, Lookup, cache::hash::compute_cache_key};
use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Input parameters for fetch_url_markdown tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FetchMarkdownParams {
    /// Absolute http(s) URL of the page to fetch as Markdown.
    pub url: String,

    /// Bypass the cache and fetch the page again.
    #[serde(default)]
    pub force_refresh: bool,

    /// Return at most this many characters of Markdown. The full document stays
    /// available through the returned resource URI.
    #[serde(default)]
    pub max_chars: Option<usize>,
}

/// Output structure for fetch_url_markdown tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FetchMarkdownOutput {
    /// The canonical URL that was fetched.
    pub url: String,
    /// Resource URI for reading the full document later.
    pub uri: String,
    /// Estimated tokens in the full Markdown document.
    pub token_count: usize,
    /// SHA-256 of the full Markdown document.
    pub content_hash: String,
    /// ISO8601 timestamp of when the content was fetched.
    pub fetched_at: String,
    /// Whether the document came from the cache.
    pub cached: bool,
    /// Whether the content differs from what was cached before this call.
    pub has_changed: bool,
    /// Whether `markdown` was cut to `maxChars`.
    pub truncated: bool,
    /// The Markdown body, or its first `maxChars` characters.
    pub markdown: String,
}

impl FetchMarkdownOutput {
    fn new(lookup: &Lookup, max_chars: Option<usize>) -> Self {
        let document = lookup.document();
        let (markdown, truncated) = preview(&document.markdown, max_chars);

        Self {
            url: document.source_url.clone(),
            uri: document.uri.clone(),
            token_count: document.token_count,
            content_hash: document.content_hash.clone(),
            fetched_at: document.fetched_at_rfc3339(),
            cached: lookup.is_hit(),
            has_changed: lookup.has_changed(),
            truncated,
            markdown,
        }
    }
}

fn preview(markdown: &str, max_chars: Option<usize>) -> (String, bool) {
    match max_chars {
        Some(max) => match markdown.char_indices().nth(max) {
            Some((end, _)) => (markdown[..end].to_string(), true),
            None => (markdown.to_string(), false),
        },
        None => (markdown.to_string(), false),
    }
}

/// Fetch a URL as Markdown, reusing the cached rendering when there is one.
pub async fn fetch_document(state: &AppState, params: FetchMarkdownParams) -> Result<FetchMarkdownOutput, Error> {
    if params.max_chars == Some(0) {
        return Err(Error::InvalidInput("maxChars must be greater than 0".into()));
    }

    let url = canonicalize(&params.url)?;
    let key = compute_cache_key(url.as_str());

    let lookup = state
        .cache
        .get_or_fetch(&key, params.force_refresh, || async {
            tracing::debug!("fetching {} from rendering service", url);
            let markdown = state.reader.read(&url).await.map_err(Error::from)?;
            let token_count = state.tokens.count(&markdown);
            Ok::<_, Error>(CachedDocument::new(url.as_str(), markdown, token_count, Utc::now()))
        })
        .await
        .inspect_err(|e| tracing::warn!("fetch failed for {}: {}", url, e))?;

    if !lookup.is_hit() {
        tracing::info!(
            url = %url,
            uri = %lookup.document().uri,
            token_count = lookup.document().token_count,
            has_changed = lookup.has_changed(),
            "stored markdown"
        );
    }

    Ok(FetchMarkdownOutput::new(&lookup, params.max_chars))
}

/// Implementation of the fetch_url_markdown tool.
pub async fn fetch_impl(state: &AppState, params: FetchMarkdownParams) -> Result<CallToolResult, McpError> {
    let output = fetch_document(state, params).await?;
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
