//! Resource listing and reads for cached documents.
//!
//! Every fetched page is exposed as a `jinamd://<key>` resource. Reads are
//! pure cache lookups and never touch the network.

use jinamd_core::{CachedDocument, Error, cache::uri::key_from_uri};
use rmcp::model::{AnnotateAble, ListResourcesResult, RawResource, ReadResourceResult, Resource, ResourceContents};

use crate::state::AppState;

const MARKDOWN_MIME: &str = "text/markdown";

fn to_resource(document: &CachedDocument) -> Resource {
    let mut raw = RawResource::new(document.uri.clone(), format!("Jina Markdown: {}", document.source_url));
    raw.description = Some(format!(
        "Fetched at {} UTC, ~{} tokens",
        document.fetched_at.format("%Y-%m-%dT%H:%M:%S"),
        document.token_count
    ));
    raw.mime_type = Some(MARKDOWN_MIME.to_string());
    raw.size = u32::try_from(document.markdown.len()).ok();
    raw.no_annotation()
}

/// Markdown body followed by a short metadata footer.
pub fn render_document(document: &CachedDocument) -> String {
    let hash_prefix = document.content_hash.get(..12).unwrap_or(&document.content_hash);
    format!(
        "{}\n\n---\n_Estimated tokens_: {}\n_Content hash_: `{}...`\n_Fetched at_: {} UTC",
        document.markdown,
        document.token_count,
        hash_prefix,
        document.fetched_at.format("%Y-%m-%dT%H:%M:%S"),
    )
}

/// All live cached documents, most recently used first.
pub fn list_impl(state: &AppState) -> ListResourcesResult {
    let resources = state.cache.list().iter().map(|d| to_resource(d)).collect();
    ListResourcesResult { meta: None, resources, next_cursor: None }
}

/// Look up a cached document by its resource URI.
pub fn read_document(state: &AppState, uri: &str) -> Result<std::sync::Arc<CachedDocument>, Error> {
    let key = key_from_uri(uri)?;
    state
        .cache
        .get(key)
        .ok_or_else(|| Error::NotFound(format!("resource not found: {uri}")))
}

/// Implementation of resources/read.
pub fn read_impl(state: &AppState, uri: &str) -> Result<ReadResourceResult, Error> {
    let document = read_document(state, uri)?;
    tracing::debug!(uri, "serving cached resource");

    Ok(ReadResourceResult { contents: vec![ResourceContents::text(render_document(&document), document.uri.clone())] })
}
