//! Shared state injected into the MCP handler.

use std::sync::Arc;

use jinamd_client::{JinaReader, MarkdownReader, ReaderConfig};
use jinamd_core::{AppConfig, DocumentCache, Error, TokenCounter};

/// Everything a request needs: the document cache, the rendering client and
/// the token counter. Cloning is cheap; all clones share the same cache.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<DocumentCache>,
    pub reader: Arc<dyn MarkdownReader>,
    pub tokens: Arc<TokenCounter>,
}

impl AppState {
    pub fn new(cache: DocumentCache, reader: Arc<dyn MarkdownReader>, tokens: Arc<TokenCounter>) -> Self {
        Self { cache: Arc::new(cache), reader, tokens }
    }

    /// Build the production state: Jina Reader client, LRU cache, tiktoken counter.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let reader = JinaReader::new(ReaderConfig::from(config))?;
        let tokens = TokenCounter::for_model(&config.tokenizer_model)?;
        let cache = DocumentCache::from_config(config);

        tracing::info!(
            reader = %config.reader_base_url,
            cache_max_entries = config.cache_max_entries,
            cache_ttl_secs = config.cache_ttl_secs,
            tokenizer = %config.tokenizer_model,
            "initialized server state"
        );

        Ok(Self::new(cache, Arc::new(reader), Arc::new(tokens)))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let state = AppState::from_config(&AppConfig { cache_max_entries: 7, ..Default::default() }).unwrap();
        assert!(state.cache.is_empty());
        assert_eq!(state.cache.capacity(), 7);
        assert_eq!(state.tokens.model(), "gpt-4");
    }

    #[test]
    fn test_clones_share_cache() {
        let state = test_support::state_for("http://127.0.0.1:9");
        let clone = state.clone();
        assert!(Arc::ptr_eq(&state.cache, &clone.cache));
    }
}
