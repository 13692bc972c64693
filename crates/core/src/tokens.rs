//! Token estimates for rendered Markdown.
//!
//! Counting is delegated to tiktoken's BPE tables. Unknown model names fall
//! back to `cl100k_base`.

use tiktoken_rs::{CoreBPE, cl100k_base, get_bpe_from_model};

use crate::Error;

/// Counts tokens with a BPE loaded once at startup.
pub struct TokenCounter {
    bpe: CoreBPE,
    model: String,
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter").field("model", &self.model).finish_non_exhaustive()
    }
}

impl TokenCounter {
    /// Load the BPE for `model`, or `cl100k_base` if tiktoken does not know it.
    pub fn for_model(model: &str) -> Result<Self, Error> {
        let bpe = match get_bpe_from_model(model) {
            Ok(bpe) => bpe,
            Err(e) => {
                tracing::debug!(model, error = %e, "unknown tokenizer model, using cl100k_base");
                cl100k_base().map_err(|e| Error::Tokenizer(e.to_string()))?
            }
        };

        Ok(Self { bpe, model: model.to_string() })
    }

    /// The model name this counter was built for.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}
