//! Unified error types for jinamd.
//!
//! Every failure a client can observe is one of these variants, and each maps
//! to a fixed JSON-RPC error code.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Unified error types for the jinamd server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed input supplied by the client (e.g., a relative URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The rendering service could not produce Markdown for the URL.
    #[error("FETCH_FAILED: {0}")]
    FetchFailed(String),

    /// No cached document for the given resource URI.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// The BPE tables for token estimates could not be loaded.
    #[error("TOKENIZER_ERROR: {0}")]
    Tokenizer(String),
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::FetchFailed(msg) => (-32008, msg.clone()),
            Error::NotFound(msg) => (-32002, msg.clone()),
            Error::Tokenizer(msg) => (-32603, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
