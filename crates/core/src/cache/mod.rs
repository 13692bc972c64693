//! In-memory cache of rendered Markdown documents.
//!
//! - Cache keys are SHA-256 digests of canonical URLs
//! - Resource URIs embed the key (`jinamd://<key>`)
//! - Storage is an LRU map with optional TTL and per-key single-flight fetches

pub mod document;
pub mod hash;
pub mod store;
pub mod uri;

pub use crate::Error;

pub use document::CachedDocument;
pub use store::{DocumentCache, Lookup};
