//! Core types and shared functionality for jinamd.
//!
//! This crate provides:
//! - In-memory document cache with key and URI derivation
//! - Unified error types
//! - Configuration structures
//! - Token estimates

pub mod cache;
pub mod config;
pub mod error;
pub mod tokens;

pub use cache::{CachedDocument, DocumentCache, Lookup};
pub use config::AppConfig;
pub use error::Error;
pub use tokens::TokenCounter;
