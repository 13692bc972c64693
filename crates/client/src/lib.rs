//! Client code for jinamd.
//!
//! This crate provides URL canonicalization and the HTTP client for the
//! Markdown rendering service.

pub mod reader;

pub use reader::{JinaReader, MarkdownReader, ReaderConfig, ReaderError, UrlError, canonicalize};
