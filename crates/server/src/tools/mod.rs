//! MCP tool implementations.
//!
//! This module contains the tools exposed by the jinamd server.

pub mod fetch_markdown;
