//! MCP server handler implementation.
//!
//! This module defines the main server handler that routes tool calls to the
//! fetch tool and serves cached documents as resources.
use crate::resources::{list_impl, read_impl};
use crate::state::AppState;
use crate::tools::fetch_markdown::{FetchMarkdownParams, fetch_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListResourcesResult, ListToolsResult,
        PaginatedRequestParam, ProtocolVersion, ReadResourceRequestParam, ReadResourceResult, ServerCapabilities,
        ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

const INSTRUCTIONS: &str = "Use fetch_url_markdown to read a web page as Markdown. \
The response includes a jinamd:// resource URI and a token estimate; pass maxChars to get a preview \
and read the resource for the full document. Repeated fetches of the same URL are served from memory \
unless forceRefresh is set.";

/// The main MCP server handler for jinamd.
#[derive(Clone)]
pub struct JinaMdServer {
    state: AppState,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl JinaMdServer {
    /// Create a new server handler around shared state.
    pub fn new(state: AppState) -> Self {
        Self { state, tool_router: Self::tool_router() }
    }

    /// Fetch a web page as Markdown.
    ///
    /// Cached by canonical URL; a repeat call makes no network request.
    #[tool(
        description = "Fetch a single web page as Markdown. Returns the Markdown (or a preview when maxChars is set), a jinamd:// resource URI, and an estimated token count."
    )]
    async fn fetch_url_markdown(&self, params: Parameters<FetchMarkdownParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.state, params.0).await
    }
}

impl ServerHandler for JinaMdServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "jinamd".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().enable_resources().build(),
            instructions: Some(INSTRUCTIONS.into()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }

    async fn list_resources(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(list_impl(&self.state))
    }

    async fn read_resource(
        &self, request: ReadResourceRequestParam, _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        read_impl(&self.state, &request.uri).map_err(Into::into)
    }
}
