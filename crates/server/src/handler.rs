//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the character operations.
use std::sync::Arc;

use crate::tools::characters::{
    GetCharacterParams, GetCharactersParams, ListCachedParams, get_character_impl, get_characters_impl,
    list_cached_impl,
};
use citadel_client::{CharacterService, UpstreamClient};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for citadel.
#[derive(Clone)]
pub struct CitadelServer {
    tool_router: ToolRouter<Self>,
    service: Arc<CharacterService<UpstreamClient>>,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl CitadelServer {
    /// Create a new server handler around a shared character service.
    pub fn new(service: Arc<CharacterService<UpstreamClient>>) -> Self {
        Self { tool_router: Self::tool_router(), service }
    }

    #[tool(
        description = "List characters from the upstream API with optional name/status/species filters. Every returned character is cached locally."
    )]
    async fn get_characters(&self, params: Parameters<GetCharactersParams>) -> Result<CallToolResult, McpError> {
        get_characters_impl(&self.service, params.0).await
    }

    #[tool(description = "Get one character by id with its episodes. Served from the local cache when available.")]
    async fn get_character(&self, params: Parameters<GetCharacterParams>) -> Result<CallToolResult, McpError> {
        get_character_impl(&self.service, params.0).await
    }

    #[tool(description = "List characters already cached locally. Never calls the upstream API.")]
    async fn list_cached_characters(&self, params: Parameters<ListCachedParams>) -> Result<CallToolResult, McpError> {
        list_cached_impl(&self.service, params.0).await
    }
}

impl ServerHandler for CitadelServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "citadel".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
