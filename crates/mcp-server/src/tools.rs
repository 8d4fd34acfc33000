//! MCP Tools for Datasheet Graph
//!
//! Both tools answer with plain text: failures are reported inside the text, never as
//! protocol errors, so the calling agent can always read what happened.

use datasheet_graph::{GraphSession, GraphSettings};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Datasheet Graph MCP Service
#[derive(Clone)]
pub struct DatasheetGraphService {
    /// Graph build/query session shared by all connections
    session: Arc<GraphSession>,
    /// Tool router
    tool_router: ToolRouter<Self>,
}

impl DatasheetGraphService {
    pub fn new(settings: GraphSettings) -> Self {
        Self {
            session: Arc::new(GraphSession::new(settings)),
            tool_router: Self::tool_router(),
        }
    }

    async fn run_blocking<F>(&self, op: F) -> Result<CallToolResult, McpError>
    where
        F: FnOnce(&GraphSession) -> String + Send + 'static,
    {
        let session = Arc::clone(&self.session);
        let text = tokio::task::spawn_blocking(move || op(session.as_ref()))
            .await
            .map_err(|e| McpError::internal_error(format!("graph task failed: {e}"), None))?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[tool_handler]
impl ServerHandler for DatasheetGraphService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("Datasheet Graph turns a parsed datasheet (docling JSON or Markdown export) into a section hierarchy graph. Call 'build_datasheet_graph' once per document, then 'get_datasheet_context' with keywords to fetch matching sections and passages; answer from the returned context.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Tool Input Schemas
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct BuildGraphRequest {
    /// Document to build the graph from
    #[schemars(description = "Path to the datasheet export (.json docling document or .md)")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ContextRequest {
    /// Keywords to look up
    #[schemars(description = "Keyword or phrase matched against section titles and passages")]
    pub question: String,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl DatasheetGraphService {
    /// Build the hierarchy graph for a datasheet
    #[tool(description = "Build a knowledge graph from a datasheet export. Extracts the section hierarchy and long text passages, replacing any previously built graph.")]
    pub async fn build_datasheet_graph(
        &self,
        Parameters(request): Parameters<BuildGraphRequest>,
    ) -> Result<CallToolResult, McpError> {
        let path = PathBuf::from(request.path.trim());
        self.run_blocking(move |session| session.build_report(&path))
            .await
    }

    /// Retrieve graph context for a question
    #[tool(description = "Retrieve technical context from the datasheet graph. Returns matching sections and passages with their directly related nodes; use this context to answer the user's question.")]
    pub async fn get_datasheet_context(
        &self,
        Parameters(request): Parameters<ContextRequest>,
    ) -> Result<CallToolResult, McpError> {
        let question = request.question;
        self.run_blocking(move |session| session.context_for(&question))
            .await
    }
}
