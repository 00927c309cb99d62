use crate::commands::TerminalCommands;
use crate::mcp::schemas::*;
use crate::utils::AuditLogger;

use async_trait::async_trait;
use rust_mcp_schema::{
    schema_utils::CallToolError, CallToolRequest, CallToolResult, ListToolsRequest,
    ListToolsResult, RpcError, Tool,
};
use rust_mcp_sdk::mcp_server::ServerHandler;
use rust_mcp_sdk::McpServer;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, instrument};

#[derive(Debug, Deserialize)]
struct OpenSelectedParams {
    names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ReadOutputParams {
    session_id: String,
}

pub struct DeckServerHandler {
    commands: Arc<TerminalCommands>,
    audit: Arc<AuditLogger>,
}

impl DeckServerHandler {
    pub fn new(commands: Arc<TerminalCommands>, audit: Arc<AuditLogger>) -> Self {
        Self { commands, audit }
    }
}

#[async_trait]
impl ServerHandler for DeckServerHandler {
    #[instrument(skip(self, _request, _runtime))]
    async fn handle_list_tools_request(
        &self,
        _request: ListToolsRequest,
        _runtime: &dyn McpServer,
    ) -> Result<ListToolsResult, rust_mcp_schema::RpcError> {
        info!("Handling list_tools request");
        let tools = vec![
            Tool {
                name: "open_terminals".to_string(),
                description: Some(
                    "Open every terminal declared in terminals.json and focus one.".to_string(),
                ),
                input_schema: open_terminals_schema(),
            },
            Tool {
                name: "open_selected_terminals".to_string(),
                description: Some(
                    "Open only the declared terminals whose names are given.".to_string(),
                ),
                input_schema: open_selected_terminals_schema(),
            },
            Tool {
                name: "kill_terminals".to_string(),
                description: Some("Dispose every open terminal session.".to_string()),
                input_schema: kill_terminals_schema(),
            },
            Tool {
                name: "init_settings".to_string(),
                description: Some(
                    "Write the bundled default terminals.json into the workspace.".to_string(),
                ),
                input_schema: init_settings_schema(),
            },
            Tool {
                name: "list_sessions".to_string(),
                description: Some("List open terminal sessions in creation order.".to_string()),
                input_schema: list_sessions_schema(),
            },
            Tool {
                name: "read_session_output".to_string(),
                description: Some(
                    "Drain buffered output from one terminal session.".to_string(),
                ),
                input_schema: read_session_output_schema(),
            },
        ];
        Ok(ListToolsResult {
            tools,
            meta: None,
            next_cursor: None,
        })
    }

    #[instrument(skip(self, request, _runtime), fields(tool_name = %request.params.name))]
    async fn handle_call_tool_request(
        &self,
        request: CallToolRequest,
        _runtime: &dyn McpServer,
    ) -> Result<CallToolResult, CallToolError> {
        info!("Handling call_tool request for: {}", request.params.name);
        let args = request.params.arguments.unwrap_or_default();
        self.audit
            .log_command(&request.params.name, &Value::Object(args.clone()))
            .await;

        match request.params.name.as_str() {
            "open_terminals" => {
                let outcome = self.commands.open_all().await?;
                Ok(CallToolResult::text_content(serde_json::to_string(&outcome).map_err(CallToolError::new)?, None))
            }
            "open_selected_terminals" => {
                let params: OpenSelectedParams = serde_json::from_value(Value::Object(args))
                    .map_err(|e| CallToolError::new(RpcError::invalid_params().with_message(e.to_string())))?;
                let outcome = self.commands.open_selected(&params.names).await?;
                Ok(CallToolResult::text_content(serde_json::to_string(&outcome).map_err(CallToolError::new)?, None))
            }
            "kill_terminals" => {
                let outcome = self.commands.kill_all().await?;
                Ok(CallToolResult::text_content(serde_json::to_string(&outcome).map_err(CallToolError::new)?, None))
            }
            "init_settings" => {
                let outcome = self.commands.init_settings().await?;
                Ok(CallToolResult::text_content(serde_json::to_string(&outcome).map_err(CallToolError::new)?, None))
            }
            "list_sessions" => {
                let sessions = self.commands.sessions().await;
                Ok(CallToolResult::text_content(serde_json::to_string(&sessions).map_err(CallToolError::new)?, None))
            }
            "read_session_output" => {
                let params: ReadOutputParams = serde_json::from_value(Value::Object(args))
                    .map_err(|e| CallToolError::new(RpcError::invalid_params().with_message(e.to_string())))?;
                let output = self.commands.read_output(&params.session_id).await?;
                Ok(CallToolResult::text_content(serde_json::to_string(&output).map_err(CallToolError::new)?, None))
            }
            _ => {
                error!("Unknown tool called: {}", request.params.name);
                Err(CallToolError::unknown_tool(request.params.name))
            }
        }
    }
}
