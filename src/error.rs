use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Please open a workspace.")]
    WorkspaceRequired,

    #[error("No terminals specified in terminals.json.")]
    NoTerminals,

    #[error("Invalid terminals.json file: {0}")]
    InvalidSettings(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session not found for ID: {0}")]
    SessionNotFound(String),

    #[error("Failed to spawn shell session: {0}")]
    Spawn(String),

    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

impl From<AppError> for rust_mcp_schema::schema_utils::CallToolError {
    fn from(err: AppError) -> Self {
        tracing::error!(error = %err, "command failed");
        let rpc_error = match err {
            AppError::WorkspaceRequired | AppError::NoTerminals | AppError::InvalidSettings(_) => {
                rust_mcp_schema::RpcError::new(
                    rust_mcp_schema::schema_utils::RpcErrorCodes::INVALID_PARAMS,
                    err.to_string(),
                    None,
                )
            }
            _ => rust_mcp_schema::RpcError::new(
                rust_mcp_schema::schema_utils::RpcErrorCodes::INTERNAL_ERROR,
                err.to_string(),
                None,
            ),
        };
        rust_mcp_schema::schema_utils::CallToolError::new(rpc_error)
    }
}
