mod commands;
mod config;
mod error;
mod host;
mod launcher;
mod mcp;
mod settings;
mod utils;

use crate::commands::TerminalCommands;
use crate::config::Config;
use crate::host::process::ProcessTerminalHost;
use crate::host::workspace::LocalWorkspace;
use crate::host::{TerminalHost, WorkspaceHost};
use crate::launcher::Launcher;
use crate::mcp::handler::DeckServerHandler;
use crate::settings::{SettingsStore, SettingsWatcher};
use crate::utils::AuditLogger;

use anyhow::Result;
use rust_mcp_schema::{
    Implementation, InitializeResult, ServerCapabilities, ServerCapabilitiesTools,
    LATEST_PROTOCOL_VERSION,
};
use rust_mcp_sdk::mcp_server::server_runtime::create_server;
use rust_mcp_sdk::McpServer;
use rust_mcp_transport::{StdioTransport, TransportOptions};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, fmt::format::FmtSpan, FmtSubscriber};

fn setup_logging(log_level_str: &str) {
    let level = match log_level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("termdeck={}", level)));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_span_events(FmtSpan::CLOSE)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

fn get_server_details() -> InitializeResult {
    InitializeResult {
        server_info: Implementation {
            name: "termdeck".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools { list_changed: None }),
            ..Default::default()
        },
        meta: None,
        instructions: Some(
            "Declarative terminal session batches. Declare named sessions in \
             <workspace>/.termdeck/terminals.json, then use `open_terminals` to open the \
             whole batch, `open_selected_terminals` for a subset by name, `kill_terminals` \
             to dispose everything, and `init_settings` to create a starter file. The \
             settings file is watched while the server runs."
                .to_string(),
        ),
        protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = Config::load()?;
    setup_logging(&config.log_level);

    tracing::info!(version = %env!("CARGO_PKG_VERSION"), "Starting termdeck server");
    tracing::debug!(workspace = ?config.workspace_root, "Loaded configuration");

    let workspace: Arc<LocalWorkspace> =
        Arc::new(LocalWorkspace::new(config.workspace_root.clone()));
    let terminals: Arc<ProcessTerminalHost> = Arc::new(ProcessTerminalHost::new(
        config.workspace_root.clone(),
        config.default_shell.clone(),
    ));
    let store = Arc::new(SettingsStore::new());

    let launcher = Launcher::new(
        terminals.clone() as Arc<dyn TerminalHost>,
        config.blocked_commands.clone(),
    );
    let commands = Arc::new(TerminalCommands::new(
        store.clone(),
        workspace.clone() as Arc<dyn WorkspaceHost>,
        terminals.clone() as Arc<dyn TerminalHost>,
        launcher,
        config.workspace_root.clone(),
    ));

    commands.activate().await;

    // Kept alive for the lifetime of the server; dropping it would tear
    // down the filesystem subscription.
    let _watcher = match config.workspace_root.as_deref() {
        Some(root) => match SettingsWatcher::install(
            root,
            store.clone(),
            workspace.clone() as Arc<dyn WorkspaceHost>,
            Duration::from_millis(config.cooldown_ms),
        ) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                tracing::warn!(error = %err, "settings watcher unavailable");
                None
            }
        },
        None => {
            tracing::info!("no workspace root configured, settings watcher not installed");
            None
        }
    };

    let audit = Arc::new(AuditLogger::new(
        config.audit_log_file.clone(),
        config.audit_log_max_size_bytes,
    ));
    let handler = DeckServerHandler::new(commands, audit);

    let transport = StdioTransport::new(TransportOptions::default())
        .map_err(|e| anyhow::anyhow!("Failed to create StdioTransport: {}", e))?;
    let server = create_server(get_server_details(), transport, handler);
    server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("MCP server error: {:?}", e))?;

    tracing::info!("Server shutdown.");
    Ok(())
}
