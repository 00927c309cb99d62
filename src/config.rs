use anyhow::{Context, Result};
use regex::Regex;
use std::path::PathBuf;

/// Hidden settings directory under the workspace root.
pub const SETTINGS_DIR: &str = ".termdeck";
/// Settings file name, located anywhere under [`SETTINGS_DIR`].
pub const SETTINGS_FILE: &str = "terminals.json";

const DEFAULT_COOLDOWN_MS: u64 = 2000;

#[derive(Debug, Clone)]
pub struct Config {
    /// First workspace root. Absent means "no workspace open": commands
    /// requiring one fail their precondition and the watcher is skipped.
    pub workspace_root: Option<PathBuf>,
    pub default_shell: Option<String>,
    pub blocked_commands: Vec<Regex>,
    pub log_level: String,
    /// Watcher cooldown window after a processed change event.
    pub cooldown_ms: u64,
    pub audit_log_file: PathBuf,
    pub audit_log_max_size_bytes: u64,
}

fn expand_tilde(path_str: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path_str).as_ref())
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let workspace_root = match std::env::var("TERMDECK_WORKSPACE") {
            Ok(raw) if !raw.trim().is_empty() => {
                let expanded = expand_tilde(raw.trim());
                let root = dunce::canonicalize(&expanded).with_context(|| {
                    format!("Failed to canonicalize TERMDECK_WORKSPACE: {}", raw)
                })?;
                if !root.is_dir() {
                    anyhow::bail!("TERMDECK_WORKSPACE is not a directory: {:?}", root);
                }
                Some(root)
            }
            _ => None,
        };

        let default_shell = std::env::var("TERMDECK_DEFAULT_SHELL")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| std::env::var("SHELL").ok().filter(|s| !s.is_empty()))
            .or_else(|| {
                which::which("sh")
                    .ok()
                    .map(|p| p.to_string_lossy().into_owned())
            });

        let blocked_commands_str = std::env::var("TERMDECK_BLOCKED_COMMANDS").unwrap_or_default();
        let blocked_commands = blocked_commands_str
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            // Match the command as the first word, possibly preceded by env var assignments
            .map(|s| {
                Regex::new(&format!(
                    r"^(?:[a-zA-Z_][a-zA-Z0-9_]*=[^ ]* )*{}(?:\s.*|$)",
                    regex::escape(s)
                ))
                .context(format!("Invalid regex for blocked command: {}", s))
            })
            .collect::<Result<Vec<Regex>>>()?;

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let cooldown_ms = std::env::var("TERMDECK_COOLDOWN_MS")
            .unwrap_or_else(|_| DEFAULT_COOLDOWN_MS.to_string())
            .parse::<u64>()
            .context("Invalid TERMDECK_COOLDOWN_MS")?;

        let log_dir = std::env::var("TERMDECK_LOG_DIR")
            .ok()
            .map(|s| expand_tilde(&s))
            .or_else(|| {
                workspace_root
                    .as_ref()
                    .map(|root| root.join(SETTINGS_DIR).join("logs"))
            })
            .unwrap_or_else(|| std::env::temp_dir().join("termdeck-logs"));

        let audit_log_file = log_dir.join("commands.log");
        let audit_log_max_size_bytes = std::env::var("TERMDECK_AUDIT_LOG_MAX_SIZE_MB")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u64>()
            .map(|mb| mb * 1024 * 1024)
            .unwrap_or(10 * 1024 * 1024);

        Ok(Config {
            workspace_root,
            default_shell,
            blocked_commands,
            log_level,
            cooldown_ms,
            audit_log_file,
            audit_log_max_size_bytes,
        })
    }
}
