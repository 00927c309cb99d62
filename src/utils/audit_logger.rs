use anyhow::Result;
use chrono::Utc;
use serde_json::Value;
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::error;

/// Append-only invocation log, rotated by size with a timestamped backup
/// name. Logging never fails a command; errors are logged and swallowed.
pub struct AuditLogger {
    log_file_path: PathBuf,
    max_size_bytes: u64,
}

impl AuditLogger {
    pub fn new(log_file_path: PathBuf, max_size_bytes: u64) -> Self {
        if let Some(parent_dir) = log_file_path.parent() {
            if !parent_dir.exists() {
                if let Err(e) = std::fs::create_dir_all(parent_dir) {
                    error!(path = %parent_dir.display(), error = %e, "Failed to create audit log directory");
                }
            }
        }
        Self {
            log_file_path,
            max_size_bytes,
        }
    }

    async fn rotate_log_if_needed(&self) -> Result<()> {
        if !self.log_file_path.exists() {
            return Ok(());
        }

        let metadata = fs::metadata(&self.log_file_path).await?;
        if metadata.len() >= self.max_size_bytes {
            let timestamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();
            let file_stem = self
                .log_file_path
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy();
            let extension = self
                .log_file_path
                .extension()
                .unwrap_or_default()
                .to_string_lossy();

            let backup_file_name = format!("{}_{}.{}", file_stem, timestamp, extension);
            let backup_path = self.log_file_path.with_file_name(backup_file_name);

            fs::rename(&self.log_file_path, backup_path).await?;
        }
        Ok(())
    }

    pub async fn log_command(&self, command_name: &str, arguments: &Value) {
        if let Err(e) = self.try_log_command(command_name, arguments).await {
            eprintln!("AUDITDBG {}: {:?}", command_name, e);
        }
    }

    async fn try_log_command(&self, command_name: &str, arguments: &Value) -> Result<()> {
        self.rotate_log_if_needed().await?;

        let timestamp = Utc::now().to_rfc3339();
        let args_string = serde_json::to_string(arguments)?;
        let log_entry = format!("{} | {:<24} | {}\n", timestamp, command_name, args_string);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .await?;

        eprintln!("AUDITWRITE cmd={} path={} len={}", command_name, self.log_file_path.display(), log_entry.len());
        file.write_all(log_entry.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
