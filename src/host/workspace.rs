use crate::error::AppError;
use crate::host::{NoticeKind, WorkspaceHost};
use crate::settings::locate_settings_file;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Production workspace binding: local filesystem plus a tracing-backed
/// notifier. Notifications render as log records; prompts with actions
/// resolve to no action, since a headless binding has no UI to answer
/// them.
pub struct LocalWorkspace {
    root: Option<PathBuf>,
}

impl LocalWorkspace {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }
}

#[async_trait]
impl WorkspaceHost for LocalWorkspace {
    async fn locate_settings(&self) -> Option<PathBuf> {
        let root = self.root.clone()?;
        tokio::task::spawn_blocking(move || locate_settings_file(&root))
            .await
            .ok()
            .flatten()
    }

    async fn read_text(&self, path: &Path) -> Result<String, AppError> {
        Ok(tokio::fs::read_to_string(path).await?)
    }

    async fn write_text(&self, path: &Path, text: &str) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, text).await?;
        Ok(())
    }

    async fn notify(&self, kind: NoticeKind, text: &str, actions: &[&str]) -> Option<String> {
        match kind {
            NoticeKind::Info => info!(notice = text, "host notification"),
            NoticeKind::Warning => warn!(notice = text, "host notification"),
            NoticeKind::Error => error!(notice = text, "host notification"),
        }
        if !actions.is_empty() {
            debug!(?actions, "notification actions unanswerable over a headless binding");
        }
        None
    }
}
