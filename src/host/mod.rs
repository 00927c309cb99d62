pub mod process;
#[cfg(test)]
pub mod testing;
pub mod workspace;

use crate::error::AppError;
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Notification severity, mirroring the host UI's message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

pub type SessionId = String;

/// Host-visible description of a session to create. `cwd` and `shell`
/// arrive already resolved; `None` means the host's own default.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub message: Option<String>,
    pub cwd: Option<PathBuf>,
    pub shell: Option<String>,
}

/// Ordered session metadata for the read-only listing surface.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub name: String,
    pub is_running: bool,
    pub focused: bool,
    pub started_at: String,
}

/// Workspace-side collaborators: settings file access and user
/// notifications.
#[async_trait]
pub trait WorkspaceHost: Send + Sync {
    async fn locate_settings(&self) -> Option<PathBuf>;

    async fn read_text(&self, path: &Path) -> Result<String, AppError>;

    /// Writes `text`, creating parent directories as needed. An existing
    /// file is replaced.
    async fn write_text(&self, path: &Path, text: &str) -> Result<(), AppError>;

    /// Shows a notification. With `actions`, resolves to the action the
    /// user picked, if any. Hosts without an interactive surface resolve
    /// to `None`.
    async fn notify(&self, kind: NoticeKind, text: &str, actions: &[&str]) -> Option<String>;
}

/// Terminal-side collaborators: session lifecycle primitives. The host
/// owns the resulting session handles.
#[async_trait]
pub trait TerminalHost: Send + Sync {
    async fn create_session(&self, req: CreateSession) -> Result<SessionId, AppError>;

    async fn send_input(&self, id: &str, text: &str) -> Result<(), AppError>;

    async fn focus_session(&self, id: &str) -> Result<(), AppError>;

    /// Drains and returns the session's buffered output lines.
    async fn read_output(&self, id: &str) -> Result<Vec<String>, AppError>;

    async fn dispose_session(&self, id: &str) -> Result<(), AppError>;

    /// Session ids in creation order.
    async fn list_sessions(&self) -> Vec<SessionId>;

    /// Session metadata in creation order.
    async fn describe_sessions(&self) -> Vec<SessionSnapshot>;
}
