//! Scripted host doubles for tests. The terminal double records every
//! call in order; the workspace double serves an in-memory file tree and
//! a pre-scripted prompt answer.

use crate::config::{SETTINGS_DIR, SETTINGS_FILE};
use crate::error::AppError;
use crate::host::{
    CreateSession, NoticeKind, SessionId, SessionSnapshot, TerminalHost, WorkspaceHost,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Created {
        name: String,
        cwd: Option<PathBuf>,
        shell: Option<String>,
    },
    Input {
        session: SessionId,
        line: String,
    },
    Focused(SessionId),
    Disposed(SessionId),
}

#[derive(Default)]
pub struct RecordingTerminalHost {
    calls: Mutex<Vec<RecordedCall>>,
    live: Mutex<Vec<(SessionId, String)>>,
    counter: Mutex<usize>,
}

impl RecordingTerminalHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn created_names(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::Created { name, .. } => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn inputs(&self) -> Vec<(SessionId, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::Input { session, line } => Some((session, line)),
                _ => None,
            })
            .collect()
    }

    pub fn focused(&self) -> Option<SessionId> {
        self.calls()
            .into_iter()
            .rev()
            .find_map(|call| match call {
                RecordedCall::Focused(id) => Some(id),
                _ => None,
            })
    }
}

#[async_trait]
impl TerminalHost for RecordingTerminalHost {
    async fn create_session(&self, req: CreateSession) -> Result<SessionId, AppError> {
        let mut counter = self.counter.lock().unwrap();
        let id = format!("s{}", *counter);
        *counter += 1;
        drop(counter);

        self.live.lock().unwrap().push((id.clone(), req.name.clone()));
        self.calls.lock().unwrap().push(RecordedCall::Created {
            name: req.name,
            cwd: req.cwd,
            shell: req.shell,
        });
        Ok(id)
    }

    async fn send_input(&self, id: &str, text: &str) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(RecordedCall::Input {
            session: id.to_string(),
            line: text.to_string(),
        });
        Ok(())
    }

    async fn focus_session(&self, id: &str) -> Result<(), AppError> {
        self.calls
            .lock()
            .unwrap()
            .push(RecordedCall::Focused(id.to_string()));
        Ok(())
    }

    async fn read_output(&self, id: &str) -> Result<Vec<String>, AppError> {
        if self.live.lock().unwrap().iter().any(|(session_id, _)| session_id == id) {
            Ok(Vec::new())
        } else {
            Err(AppError::SessionNotFound(id.to_string()))
        }
    }

    async fn dispose_session(&self, id: &str) -> Result<(), AppError> {
        let mut live = self.live.lock().unwrap();
        let position = live
            .iter()
            .position(|(session_id, _)| session_id == id)
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;
        live.remove(position);
        drop(live);

        self.calls
            .lock()
            .unwrap()
            .push(RecordedCall::Disposed(id.to_string()));
        Ok(())
    }

    async fn list_sessions(&self) -> Vec<SessionId> {
        self.live
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    async fn describe_sessions(&self) -> Vec<SessionSnapshot> {
        let focused = self.focused();
        self.live
            .lock()
            .unwrap()
            .iter()
            .map(|(id, name)| SessionSnapshot {
                session_id: id.clone(),
                name: name.clone(),
                is_running: true,
                focused: focused.as_deref() == Some(id.as_str()),
                started_at: "1970-01-01T00:00:00+00:00".to_string(),
            })
            .collect()
    }
}

#[derive(Default)]
pub struct ScriptedWorkspace {
    files: Mutex<HashMap<PathBuf, String>>,
    settings_path: Mutex<Option<PathBuf>>,
    notices: Mutex<Vec<(NoticeKind, String)>>,
    prompt_answer: Mutex<Option<String>>,
}

impl ScriptedWorkspace {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn fixed_settings_path() -> PathBuf {
        PathBuf::from("/ws").join(SETTINGS_DIR).join(SETTINGS_FILE)
    }

    pub fn with_settings(contents: &str) -> Self {
        let workspace = Self::default();
        let path = Self::fixed_settings_path();
        workspace
            .files
            .lock()
            .unwrap()
            .insert(path.clone(), contents.to_string());
        *workspace.settings_path.lock().unwrap() = Some(path);
        workspace
    }

    pub fn script_prompt_answer(&self, answer: &str) {
        *self.prompt_answer.lock().unwrap() = Some(answer.to_string());
    }

    pub fn notices(&self) -> Vec<(NoticeKind, String)> {
        self.notices.lock().unwrap().clone()
    }

    pub fn file(&self, path: &Path) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl WorkspaceHost for ScriptedWorkspace {
    async fn locate_settings(&self) -> Option<PathBuf> {
        self.settings_path.lock().unwrap().clone()
    }

    async fn read_text(&self, path: &Path) -> Result<String, AppError> {
        self.file(path).ok_or_else(|| {
            AppError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                path.display().to_string(),
            ))
        })
    }

    async fn write_text(&self, path: &Path, text: &str) -> Result<(), AppError> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), text.to_string());
        if path.ends_with(PathBuf::from(SETTINGS_DIR).join(SETTINGS_FILE)) {
            *self.settings_path.lock().unwrap() = Some(path.to_path_buf());
        }
        Ok(())
    }

    async fn notify(&self, kind: NoticeKind, text: &str, actions: &[&str]) -> Option<String> {
        self.notices
            .lock()
            .unwrap()
            .push((kind, text.to_string()));
        if actions.is_empty() {
            return None;
        }
        self.prompt_answer.lock().unwrap().take()
    }
}
