use crate::error::AppError;
use crate::host::{CreateSession, SessionId, SessionSnapshot, TerminalHost};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Tail kept per session; older lines are dropped.
const OUTPUT_BUFFER_MAX_LINES: usize = 1000;

const DISPOSE_WAIT: Duration = Duration::from_millis(500);

#[derive(Debug)]
struct ShellSession {
    id: SessionId,
    name: String,
    child: Mutex<Option<Child>>,
    stdin: Mutex<Option<ChildStdin>>,
    output: Arc<Mutex<Vec<String>>>,
    exit_code: Mutex<Option<i32>>,
    started_at: DateTime<Utc>,
}

impl ShellSession {
    /// Probes child liveness, recording the exit code once observed.
    async fn is_running(&self) -> bool {
        let mut child_guard = self.child.lock().await;
        match child_guard.as_mut() {
            Some(child) => match child.try_wait() {
                Ok(Some(status)) => {
                    let mut exit_code = self.exit_code.lock().await;
                    if exit_code.is_none() {
                        *exit_code = status.code();
                    }
                    false
                }
                Ok(None) => true,
                Err(_) => false,
            },
            None => false,
        }
    }
}

/// Production terminal binding: each session is a shell child process
/// with piped stdin for input and a bounded combined-output tail. The
/// registry preserves creation order; "focus" marks the session a richer
/// host surface would foreground.
pub struct ProcessTerminalHost {
    default_cwd: Option<PathBuf>,
    default_shell: Option<String>,
    sessions: Mutex<Vec<Arc<ShellSession>>>,
    focused: Mutex<Option<SessionId>>,
}

impl ProcessTerminalHost {
    pub fn new(default_cwd: Option<PathBuf>, default_shell: Option<String>) -> Self {
        Self {
            default_cwd,
            default_shell,
            sessions: Mutex::new(Vec::new()),
            focused: Mutex::new(None),
        }
    }

    async fn find(&self, id: &str) -> Option<Arc<ShellSession>> {
        self.sessions
            .lock()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }
}

fn spawn_line_reader<R>(reader: R, stream: &'static str, output: Arc<Mutex<Vec<String>>>)
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let mut buffer = output.lock().await;
            if buffer.len() >= OUTPUT_BUFFER_MAX_LINES {
                buffer.remove(0);
            }
            buffer.push(format!("[{}] {}", stream, line));
        }
    });
}

#[async_trait]
impl TerminalHost for ProcessTerminalHost {
    #[instrument(skip(self, req), fields(name = %req.name))]
    async fn create_session(&self, req: CreateSession) -> Result<SessionId, AppError> {
        let shell = req
            .shell
            .or_else(|| self.default_shell.clone())
            .ok_or_else(|| AppError::Spawn("no shell available".to_string()))?;

        let mut command = Command::new(&shell);
        command
            .kill_on_drop(true)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = req.cwd.as_ref().or(self.default_cwd.as_ref()) {
            command.current_dir(cwd);
        }

        debug!(shell = %shell, cwd = ?req.cwd, "spawning shell session");
        let mut child = command
            .spawn()
            .map_err(|e| AppError::Spawn(format!("{}: {}", shell, e)))?;

        let id = Uuid::new_v4().to_string();
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let output = Arc::new(Mutex::new(Vec::new()));
        if let Some(message) = req.message {
            output.lock().await.push(message);
        }
        if let Some(stdout) = stdout {
            spawn_line_reader(stdout, "stdout", output.clone());
        }
        if let Some(stderr) = stderr {
            spawn_line_reader(stderr, "stderr", output.clone());
        }
        // Icon and color are styling hints consumed by hosts with a real
        // terminal surface.
        debug!(icon = ?req.icon, color = ?req.color, "session styling hints");

        let session = Arc::new(ShellSession {
            id: id.clone(),
            name: req.name.clone(),
            child: Mutex::new(Some(child)),
            stdin: Mutex::new(stdin),
            output,
            exit_code: Mutex::new(None),
            started_at: Utc::now(),
        });
        self.sessions.lock().await.push(session);
        info!(session = %id, name = %req.name, "session created");
        Ok(id)
    }

    async fn send_input(&self, id: &str, text: &str) -> Result<(), AppError> {
        let session = self
            .find(id)
            .await
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;

        let mut stdin_guard = session.stdin.lock().await;
        match stdin_guard.as_mut() {
            Some(stdin) => {
                let mut line = text.to_string();
                line.push('\n');
                if let Err(err) = stdin.write_all(line.as_bytes()).await {
                    warn!(session = %id, error = %err, "session stdin closed, input dropped");
                    *stdin_guard = None;
                } else {
                    let _ = stdin.flush().await;
                }
            }
            None => warn!(session = %id, "session has no stdin, input dropped"),
        }
        Ok(())
    }

    async fn focus_session(&self, id: &str) -> Result<(), AppError> {
        let session = self
            .find(id)
            .await
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;
        *self.focused.lock().await = Some(session.id.clone());
        info!(session = %id, name = %session.name, "session focused");
        Ok(())
    }

    async fn read_output(&self, id: &str) -> Result<Vec<String>, AppError> {
        let session = self
            .find(id)
            .await
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;
        let mut buffer = session.output.lock().await;
        Ok(std::mem::take(&mut *buffer))
    }

    #[instrument(skip(self))]
    async fn dispose_session(&self, id: &str) -> Result<(), AppError> {
        let session = {
            let mut sessions = self.sessions.lock().await;
            let position = sessions
                .iter()
                .position(|s| s.id == id)
                .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;
            sessions.remove(position)
        };

        let mut focused = self.focused.lock().await;
        if focused.as_deref() == Some(id) {
            *focused = None;
        }
        drop(focused);

        let mut child_guard = session.child.lock().await;
        if let Some(child) = child_guard.as_mut() {
            if child.try_wait().ok().flatten().is_none() {
                if let Err(err) = child.start_kill() {
                    warn!(session = %id, error = %err, "failed to signal session shell");
                }
                let _ = timeout(DISPOSE_WAIT, child.wait()).await;
            }
        }
        *child_guard = None;
        info!(session = %id, name = %session.name, "session disposed");
        Ok(())
    }

    async fn list_sessions(&self) -> Vec<SessionId> {
        self.sessions
            .lock()
            .await
            .iter()
            .map(|s| s.id.clone())
            .collect()
    }

    async fn describe_sessions(&self) -> Vec<SessionSnapshot> {
        let sessions: Vec<Arc<ShellSession>> = self.sessions.lock().await.clone();
        let focused = self.focused.lock().await.clone();

        let mut snapshots = Vec::with_capacity(sessions.len());
        for session in sessions {
            let is_running = session.is_running().await;
            snapshots.push(SessionSnapshot {
                session_id: session.id.clone(),
                name: session.name.clone(),
                is_running,
                focused: focused.as_deref() == Some(session.id.as_str()),
                started_at: session.started_at.to_rfc3339(),
            });
        }
        snapshots
    }
}
