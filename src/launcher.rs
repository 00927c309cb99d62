use crate::error::AppError;
use crate::host::{CreateSession, SessionId, TerminalHost};
use crate::settings::TerminalSpec;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{instrument, warn};

/// Opens declared sessions against the terminal host, in declaration
/// order, sending each spec's startup lines after creation.
pub struct Launcher {
    terminals: Arc<dyn TerminalHost>,
    blocked_commands: Vec<Regex>,
}

impl Launcher {
    pub fn new(terminals: Arc<dyn TerminalHost>, blocked_commands: Vec<Regex>) -> Self {
        Self {
            terminals,
            blocked_commands,
        }
    }

    #[instrument(skip(self, specs), fields(count = specs.len()))]
    pub async fn open_sessions(
        &self,
        root: &Path,
        specs: &[TerminalSpec],
    ) -> Result<Vec<SessionId>, AppError> {
        let mut ids = Vec::with_capacity(specs.len());
        for spec in specs {
            let cwd = spec.path.as_deref().map(|raw| resolve_cwd(root, raw));
            let shell = spec
                .shell_path
                .as_deref()
                .map(|raw| shellexpand::tilde(raw).into_owned());

            let id = self
                .terminals
                .create_session(CreateSession {
                    name: spec.name.clone(),
                    icon: spec.icon.clone(),
                    color: spec.color.clone(),
                    message: spec.message.clone(),
                    cwd,
                    shell,
                })
                .await?;

            for line in spec.shell_lines() {
                if self.is_blocked(line) {
                    warn!(session = %spec.name, line, "startup command blocked, skipping");
                    continue;
                }
                self.terminals.send_input(&id, line).await?;
            }
            ids.push(id);
        }
        Ok(ids)
    }

    fn is_blocked(&self, line: &str) -> bool {
        self.blocked_commands
            .iter()
            .any(|regex| regex.is_match(line.trim_start()))
    }
}

/// Position that should receive focus: the first spec asking for it,
/// falling back to the head of the list. None for an empty batch.
pub fn focus_index(specs: &[TerminalSpec]) -> Option<usize> {
    if specs.is_empty() {
        return None;
    }
    Some(
        specs
            .iter()
            .position(TerminalSpec::wants_focus)
            .unwrap_or(0),
    )
}

/// Runs the focus rule over a just-launched batch. Returns the focused
/// session id, if any.
pub async fn apply_focus(
    terminals: &dyn TerminalHost,
    specs: &[TerminalSpec],
    ids: &[SessionId],
    silence: bool,
) -> Result<Option<SessionId>, AppError> {
    if silence {
        return Ok(None);
    }
    let Some(index) = focus_index(specs) else {
        return Ok(None);
    };
    let Some(id) = ids.get(index) else {
        return Ok(None);
    };
    terminals.focus_session(id).await?;
    Ok(Some(id.clone()))
}

fn resolve_cwd(root: &Path, raw: &str) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(raw).as_ref());
    let joined = if expanded.is_absolute() {
        expanded
    } else {
        root.join(expanded)
    };
    dunce::canonicalize(&joined).unwrap_or(joined)
}
