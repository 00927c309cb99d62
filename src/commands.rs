use crate::config::{SETTINGS_DIR, SETTINGS_FILE};
use crate::error::AppError;
use crate::host::{NoticeKind, SessionSnapshot, TerminalHost, WorkspaceHost};
use crate::launcher::{apply_focus, Launcher};
use crate::settings::{load_settings, LoadOutcome, Settings, SettingsStore, TerminalSpec};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Bundled default configuration written by init_settings.
pub const DEFAULT_SETTINGS: &str = include_str!("../assets/default-terminals.json");

const CREATE_ACTION: &str = "Create now";
const DISMISS_ACTION: &str = "Maybe later";

#[derive(Debug, Serialize)]
pub struct OpenedSession {
    pub session_id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct OpenOutcome {
    pub opened: Vec<OpenedSession>,
    pub focused: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct KillOutcome {
    pub disposed: usize,
}

#[derive(Debug, Serialize)]
pub struct InitOutcome {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct SessionOutput {
    pub session_id: String,
    pub lines: Vec<String>,
}

/// The user-invocable command surface, composed over the settings store
/// and the host collaborators.
pub struct TerminalCommands {
    store: Arc<SettingsStore>,
    workspace: Arc<dyn WorkspaceHost>,
    terminals: Arc<dyn TerminalHost>,
    launcher: Launcher,
    workspace_root: Option<PathBuf>,
}

impl TerminalCommands {
    pub fn new(
        store: Arc<SettingsStore>,
        workspace: Arc<dyn WorkspaceHost>,
        terminals: Arc<dyn TerminalHost>,
        launcher: Launcher,
        workspace_root: Option<PathBuf>,
    ) -> Self {
        Self {
            store,
            workspace,
            terminals,
            launcher,
            workspace_root,
        }
    }

    fn require_root(&self) -> Result<&Path, AppError> {
        self.workspace_root
            .as_deref()
            .ok_or(AppError::WorkspaceRequired)
    }

    fn require_settings(&self) -> Result<Settings, AppError> {
        self.store.current().ok_or(AppError::NoTerminals)
    }

    /// Startup pass: populate the store, and when nothing was found raise
    /// the non-blocking create prompt. Never blocks on the prompt.
    pub async fn activate(self: &Arc<Self>) {
        let outcome = load_settings(self.workspace.as_ref()).await;
        let absent = matches!(outcome, LoadOutcome::Absent);
        self.store.apply_initial(outcome);

        if absent {
            let commands = Arc::clone(self);
            tokio::spawn(async move {
                let answer = commands
                    .workspace
                    .notify(
                        NoticeKind::Warning,
                        "Could not find terminals.json file.",
                        &[CREATE_ACTION, DISMISS_ACTION],
                    )
                    .await;
                if answer.as_deref() == Some(CREATE_ACTION) {
                    if let Err(err) = commands.init_settings().await {
                        warn!(error = %err, "failed to create settings file from prompt");
                    }
                }
            });
        }
    }

    #[instrument(skip(self))]
    pub async fn open_all(&self) -> Result<OpenOutcome, AppError> {
        let root = self.require_root()?;
        let settings = self.require_settings()?;

        let ids = self
            .launcher
            .open_sessions(root, &settings.terminals)
            .await?;
        let focused = apply_focus(
            self.terminals.as_ref(),
            &settings.terminals,
            &ids,
            settings.silence,
        )
        .await?;

        Ok(outcome(&settings.terminals, ids, focused))
    }

    #[instrument(skip(self), fields(selected = names.len()))]
    pub async fn open_selected(&self, names: &[String]) -> Result<OpenOutcome, AppError> {
        let root = self.require_root()?;
        let settings = self.require_settings()?;

        // Declaration order wins regardless of the reply order.
        let chosen: Vec<TerminalSpec> = settings
            .terminals
            .iter()
            .filter(|spec| names.iter().any(|name| name == &spec.name))
            .cloned()
            .collect();
        self.report_unknown_names(&settings, names).await;

        let ids = self.launcher.open_sessions(root, &chosen).await?;
        let focused =
            apply_focus(self.terminals.as_ref(), &chosen, &ids, settings.silence).await?;

        Ok(outcome(&chosen, ids, focused))
    }

    async fn report_unknown_names(&self, settings: &Settings, names: &[String]) {
        let unknown: Vec<&str> = names
            .iter()
            .filter(|name| !settings.terminals.iter().any(|spec| &spec.name == *name))
            .map(|name| name.as_str())
            .collect();
        if unknown.is_empty() {
            return;
        }

        let mut text = format!("Unknown terminal name(s): {}.", unknown.join(", "));
        if let Some(suggestion) = closest_name(unknown[0], &settings.terminals) {
            text.push_str(&format!(" Did you mean '{}'?", suggestion));
        }
        self.workspace
            .notify(NoticeKind::Warning, &text, &[])
            .await;
    }

    #[instrument(skip(self))]
    pub async fn kill_all(&self) -> Result<KillOutcome, AppError> {
        let ids = self.terminals.list_sessions().await;
        let mut disposed = 0;
        for id in ids {
            if let Err(err) = self.terminals.dispose_session(&id).await {
                warn!(session = %id, error = %err, "failed to dispose session");
                continue;
            }
            disposed += 1;
        }
        info!(disposed, "sessions disposed");
        Ok(KillOutcome { disposed })
    }

    #[instrument(skip(self))]
    pub async fn init_settings(&self) -> Result<InitOutcome, AppError> {
        let root = self.require_root()?;
        let path = root.join(SETTINGS_DIR).join(SETTINGS_FILE);

        self.workspace.write_text(&path, DEFAULT_SETTINGS).await?;
        self.workspace
            .notify(
                NoticeKind::Info,
                &format!("Created {}", path.display()),
                &[],
            )
            .await;
        Ok(InitOutcome {
            path: path.display().to_string(),
        })
    }

    pub async fn sessions(&self) -> Vec<SessionSnapshot> {
        self.terminals.describe_sessions().await
    }

    pub async fn read_output(&self, session_id: &str) -> Result<SessionOutput, AppError> {
        let lines = self.terminals.read_output(session_id).await?;
        Ok(SessionOutput {
            session_id: session_id.to_string(),
            lines,
        })
    }
}

fn outcome(specs: &[TerminalSpec], ids: Vec<String>, focused: Option<String>) -> OpenOutcome {
    let opened = specs
        .iter()
        .zip(&ids)
        .map(|(spec, id)| OpenedSession {
            session_id: id.clone(),
            name: spec.name.clone(),
        })
        .collect();
    OpenOutcome { opened, focused }
}

fn closest_name<'a>(unknown: &str, specs: &'a [TerminalSpec]) -> Option<&'a str> {
    specs
        .iter()
        .map(|spec| {
            (
                spec.name.as_str(),
                strsim::jaro_winkler(unknown, &spec.name),
            )
        })
        .filter(|(_, score)| *score > 0.75)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(name, _)| name)
}
