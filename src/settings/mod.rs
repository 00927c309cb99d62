mod locate;
mod store;
mod watch;

pub use locate::locate_settings_file;
pub use store::SettingsStore;
pub use watch::SettingsWatcher;

use crate::error::AppError;
use crate::host::{NoticeKind, WorkspaceHost};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// One declared terminal session.
///
/// `commands` stays loosely typed on purpose: non-string entries are
/// skipped at send time instead of failing the whole file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalSpec {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub shell_path: Option<String>,
    #[serde(default)]
    pub commands: Vec<Value>,
    #[serde(default)]
    pub focus: Option<bool>,
}

impl TerminalSpec {
    /// Lines to send to the session after creation, in declaration order.
    pub fn shell_lines(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(Value::as_str)
    }

    pub fn wants_focus(&self) -> bool {
        self.focus == Some(true)
    }
}

/// The whole settings file. `terminals` decodes with a default so that a
/// missing key is a validation failure, not a parse failure.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub silence: bool,
    #[serde(default)]
    pub terminals: Vec<TerminalSpec>,
}

/// Result of a locate/read/parse/validate pass. Settings are either fully
/// valid or treated as absent; there is no partially usable state.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Absent,
    Valid(Settings),
}

pub fn parse_settings(contents: &str) -> Result<Settings, AppError> {
    let settings: Settings =
        serde_json::from_str(contents).map_err(|e| AppError::InvalidSettings(e.to_string()))?;
    if settings.terminals.is_empty() {
        return Err(AppError::NoTerminals);
    }
    Ok(settings)
}

/// Full load pass against the workspace host. Emits at most one user
/// notification, matching the failure class.
#[instrument(skip(workspace))]
pub async fn load_settings(workspace: &dyn WorkspaceHost) -> LoadOutcome {
    let Some(path) = workspace.locate_settings().await else {
        debug!("settings file not found");
        return LoadOutcome::Absent;
    };

    let contents = match workspace.read_text(&path).await {
        Ok(contents) => contents,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read settings file");
            workspace
                .notify(NoticeKind::Error, "Invalid terminals.json file.", &[])
                .await;
            return LoadOutcome::Absent;
        }
    };

    match parse_settings(&contents) {
        Ok(settings) => {
            debug!(terminals = settings.terminals.len(), "settings loaded");
            LoadOutcome::Valid(settings)
        }
        Err(AppError::NoTerminals) => {
            workspace
                .notify(
                    NoticeKind::Error,
                    "No terminals specified in terminals.json.",
                    &[],
                )
                .await;
            LoadOutcome::Absent
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to parse settings file");
            workspace
                .notify(NoticeKind::Error, "Invalid terminals.json file.", &[])
                .await;
            LoadOutcome::Absent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_spec_fields() {
        let settings = parse_settings(
            r#"{
                "silence": true,
                "terminals": [
                    {
                        "name": "api",
                        "icon": "server",
                        "color": "terminal.ansiGreen",
                        "message": "api shell",
                        "path": "services/api",
                        "shellPath": "/bin/zsh",
                        "commands": ["npm install", "npm run dev"],
                        "focus": true
                    }
                ]
            }"#,
        )
        .unwrap();

        assert!(settings.silence);
        let spec = &settings.terminals[0];
        assert_eq!(spec.name, "api");
        assert_eq!(spec.shell_path.as_deref(), Some("/bin/zsh"));
        assert_eq!(spec.path.as_deref(), Some("services/api"));
        assert!(spec.wants_focus());
        let lines: Vec<&str> = spec.shell_lines().collect();
        assert_eq!(lines, vec!["npm install", "npm run dev"]);
    }

    #[test]
    fn malformed_json_is_a_parse_failure() {
        let err = parse_settings("{ not json").unwrap_err();
        assert!(matches!(err, AppError::InvalidSettings(_)));
    }

    #[test]
    fn empty_terminal_list_is_a_validation_failure() {
        let err = parse_settings(r#"{"terminals": []}"#).unwrap_err();
        assert!(matches!(err, AppError::NoTerminals));
    }

    #[test]
    fn missing_terminal_list_is_a_validation_failure() {
        let err = parse_settings(r#"{"silence": false}"#).unwrap_err();
        assert!(matches!(err, AppError::NoTerminals));
    }

    #[test]
    fn non_string_command_entries_are_skipped() {
        let settings = parse_settings(
            r#"{"terminals": [{"name": "a", "commands": ["echo one", 42, null, "echo two"]}]}"#,
        )
        .unwrap();
        let lines: Vec<&str> = settings.terminals[0].shell_lines().collect();
        assert_eq!(lines, vec!["echo one", "echo two"]);
    }

    #[test]
    fn silence_defaults_to_off() {
        let settings = parse_settings(r#"{"terminals": [{"name": "a"}]}"#).unwrap();
        assert!(!settings.silence);
        assert!(settings.terminals[0].shell_lines().next().is_none());
    }

    #[test]
    fn spec_without_name_is_a_parse_failure() {
        let err = parse_settings(r#"{"terminals": [{"icon": "zap"}]}"#).unwrap_err();
        assert!(matches!(err, AppError::InvalidSettings(_)));
    }
}
