use super::{load_settings, SettingsStore};
use crate::config::{SETTINGS_DIR, SETTINGS_FILE};
use crate::host::WorkspaceHost;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Watcher-relevant happenings on the settings path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsEvent {
    /// Created or changed.
    Touched,
    Removed,
}

/// What the event loop should do with an incoming event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchAction {
    Refresh,
    Clear,
    Ignore,
}

/// Two-state debounce. A refresh opens a cooldown window during which
/// further Touched events are dropped, not queued. Removed events never
/// consult it and never move the timer.
#[derive(Debug)]
struct Debouncer {
    window: Duration,
    state: DebounceState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceState {
    Idle,
    Cooldown { until: Instant },
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Self {
            window,
            state: DebounceState::Idle,
        }
    }

    /// True when the event may trigger a refresh pass. Admission starts
    /// the next cooldown window.
    fn admit(&mut self, now: Instant) -> bool {
        if let DebounceState::Cooldown { until } = self.state {
            if now < until {
                return false;
            }
        }
        self.state = DebounceState::Cooldown {
            until: now + self.window,
        };
        true
    }
}

fn next_action(debouncer: &mut Debouncer, event: SettingsEvent, now: Instant) -> WatchAction {
    match event {
        SettingsEvent::Removed => WatchAction::Clear,
        SettingsEvent::Touched if debouncer.admit(now) => WatchAction::Refresh,
        SettingsEvent::Touched => WatchAction::Ignore,
    }
}

fn is_settings_path(path: &Path) -> bool {
    path.ends_with(PathBuf::from(SETTINGS_DIR).join(SETTINGS_FILE))
}

fn classify(event: &notify::Event) -> Option<SettingsEvent> {
    use notify::EventKind;

    if !event.paths.iter().any(|p| is_settings_path(p)) {
        return None;
    }
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) => Some(SettingsEvent::Touched),
        EventKind::Remove(_) => Some(SettingsEvent::Removed),
        _ => None,
    }
}

/// Filesystem subscription for the fixed settings path, driving store
/// refreshes. The watch is installed recursively on the workspace root so
/// that creation of the settings directory itself is observed.
pub struct SettingsWatcher {
    // Dropping the watcher tears down the OS subscription.
    _watcher: RecommendedWatcher,
    task: tokio::task::JoinHandle<()>,
}

impl SettingsWatcher {
    pub fn install(
        root: &Path,
        store: Arc<SettingsStore>,
        workspace: Arc<dyn WorkspaceHost>,
        cooldown: Duration,
    ) -> notify::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    if let Some(settings_event) = classify(&event) {
                        let _ = tx.send(settings_event);
                    }
                }
                Err(err) => warn!(error = %err, "settings watcher error"),
            })?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        info!(root = %root.display(), "settings watcher installed");

        let task = tokio::spawn(run_event_loop(rx, store, workspace, cooldown));
        Ok(Self {
            _watcher: watcher,
            task,
        })
    }
}

impl Drop for SettingsWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_event_loop(
    mut rx: mpsc::UnboundedReceiver<SettingsEvent>,
    store: Arc<SettingsStore>,
    workspace: Arc<dyn WorkspaceHost>,
    cooldown: Duration,
) {
    let mut debouncer = Debouncer::new(cooldown);
    while let Some(event) = rx.recv().await {
        match next_action(&mut debouncer, event, Instant::now()) {
            WatchAction::Clear => {
                info!("settings file deleted, clearing cached settings");
                store.clear();
            }
            WatchAction::Refresh => {
                debug!("settings file touched, running refresh pass");
                let outcome = load_settings(workspace.as_ref()).await;
                store.apply_refresh(outcome);
            }
            WatchAction::Ignore => {
                debug!("settings change ignored during cooldown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};
    use notify::EventKind;

    const WINDOW: Duration = Duration::from_millis(2000);

    fn settings_event(kind: EventKind) -> notify::Event {
        notify::Event::new(kind).add_path(PathBuf::from("/ws/.termdeck/terminals.json"))
    }

    #[test]
    fn two_touches_inside_the_window_admit_once() {
        let mut debouncer = Debouncer::new(WINDOW);
        let t0 = Instant::now();

        assert_eq!(
            next_action(&mut debouncer, SettingsEvent::Touched, t0),
            WatchAction::Refresh
        );
        assert_eq!(
            next_action(
                &mut debouncer,
                SettingsEvent::Touched,
                t0 + Duration::from_millis(500)
            ),
            WatchAction::Ignore
        );
    }

    #[test]
    fn touch_after_the_window_admits_again() {
        let mut debouncer = Debouncer::new(WINDOW);
        let t0 = Instant::now();

        assert_eq!(
            next_action(&mut debouncer, SettingsEvent::Touched, t0),
            WatchAction::Refresh
        );
        assert_eq!(
            next_action(
                &mut debouncer,
                SettingsEvent::Touched,
                t0 + Duration::from_millis(2500)
            ),
            WatchAction::Refresh
        );
    }

    #[test]
    fn removal_clears_without_touching_the_cooldown() {
        let mut debouncer = Debouncer::new(WINDOW);
        let t0 = Instant::now();

        assert_eq!(
            next_action(&mut debouncer, SettingsEvent::Touched, t0),
            WatchAction::Refresh
        );
        // Delete during cooldown still clears...
        assert_eq!(
            next_action(
                &mut debouncer,
                SettingsEvent::Removed,
                t0 + Duration::from_millis(100)
            ),
            WatchAction::Clear
        );
        // ...and neither resets nor extends the running window.
        assert_eq!(
            next_action(
                &mut debouncer,
                SettingsEvent::Touched,
                t0 + Duration::from_millis(1500)
            ),
            WatchAction::Ignore
        );
        assert_eq!(
            next_action(
                &mut debouncer,
                SettingsEvent::Touched,
                t0 + Duration::from_millis(2100)
            ),
            WatchAction::Refresh
        );
    }

    #[test]
    fn classifies_create_change_and_remove() {
        assert_eq!(
            classify(&settings_event(EventKind::Create(CreateKind::File))),
            Some(SettingsEvent::Touched)
        );
        assert_eq!(
            classify(&settings_event(EventKind::Modify(ModifyKind::Any))),
            Some(SettingsEvent::Touched)
        );
        assert_eq!(
            classify(&settings_event(EventKind::Remove(RemoveKind::File))),
            Some(SettingsEvent::Removed)
        );
    }

    #[test]
    fn ignores_events_for_other_paths() {
        let event = notify::Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/ws/src/main.rs"));
        assert_eq!(classify(&event), None);
    }
}
