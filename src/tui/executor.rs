use crate::store::CiStore;
use crate::tui::message::{Command, Msg};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

/// Runs commands off the UI thread and funnels their results back as messages.
pub struct CommandRunner {
    store: Arc<dyn CiStore>,
    handle: Handle,
    tx: UnboundedSender<Msg>,
}

impl CommandRunner {
    pub fn new(store: Arc<dyn CiStore>, handle: Handle) -> (Self, UnboundedReceiver<Msg>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (CommandRunner { store, handle, tx }, rx)
    }

    /// Start every command; returns immediately.
    pub fn dispatch(&self, commands: Vec<Command>) {
        for command in commands {
            let store = Arc::clone(&self.store);
            let tx = self.tx.clone();
            let label = command.label();
            debug!(command = label, "dispatching command");
            self.handle.spawn_blocking(move || {
                let msg = command.execute(store.as_ref());
                if let Some(err) = failure(&msg) {
                    warn!(command = label, error = %err, "command failed");
                } else {
                    debug!(command = label, "command finished");
                }
                if tx.send(msg).is_err() {
                    debug!(command = label, "ui loop gone, dropping result");
                }
            });
        }
    }
}

fn failure(msg: &Msg) -> Option<&anyhow::Error> {
    match msg {
        Msg::Key(_) | Msg::Resize(..) | Msg::Tick(_) => None,
        Msg::ReposLoaded(result) => result.as_ref().err(),
        Msg::MappingsLoaded { result, .. } => result.as_ref().err(),
        Msg::JobsLoaded { result, .. } => result.as_ref().err(),
        Msg::SettingsLoaded { result, .. } => result.as_ref().err(),
        Msg::RepoCloned { result, .. }
        | Msg::RepoDeleted { result, .. }
        | Msg::MappingSaved { result, .. }
        | Msg::MappingDeleted { result, .. }
        | Msg::SettingSaved { result, .. }
        | Msg::SettingDeleted { result, .. } => result.as_ref().err(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::YamlStore;

    #[test]
    fn results_come_back_through_the_channel() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn CiStore> = Arc::new(YamlStore::open(dir.path()).unwrap());
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .build()
            .unwrap();
        let (runner, mut rx) = CommandRunner::new(store, runtime.handle().clone());

        runner.dispatch(vec![
            Command::ListRepositories,
            Command::ListBranchMappings {
                repo: "acme/api".to_string(),
            },
        ]);

        let mut saw_repos = false;
        let mut saw_mappings = false;
        for _ in 0..2 {
            match rx.blocking_recv().unwrap() {
                Msg::ReposLoaded(result) => {
                    assert!(result.unwrap().is_empty());
                    saw_repos = true;
                }
                Msg::MappingsLoaded { repo, result } => {
                    assert_eq!(repo, "acme/api");
                    assert!(result.unwrap().is_empty());
                    saw_mappings = true;
                }
                other => panic!("unexpected message {:?}", other),
            }
        }
        assert!(saw_repos && saw_mappings);
    }
}
