//! Messages consumed by the UI loop and the commands that produce them.

use crate::store::{
    BranchMapping, CiStore, JobFilter, JobSummary, RepoRecord, SettingRecord, SettingScope,
};
use anyhow::Result;
use chrono::{DateTime, Local};
use crossterm::event::KeyEvent;

/// One event for the UI loop: input, clock, or the result of a finished command.
#[derive(Debug)]
pub enum Msg {
    Key(KeyEvent),
    Resize(u16, u16),
    Tick(DateTime<Local>),

    ReposLoaded(Result<Vec<RepoRecord>>),
    RepoCloned {
        record: RepoRecord,
        result: Result<()>,
    },
    RepoDeleted {
        repo: String,
        result: Result<()>,
    },

    MappingsLoaded {
        repo: String,
        result: Result<Vec<BranchMapping>>,
    },
    MappingSaved {
        mapping: BranchMapping,
        result: Result<()>,
    },
    MappingDeleted {
        repo: String,
        ref_pattern: String,
        result: Result<()>,
    },
    JobsLoaded {
        filter: JobFilter,
        result: Result<Vec<JobSummary>>,
    },

    SettingsLoaded {
        scope: SettingScope,
        result: Result<Vec<SettingRecord>>,
    },
    SettingSaved {
        scope: SettingScope,
        key: String,
        value: String,
        result: Result<()>,
    },
    SettingDeleted {
        scope: SettingScope,
        key: String,
        result: Result<()>,
    },
}

/// A side-effecting operation against the store.
///
/// Commands are plain data; [`Command::execute`] performs the call and wraps
/// the outcome in the message that re-enters the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ListRepositories,
    CloneRepository { identifier: String, url: String },
    DeleteRepository { identifier: String },
    ListBranchMappings { repo: String },
    SaveBranchMapping(BranchMapping),
    DeleteBranchMapping { repo: String, ref_pattern: String },
    ListJobs(JobFilter),
    ListSettings(SettingScope),
    SaveSetting {
        scope: SettingScope,
        key: String,
        value: String,
    },
    DeleteSetting { scope: SettingScope, key: String },
}

impl Command {
    pub fn label(&self) -> &'static str {
        match self {
            Command::ListRepositories => "list_repositories",
            Command::CloneRepository { .. } => "clone_repository",
            Command::DeleteRepository { .. } => "delete_repository",
            Command::ListBranchMappings { .. } => "list_branch_mappings",
            Command::SaveBranchMapping(_) => "save_branch_mapping",
            Command::DeleteBranchMapping { .. } => "delete_branch_mapping",
            Command::ListJobs(_) => "list_jobs",
            Command::ListSettings(_) => "list_settings",
            Command::SaveSetting { .. } => "save_setting",
            Command::DeleteSetting { .. } => "delete_setting",
        }
    }

    /// Run the operation to completion. Blocks the calling thread.
    pub fn execute(self, store: &dyn CiStore) -> Msg {
        match self {
            Command::ListRepositories => Msg::ReposLoaded(store.list_repositories()),
            Command::CloneRepository { identifier, url } => {
                let result = store.clone_repository(&identifier, &url);
                Msg::RepoCloned {
                    record: RepoRecord {
                        repo: identifier,
                        url,
                    },
                    result,
                }
            }
            Command::DeleteRepository { identifier } => {
                let result = store.delete_repository(&identifier);
                Msg::RepoDeleted {
                    repo: identifier,
                    result,
                }
            }
            Command::ListBranchMappings { repo } => {
                let result = store.list_branch_mappings(&repo);
                Msg::MappingsLoaded { repo, result }
            }
            Command::SaveBranchMapping(mapping) => {
                let result = store.save_branch_mapping(&mapping);
                Msg::MappingSaved { mapping, result }
            }
            Command::DeleteBranchMapping { repo, ref_pattern } => {
                let result = store.delete_branch_mapping(&repo, &ref_pattern);
                Msg::MappingDeleted {
                    repo,
                    ref_pattern,
                    result,
                }
            }
            Command::ListJobs(filter) => {
                let result = store.list_jobs(&filter);
                Msg::JobsLoaded { filter, result }
            }
            Command::ListSettings(scope) => {
                let result = store.list_settings(&scope);
                Msg::SettingsLoaded { scope, result }
            }
            Command::SaveSetting { scope, key, value } => {
                let result = store.save_setting(&scope, &key, &value);
                Msg::SettingSaved {
                    scope,
                    key,
                    value,
                    result,
                }
            }
            Command::DeleteSetting { scope, key } => {
                let result = store.delete_setting(&scope, &key);
                Msg::SettingDeleted { scope, key, result }
            }
        }
    }
}

/// What a panel did with a key press.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Reply {
    /// The key was consumed; parents must not reinterpret it.
    pub handled: bool,
    pub commands: Vec<Command>,
    /// Repository the user asked to open.
    pub open_repo: Option<String>,
}

impl Reply {
    pub fn ignored() -> Self {
        Reply::default()
    }

    pub fn consumed() -> Self {
        Reply {
            handled: true,
            ..Reply::default()
        }
    }

    pub fn with_commands(commands: Vec<Command>) -> Self {
        Reply {
            handled: true,
            commands,
            open_repo: None,
        }
    }

    pub fn open(repo: String) -> Self {
        Reply {
            handled: true,
            commands: Vec::new(),
            open_repo: Some(repo),
        }
    }
}
