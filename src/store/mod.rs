//! Repository-access interface consumed by the console.
//!
//! The console never touches persistence or git directly: every I/O goes
//! through [`CiStore`], invoked from background commands.

mod yaml;

pub use yaml::YamlStore;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Pseudo-repository name that holds global settings.
pub const GLOBAL_SETTINGS_REPO: &str = "global_sys";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRecord {
    pub repo: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchMapping {
    pub repo: String,
    pub ref_pattern: String,
    pub script_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Pending,
    Running,
    Finished,
    Failed,
    Canceled,
    #[default]
    Unknown,
}

impl JobStatus {
    pub fn parse(raw: &str) -> JobStatus {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => JobStatus::Pending,
            "RUNNING" => JobStatus::Running,
            "FINISHED" => JobStatus::Finished,
            "FAILED" => JobStatus::Failed,
            "CANCELED" => JobStatus::Canceled,
            _ => JobStatus::Unknown,
        }
    }
}

/// Reads status names the same way [`JobStatus::parse`] does; a null is unknown.
impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| JobStatus::parse(&s)).unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub ref_name: String,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub commit_sha: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobFilter {
    pub repo: String,
    /// Restrict to one ref; `None` lists jobs of every ref.
    pub ref_pattern: Option<String>,
}

/// Where a setting lives: the reserved global bucket or one repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SettingScope {
    Global,
    Repo(String),
}

impl SettingScope {
    pub fn from_repo(repo: &str) -> SettingScope {
        if repo == GLOBAL_SETTINGS_REPO {
            SettingScope::Global
        } else {
            SettingScope::Repo(repo.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SettingScope::Global => GLOBAL_SETTINGS_REPO,
            SettingScope::Repo(repo) => repo,
        }
    }
}

impl fmt::Display for SettingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingRecord {
    pub repo: String,
    pub key: String,
    pub value: String,
}

/// Persistence, git mirror management and job history, as seen by the console.
///
/// Every call is blocking; the console wraps each one in a background command.
pub trait CiStore: Send + Sync {
    fn list_repositories(&self) -> Result<Vec<RepoRecord>>;
    fn clone_repository(&self, identifier: &str, url: &str) -> Result<()>;
    fn delete_repository(&self, identifier: &str) -> Result<()>;

    fn list_branch_mappings(&self, repo: &str) -> Result<Vec<BranchMapping>>;
    fn save_branch_mapping(&self, mapping: &BranchMapping) -> Result<()>;
    fn delete_branch_mapping(&self, repo: &str, ref_pattern: &str) -> Result<()>;

    fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<JobSummary>>;

    fn list_settings(&self, scope: &SettingScope) -> Result<Vec<SettingRecord>>;
    fn save_setting(&self, scope: &SettingScope, key: &str, value: &str) -> Result<()>;
    fn delete_setting(&self, scope: &SettingScope, key: &str) -> Result<()>;
}
