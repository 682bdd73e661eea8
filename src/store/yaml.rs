use super::{
    BranchMapping, CiStore, JobFilter, JobSummary, RepoRecord, SettingRecord, SettingScope,
};
use crate::git;
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const STATE_FILE: &str = "state.yaml";
pub const JOBS_FILE: &str = "jobs.yaml";

const MAX_JOBS: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct State {
    #[serde(default)]
    repos: Vec<RepoRecord>,
    #[serde(default)]
    branch_mappings: Vec<BranchMapping>,
    #[serde(default)]
    settings: Vec<SettingRecord>,
}

/// [`CiStore`] backed by YAML files in the data directory.
///
/// Repository mirrors live under `<root>/repos/<owner>-<repo>`; the job engine
/// appends to `jobs.yaml`, which is only ever read here.
#[derive(Debug)]
pub struct YamlStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl YamlStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create data dir {}", root.display()))?;
        Ok(YamlStore {
            root,
            lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn state_path(&self) -> PathBuf {
        self.root.join(STATE_FILE)
    }

    fn read_state(&self) -> Result<State> {
        let path = self.state_path();
        if !path.exists() {
            return Ok(State::default());
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        if contents.trim().is_empty() {
            return Ok(State::default());
        }
        serde_yaml::from_str(&contents).with_context(|| format!("failed parsing {}", path.display()))
    }

    fn write_state(&self, state: &State) -> Result<()> {
        let path = self.state_path();
        let yaml = serde_yaml::to_string(state)?;
        let tmp = path.with_extension("yaml.tmp");
        fs::write(&tmp, yaml).with_context(|| format!("failed writing {}", tmp.display()))?;
        fs::rename(&tmp, &path).with_context(|| format!("failed replacing {}", path.display()))?;
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> Result<T> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        let state = self.read_state()?;
        Ok(f(&state))
    }

    fn modify(&self, f: impl FnOnce(&mut State)) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        let mut state = self.read_state()?;
        f(&mut state);
        self.write_state(&state)
    }

    fn repo_paths(&self, identifier: &str) -> [PathBuf; 3] {
        let local = git::local_repo_dir(identifier);
        [
            self.root.join("repos").join(&local),
            self.root.join("worktrees").join(&local),
            self.root.join("logs").join(&local),
        ]
    }
}

impl CiStore for YamlStore {
    fn list_repositories(&self) -> Result<Vec<RepoRecord>> {
        self.read(|state| state.repos.clone())
    }

    fn clone_repository(&self, identifier: &str, url: &str) -> Result<()> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            bail!("repo is empty");
        }
        let [mirror, _, _] = self.repo_paths(identifier);
        git::clone_mirror(url, &mirror)?;

        let record = RepoRecord {
            repo: identifier.to_string(),
            url: url.to_string(),
        };
        self.modify(|state| {
            match state.repos.iter_mut().find(|r| r.repo == record.repo) {
                Some(existing) => *existing = record,
                None => state.repos.push(record),
            }
        })
    }

    fn delete_repository(&self, identifier: &str) -> Result<()> {
        let target = identifier.trim();
        if target.is_empty() {
            bail!("repo is empty");
        }
        for path in self.repo_paths(target) {
            if path.exists() {
                fs::remove_dir_all(&path)
                    .with_context(|| format!("remove path {}", path.display()))?;
            }
        }
        self.modify(|state| {
            state.repos.retain(|r| r.repo != target);
            state.branch_mappings.retain(|m| m.repo != target);
            state.settings.retain(|s| s.repo != target);
        })
        .context("delete repo from store")
    }

    fn list_branch_mappings(&self, repo: &str) -> Result<Vec<BranchMapping>> {
        self.read(|state| {
            state
                .branch_mappings
                .iter()
                .filter(|m| m.repo == repo)
                .cloned()
                .collect()
        })
    }

    fn save_branch_mapping(&self, mapping: &BranchMapping) -> Result<()> {
        if mapping.repo.trim().is_empty() || mapping.ref_pattern.trim().is_empty() {
            bail!("branch mapping needs a repo and a ref pattern");
        }
        let mapping = mapping.clone();
        self.modify(|state| {
            match state
                .branch_mappings
                .iter_mut()
                .find(|m| m.repo == mapping.repo && m.ref_pattern == mapping.ref_pattern)
            {
                Some(existing) => *existing = mapping,
                None => state.branch_mappings.push(mapping),
            }
        })
    }

    fn delete_branch_mapping(&self, repo: &str, ref_pattern: &str) -> Result<()> {
        self.modify(|state| {
            state
                .branch_mappings
                .retain(|m| !(m.repo == repo && m.ref_pattern == ref_pattern));
        })
    }

    fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<JobSummary>> {
        let path = self.root.join(JOBS_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        let jobs: Vec<JobSummary> = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed parsing {}", path.display()))?;
        let mut jobs: Vec<JobSummary> = jobs
            .into_iter()
            .filter(|j| j.repo == filter.repo)
            .filter(|j| match &filter.ref_pattern {
                Some(pattern) => &j.ref_name == pattern,
                None => true,
            })
            .collect();
        jobs.sort_by(|a, b| b.start.cmp(&a.start));
        jobs.truncate(MAX_JOBS);
        Ok(jobs)
    }

    fn list_settings(&self, scope: &SettingScope) -> Result<Vec<SettingRecord>> {
        self.read(|state| {
            state
                .settings
                .iter()
                .filter(|s| s.repo == scope.as_str())
                .cloned()
                .collect()
        })
    }

    fn save_setting(&self, scope: &SettingScope, key: &str, value: &str) -> Result<()> {
        if key.trim().is_empty() {
            bail!("setting key is empty");
        }
        let record = SettingRecord {
            repo: scope.as_str().to_string(),
            key: key.to_string(),
            value: value.to_string(),
        };
        self.modify(|state| {
            match state
                .settings
                .iter_mut()
                .find(|s| s.repo == record.repo && s.key == record.key)
            {
                Some(existing) => *existing = record,
                None => state.settings.push(record),
            }
        })
    }

    fn delete_setting(&self, scope: &SettingScope, key: &str) -> Result<()> {
        self.modify(|state| {
            state
                .settings
                .retain(|s| !(s.repo == scope.as_str() && s.key == key));
        })
    }
}
