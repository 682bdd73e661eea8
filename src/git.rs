use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;
use std::process::Command;

const GITHUB_HOST: &str = "github.com";

fn run_git(dir: Option<&Path>, args: &[&str]) -> Result<String> {
    let mut cmd = Command::new("git");
    cmd.args(args);
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }
    let output = cmd
        .output()
        .with_context(|| format!("failed to run git {:?}", args))?;

    if !output.status.success() {
        return Err(anyhow!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Derive the `owner/repo` identifier from a GitHub remote URL.
///
/// Accepts `https://`, `http://` and `ssh://git@` URLs as well as the scp-like
/// `git@github.com:owner/repo.git` form. Returns `None` for any other host or
/// for paths that do not have exactly an owner and a repository segment.
pub fn parse_github_url(url: &str) -> Option<String> {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();

    let path = if let Some(rest) = strip_prefix_ci(url, &lower, "git@") {
        let (host, path) = rest.split_once(':')?;
        if !host.eq_ignore_ascii_case(GITHUB_HOST) {
            return None;
        }
        path
    } else {
        let rest = ["https://", "http://", "ssh://"]
            .iter()
            .find_map(|scheme| strip_prefix_ci(url, &lower, scheme))?;
        let rest = match rest.split_once('@') {
            Some((_, after)) => after,
            None => rest,
        };
        let (host, path) = rest.split_once('/')?;
        let host = host.split(':').next().unwrap_or(host);
        if !host.eq_ignore_ascii_case(GITHUB_HOST) && !host.eq_ignore_ascii_case("www.github.com")
        {
            return None;
        }
        path
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut parts = path.split('/');
    let owner = parts.next()?.trim();
    let repo = parts.next()?.trim();
    if parts.next().is_some() || owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some(format!("{}/{}", owner, repo))
}

fn strip_prefix_ci<'a>(url: &'a str, lower: &str, prefix: &str) -> Option<&'a str> {
    if lower.starts_with(prefix) {
        Some(&url[prefix.len()..])
    } else {
        None
    }
}

/// Directory name used on disk for a repository identifier (`owner/repo` -> `owner-repo`).
pub fn local_repo_dir(identifier: &str) -> String {
    identifier.trim().replace('/', "-")
}

/// Mirror-clone `url` into `dest`. An existing mirror is left untouched.
pub fn clone_mirror(url: &str, dest: &Path) -> Result<()> {
    if dest.join("HEAD").exists() {
        return Ok(());
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let dest_str = dest
        .to_str()
        .ok_or_else(|| anyhow!("mirror path is not valid UTF-8: {}", dest.display()))?;
    run_git(None, &["clone", "--mirror", url, dest_str])
        .with_context(|| format!("failed to clone {}", url))?;
    Ok(())
}
