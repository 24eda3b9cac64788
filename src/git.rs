//! Git repository metadata extraction.

use crate::error::{DragnetError, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;

/// What the scan target sits inside: a git repository, or a plain
/// folder.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RepoMetadata {
    Git(GitRepo),
    Folder,
}

impl RepoMetadata {
    /// `owner/name` for telemetry payloads; empty for plain folders.
    pub fn full_name(&self) -> String {
        match self {
            RepoMetadata::Git(repo) => format!("{}/{}", repo.owner, repo.name),
            RepoMetadata::Folder => String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GitRepo {
    /// Host the origin remote points at, e.g. `github.com`.
    pub source: String,
    pub owner: String,
    pub name: String,
    pub branch: String,
    pub commit: CommitInfo,
    pub tags: Vec<String>,
    pub contributors: Vec<Contributor>,
    #[serde(skip)]
    pub root: PathBuf,
    #[serde(skip)]
    pub origin_url: String,
    #[serde(skip)]
    pub https_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitInfo {
    pub id: String,
    pub short: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Contributor {
    pub name: String,
    pub email: String,
}

/// Collect repository metadata for the scan target.
///
/// A target outside any git work tree is a plain folder, not an error;
/// a git invocation failing inside a work tree is.
pub fn metadata(target: &Path) -> Result<RepoMetadata> {
    match git_output(target, &["rev-parse", "--is-inside-work-tree"]) {
        Ok(output) if output == "true" => {}
        _ => return Ok(RepoMetadata::Folder),
    }

    let root = PathBuf::from(git_output(target, &["rev-parse", "--show-toplevel"])?);
    let origin_url = git_output(target, &["config", "--get", "remote.origin.url"])?;
    let (https_url, source, owner, name) = parse_origin(&origin_url)?;
    let branch = git_output(target, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    let id = git_output(target, &["rev-parse", "HEAD"])?;
    let short = git_output(target, &["rev-parse", "--short", "HEAD"])?;
    let time = git_output(target, &["show", "-s", "--format=%cI", "HEAD"])?;
    let tags = git_output(target, &["tag", "--points-at", "HEAD"])?
        .lines()
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect();
    let contributors = contributors(target)?;

    Ok(RepoMetadata::Git(GitRepo {
        source,
        owner,
        name,
        branch,
        commit: CommitInfo { id, short, time },
        tags,
        contributors,
        root,
        origin_url,
        https_url,
    }))
}

/// Unique authors and committers across the full history.
fn contributors(target: &Path) -> Result<Vec<Contributor>> {
    let log = git_output(
        target,
        &["log", "--pretty=format:%an%x09%ae%n%cn%x09%ce"],
    )?;
    let unique: BTreeSet<Contributor> = log
        .lines()
        .filter_map(|line| {
            let (name, email) = line.split_once('\t')?;
            Some(Contributor {
                name: name.to_string(),
                email: email.to_string(),
            })
        })
        .collect();
    Ok(unique.into_iter().collect())
}

fn git_output(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .map_err(|e| DragnetError::Git {
            args: args.join(" "),
            message: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(DragnetError::Git {
            args: args.join(" "),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Normalize a git origin URL to https and split out host, owner, and
/// repository name.
fn parse_origin(origin: &str) -> Result<(String, String, String, String)> {
    let scp_form = Regex::new(r"^git@([^:/]+):(.+)$")?;
    let ssh_form = Regex::new(r"^ssh://(?:[^@/]+@)?([^:/]+)(?::\d+)?/(.+)$")?;
    let http_form = Regex::new(r"^https?://(?:[^@/]+@)?([^:/]+)/(.+)$")?;

    let (host, path) = if let Some(caps) = scp_form.captures(origin) {
        (caps[1].to_string(), caps[2].to_string())
    } else if let Some(caps) = ssh_form.captures(origin) {
        (caps[1].to_string(), caps[2].to_string())
    } else if let Some(caps) = http_form.captures(origin) {
        (caps[1].to_string(), caps[2].to_string())
    } else {
        return Err(DragnetError::Git {
            args: "config --get remote.origin.url".to_string(),
            message: format!("unrecognized origin URL: {origin}"),
        });
    };

    let trimmed = path.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let mut segments = trimmed.rsplit('/');
    let name = segments.next().unwrap_or_default().to_string();
    let owner = segments.next().unwrap_or_default().to_string();
    let https_url = format!("https://{host}/{trimmed}");

    Ok((https_url, host, owner, name))
}
