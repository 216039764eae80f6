use std::{
    io,
    path::PathBuf,
    process::{Command, Output},
};

use tracing::debug;

use crate::services::{ServiceError, VcsContext};

/// Reads the `origin` remote and current branch with the git CLI.
#[derive(Debug, Clone, Default)]
pub struct GitContext {
    dir: Option<PathBuf>,
}

impl GitContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run git in `dir` instead of the process working directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    fn run_git(&self, args: &[&str]) -> Result<String, ServiceError> {
        let mut command = Command::new("git");
        command.args(args);
        if let Some(dir) = &self.dir {
            command.current_dir(dir);
        }
        let output = command.output().map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => ServiceError::Unavailable("git"),
            _ => ServiceError::io(format!("failed to execute git: {err}")),
        })?;
        if !output.status.success() {
            return Err(command_failed(args, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

fn command_failed(args: &[&str], output: &Output) -> ServiceError {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let detail = if stderr.is_empty() {
        format!("exit status {}", output.status)
    } else {
        stderr
    };
    ServiceError::io(format!("git {} failed: {detail}", args.join(" ")))
}

impl VcsContext for GitContext {
    fn current_repo_and_branch(&self) -> Result<(String, String), ServiceError> {
        let url = self.run_git(&["remote", "get-url", "origin"])?;
        let repo = normalize_remote(&url)
            .ok_or_else(|| ServiceError::io(format!("cannot derive owner/repo from {url}")))?;
        let branch = self.run_git(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        let branch = if branch == "HEAD" {
            String::new()
        } else {
            branch
        };
        debug!(%repo, %branch, "detected git context");
        Ok((repo, branch))
    }
}

/// `git@host:owner/repo.git`, `https://host/owner/repo` and `ssh://` forms all
/// map to `owner/repo`.
pub fn normalize_remote(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let path = match trimmed.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, path)| path)?,
        None => match trimmed.split_once(':') {
            Some((_, path)) => path,
            None => trimmed,
        },
    };
    let mut segments = path.rsplit('/').filter(|segment| !segment.is_empty());
    let name = segments.next()?;
    let owner = segments.next()?;
    Some(format!("{owner}/{name}"))
}
