//! Revision oracle backed by the `git` command line.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

use crate::error::{DockerlibError, Result};

pub trait RevisionOracle {
    /// Most recent first-parent revision of HEAD that touched `path`.
    fn latest_revision(&self, path: &Path) -> Result<String>;

    /// Whether the tree under `path` differs between two revisions.
    fn tree_differs(&self, from: &str, to: &str, path: &Path) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub struct GitCli {
    work_dir: PathBuf,
}

impl GitCli {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        debug!(?args, "running git");
        Command::new("git")
            .args(args)
            .current_dir(&self.work_dir)
            .output()
            .map_err(DockerlibError::Io)
    }
}

impl RevisionOracle for GitCli {
    fn latest_revision(&self, path: &Path) -> Result<String> {
        let path = if path.as_os_str().is_empty() {
            ".".to_string()
        } else {
            path.to_string_lossy().into_owned()
        };
        let args = ["rev-list", "-1", "--first-parent", "HEAD", "--", path.as_str()];
        let output = self.run(&args)?;
        if !output.status.success() {
            return Err(git_error(&args, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn tree_differs(&self, from: &str, to: &str, path: &Path) -> Result<bool> {
        let path = path.to_string_lossy().into_owned();
        let args = ["diff", "--quiet", from, to, "--", path.as_str()];
        let output = self.run(&args)?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(git_error(&args, &output)),
        }
    }
}

fn git_error(args: &[&str], output: &Output) -> DockerlibError {
    DockerlibError::Git {
        command: args.join(" "),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}
