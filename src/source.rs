use crate::config::SourceConfig;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::info;

/// A directory holding a project's sources for the duration of a build.
pub enum Checkout {
    /// An existing directory, left untouched.
    Local(PathBuf),
    /// A fresh clone, deleted when the checkout is dropped.
    Cloned(TempDir),
}

impl Checkout {
    pub fn local(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_dir() {
            bail!("Local source not found: {}", path.display());
        }
        Ok(Checkout::Local(path))
    }

    /// Clones the configured repository with `git`, at the pinned commit when
    /// one is given, otherwise at the tip of the branch.
    pub fn clone_repo(source: &SourceConfig) -> Result<Self> {
        let dir = TempDir::new().context("Failed to create a temporary directory")?;
        let dest = dir.path().to_string_lossy().to_string();

        info!("cloning {} ({})", source.repo, source.branch);
        let mut clone = vec!["clone", "--branch", source.branch.as_str()];
        if source.commit.is_none() {
            // Only the tip is needed without a pin.
            clone.extend(["--depth", "1"]);
        }
        clone.extend([source.repo.as_str(), dest.as_str()]);
        run_git(&clone, None)?;

        if let Some(commit) = &source.commit {
            info!("checking out {}", commit);
            run_git(&["checkout", "--detach", commit.as_str()], Some(dir.path()))?;
        }

        Ok(Checkout::Cloned(dir))
    }

    pub fn root(&self) -> &Path {
        match self {
            Checkout::Local(path) => path,
            Checkout::Cloned(dir) => dir.path(),
        }
    }
}

fn run_git(args: &[&str], cwd: Option<&Path>) -> Result<()> {
    let mut command = Command::new("git");
    command.args(args);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }
    let output = command
        .output()
        .with_context(|| format!("Failed to run git {}", args.join(" ")))?;
    if !output.status.success() {
        bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}
