use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Where a project's proof sources come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Git URL of the repository.
    pub repo: String,
    pub branch: String,
    /// Exact revision to build. Takes precedence over `branch` when set.
    #[serde(default)]
    pub commit: Option<String>,
    /// Directories scanned for `.v` files, relative to the repository root.
    #[serde(default)]
    pub directories: Vec<String>,
}

/// One documentation build target, read from a YAML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Short identifier, used as the output directory name.
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub source: SourceConfig,
    /// Overview document, relative to the repository root.
    #[serde(default)]
    pub index: Option<String>,
}

impl ProjectConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("Invalid project configuration")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read project file {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("Invalid project configuration in {}", path.display()))
    }

    /// The pinned commit if any, otherwise the branch.
    pub fn revision(&self) -> &str {
        self.source.commit.as_deref().unwrap_or(&self.source.branch)
    }

    /// `owner/repo` for GitHub-hosted repositories.
    pub fn github_slug(&self) -> Option<String> {
        let repo = self.source.repo.trim_end_matches('/');
        let repo = repo.strip_suffix(".git").unwrap_or(repo);
        let slug = repo
            .strip_prefix("https://github.com/")
            .or_else(|| repo.strip_prefix("git@github.com:"))?;
        Some(slug.to_string())
    }

    /// Base URL for browsing files on GitHub.
    pub fn blob_base(&self) -> Option<String> {
        self.github_slug()
            .map(|slug| format!("https://github.com/{}/blob/{}", slug, self.revision()))
    }

    /// Base URL for fetching raw file contents.
    pub fn raw_base(&self) -> Option<String> {
        self.github_slug().map(|slug| {
            format!(
                "https://raw.githubusercontent.com/{}/{}",
                slug,
                self.revision()
            )
        })
    }
}

/// Loads every `*.yaml` / `*.yml` file of a directory, sorted by file name.
pub fn load_project_dir(dir: &Path) -> Result<Vec<ProjectConfig>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to list project directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .map_or(false, |ext| ext == "yaml" || ext == "yml")
        })
        .collect();
    paths.sort();

    paths.iter().map(|path| ProjectConfig::from_path(path)).collect()
}
