use crate::analyzer::{Analyzer, ProjectReport, SourceLinks};
use crate::config::ProjectConfig;
use crate::highlight::Highlighter;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Name of the per-project report inside `<output>/<project>/`.
pub const PROJECT_REPORT_FILE: &str = "project.json";
/// Name of the site-wide index inside `<output>/`.
pub const SITE_INDEX_FILE: &str = "index.json";

/// Headline numbers for the site index.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub name: String,
    pub title: String,
    pub description: String,
    pub total: usize,
    pub total_files: usize,
    pub main_count: usize,
    pub helper_count: usize,
    pub theorem_count: usize,
    pub total_dependencies: usize,
}

impl ProjectSummary {
    pub fn from_report(report: &ProjectReport) -> Self {
        Self {
            name: report.name.clone(),
            title: report.title.clone(),
            description: report.description.clone(),
            total: report.stats.total,
            total_files: report.stats.total_files,
            main_count: report.stats.main_count,
            helper_count: report.stats.helper_count,
            theorem_count: report.stats.theorem_count,
            total_dependencies: report.stats.total_dependencies,
        }
    }
}

/// Site-wide index listing every built project.
#[derive(Debug, Clone, Serialize)]
pub struct SiteIndex {
    pub projects: Vec<ProjectSummary>,
}

/// Analyzes one configured project whose sources live under `root`.
pub fn build_report(
    analyzer: &Analyzer,
    config: &ProjectConfig,
    root: &Path,
    highlighter: Option<&Highlighter<'_>>,
) -> Result<ProjectReport> {
    let directories: Vec<PathBuf> = config.source.directories.iter().map(PathBuf::from).collect();
    let project = analyzer.analyze(&config.name, root, &directories)?;

    let mut report = project.report(highlighter);
    report.title = config.title.clone();
    report.description = config.description.clone();
    report.links = match (config.blob_base(), config.raw_base()) {
        (Some(blob_base), Some(raw_base)) => Some(SourceLinks { blob_base, raw_base }),
        _ => None,
    };
    report.overview = config.index.as_ref().and_then(|index| {
        let path = root.join(index);
        match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("overview {} not readable: {}", path.display(), e);
                None
            }
        }
    });

    Ok(report)
}

/// Writes `<output>/<name>/project.json` and returns the file's path.
pub fn write_report(report: &ProjectReport, output: &Path) -> Result<PathBuf> {
    let dir = output.join(&report.name);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let path = dir.join(PROJECT_REPORT_FILE);
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(path)
}

/// Writes `<output>/index.json` listing the given projects.
pub fn write_site_index(summaries: &[ProjectSummary], output: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))?;

    let index = SiteIndex {
        projects: summaries.to_vec(),
    };
    let path = output.join(SITE_INDEX_FILE);
    fs::write(&path, serde_json::to_string_pretty(&index)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
