//! Project assembly: file collection, scanning, resolution and reporting.

use crate::extract::highlight_declaration;
use crate::highlight::{HighlightedToken, Highlighter};
use crate::resolver::{resolve, DependencyEdge, DependencyGraph};
use crate::scanner::{Declaration, Scanner, SourceFile, FALLBACK_WINDOW};
use crate::stats::ProjectStats;
use anyhow::{bail, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Links from declarations back to the hosted sources.
#[derive(Debug, Clone, Serialize)]
pub struct SourceLinks {
    /// Prefix for browsing a file, e.g. `https://github.com/o/r/blob/main`.
    pub blob_base: String,
    /// Prefix for fetching a file's raw text.
    pub raw_base: String,
}

/// Everything the rendering layer needs for one project.
/// This struct is serialized to JSON.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    pub name: String,
    pub title: String,
    pub description: String,
    /// Scanned files, relative to the project root.
    pub files: Vec<String>,
    pub declarations: Vec<Declaration>,
    pub edges: Vec<DependencyEdge>,
    /// Declarations that take part in a reference cycle.
    pub cycle_members: BTreeSet<String>,
    pub stats: ProjectStats,
    /// Highlighted body of each declaration, when requested.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub highlights: BTreeMap<String, Vec<HighlightedToken>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<SourceLinks>,
    /// Raw text of the project's overview document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
}

/// The parsed files of one build target with their declarations and graph.
pub struct Project {
    pub name: String,
    pub files: Vec<SourceFile>,
    pub declarations: Vec<Declaration>,
    pub graph: DependencyGraph,
}

impl Project {
    /// Scans every file, then resolves dependencies once all names are known.
    pub fn build(name: impl Into<String>, files: Vec<SourceFile>, fallback_window: usize) -> Self {
        let name = name.into();
        let mut declarations = Vec::new();

        for file in &files {
            let found = Scanner::new(file)
                .with_fallback_window(fallback_window)
                .scan();
            debug!("{}: {} declarations", file.path().display(), found.len());
            declarations.extend(found);
        }

        let graph = resolve(&mut declarations);
        info!(
            "{}: {} declarations in {} files, {} dependencies",
            name,
            declarations.len(),
            files.len(),
            graph.len()
        );

        Self {
            name,
            files,
            declarations,
            graph,
        }
    }

    /// Looks a declaration up by name. On a collision the later one wins,
    /// as in dependency resolution.
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().rev().find(|d| d.name == name)
    }

    pub fn stats(&self) -> ProjectStats {
        ProjectStats::compute(&self.declarations)
    }

    /// Builds the serializable report. Bodies are highlighted only when a
    /// highlighter is given.
    pub fn report(&self, highlighter: Option<&Highlighter<'_>>) -> ProjectReport {
        let highlights = match highlighter {
            Some(highlighter) => self
                .declarations
                .iter()
                .map(|d| (d.name.clone(), highlight_declaration(d, highlighter)))
                .collect(),
            None => BTreeMap::new(),
        };

        ProjectReport {
            name: self.name.clone(),
            title: self.name.clone(),
            description: String::new(),
            files: self
                .files
                .iter()
                .map(|f| f.path().display().to_string())
                .collect(),
            declarations: self.declarations.clone(),
            edges: self.graph.edges().cloned().collect(),
            cycle_members: self.graph.cycle_members(),
            stats: self.stats(),
            highlights,
            links: None,
            overview: None,
        }
    }
}

/// Discovers proof files and turns them into a [`Project`].
pub struct Analyzer {
    /// Extension of the files to scan, without the dot.
    pub extension: String,
    /// Lines kept for declarations without a terminator.
    pub fallback_window: usize,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            extension: "v".to_string(),
            fallback_window: FALLBACK_WINDOW,
        }
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every matching file under `directories` (relative to `root`),
    /// or under `root` itself when no directory is given.
    ///
    /// Files are returned sorted by path within each directory, with paths
    /// relative to `root`. Missing directories and unreadable files are
    /// logged and skipped.
    pub fn collect_files(&self, root: &Path, directories: &[PathBuf]) -> Result<Vec<SourceFile>> {
        if !root.is_dir() {
            bail!("Source root {} is not a directory", root.display());
        }

        let dirs: Vec<PathBuf> = if directories.is_empty() {
            vec![root.to_path_buf()]
        } else {
            directories.iter().map(|d| root.join(d)).collect()
        };

        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for dir in dirs {
            if !dir.is_dir() {
                warn!("directory {} not found, skipping", dir.display());
                continue;
            }

            // Walk recursively, in a stable order so reports are reproducible.
            for entry in WalkDir::new(&dir)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| {
                    e.path()
                        .extension()
                        .map_or(false, |ext| ext == self.extension.as_str())
                })
            {
                let path = entry.path();
                let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
                if !seen.insert(relative.clone()) {
                    continue;
                }

                match fs::read_to_string(path) {
                    Ok(text) => files.push(SourceFile::new(relative, text)),
                    Err(e) => warn!("could not read {}: {}", path.display(), e),
                }
            }
        }

        Ok(files)
    }

    /// Runs the whole pipeline for one project.
    pub fn analyze(&self, name: &str, root: &Path, directories: &[PathBuf]) -> Result<Project> {
        let files = self.collect_files(root, directories)?;
        info!("{}: {} files under {}", name, files.len(), root.display());
        Ok(Project::build(name, files, self.fallback_window))
    }
}
