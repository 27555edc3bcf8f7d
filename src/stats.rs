//! Aggregate figures over a resolved declaration list.

use crate::classifier::Category;
use crate::scanner::{DeclKind, Declaration};
use serde::Serialize;
use std::collections::BTreeMap;

/// Declaration counts for one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileStats {
    pub total: usize,
    pub main: usize,
    pub helper: usize,
}

/// Aggregate figures for a project.
///
/// Built from the declarations alone, after dependency resolution, and never
/// written back to them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectStats {
    /// Total number of declarations.
    pub total: usize,
    pub main_count: usize,
    pub helper_count: usize,
    pub theorem_count: usize,
    /// Number of distinct files holding at least one declaration.
    pub total_files: usize,
    pub per_kind: BTreeMap<DeclKind, usize>,
    pub per_file: BTreeMap<String, FileStats>,
    /// Number of dependencies of each declaration.
    pub out_degree: BTreeMap<String, usize>,
    pub total_dependencies: usize,
    pub max_out_degree: usize,
    pub avg_out_degree: f64,
    pub total_proof_lines: usize,
    /// Declarations cut by the fallback window.
    pub truncated_count: usize,
}

impl ProjectStats {
    pub fn compute(declarations: &[Declaration]) -> Self {
        let mut stats = ProjectStats {
            total: declarations.len(),
            ..Default::default()
        };

        for declaration in declarations {
            let file = stats
                .per_file
                .entry(declaration.source_file.display().to_string())
                .or_default();
            file.total += 1;

            match declaration.category() {
                Category::Main => {
                    stats.main_count += 1;
                    file.main += 1;
                }
                Category::Helper => {
                    stats.helper_count += 1;
                    file.helper += 1;
                }
            }

            if declaration.kind() == DeclKind::Theorem {
                stats.theorem_count += 1;
            }
            *stats.per_kind.entry(declaration.kind()).or_insert(0) += 1;

            let degree = declaration.dependencies.len();
            stats.out_degree.insert(declaration.name.clone(), degree);
            stats.total_dependencies += degree;
            stats.max_out_degree = stats.max_out_degree.max(degree);

            stats.total_proof_lines += declaration.proof_lines;
            if !declaration.terminated {
                stats.truncated_count += 1;
            }
        }

        stats.total_files = stats.per_file.len();
        if stats.total > 0 {
            stats.avg_out_degree = stats.total_dependencies as f64 / stats.total as f64;
        }
        stats
    }
}
