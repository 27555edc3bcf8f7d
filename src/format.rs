//! Plain-text table renderings of a declaration list.

use crate::scanner::Declaration;
use anyhow::{Context, Result};

fn dependency_list(declaration: &Declaration, separator: &str) -> String {
    declaration
        .dependencies
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Markdown table, one row per declaration. Pipes inside cells are escaped.
pub fn to_markdown(declarations: &[Declaration]) -> String {
    let mut lines = vec![
        "| File | Section | Name | Kind | Category | Lines | Uses | Signature | Meaning |".to_string(),
        "|------|---------|------|------|----------|------:|------|-----------|---------|".to_string(),
    ];

    for d in declarations {
        let uses = if d.dependencies.is_empty() {
            "-".to_string()
        } else {
            d.dependencies
                .iter()
                .map(|name| format!("`{}`", name))
                .collect::<Vec<_>>()
                .join(", ")
        };
        lines.push(format!(
            "| {} | {} | `{}` | {} | {} | {} | {} | `{}` | {} |",
            d.source_file.display(),
            d.section,
            d.name,
            d.kind(),
            d.category(),
            d.proof_lines,
            uses,
            d.signature.replace('|', "\\|"),
            d.comment().replace('|', "\\|"),
        ));
    }

    lines.join("\n")
}

/// Tab-separated values with a header row. Tabs inside cells become spaces.
pub fn to_tsv(declarations: &[Declaration]) -> String {
    let mut lines =
        vec!["File\tSection\tName\tKind\tCategory\tProofLines\tUses\tSignature\tMeaning".to_string()];

    for d in declarations {
        lines.push(format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            d.source_file.display(),
            d.section,
            d.name,
            d.kind(),
            d.category(),
            d.proof_lines,
            dependency_list(d, ","),
            d.signature.replace('\t', " "),
            d.comment().replace('\t', " "),
        ));
    }

    lines.join("\n")
}

/// CSV with a header row. Fields holding commas, quotes or newlines are
/// quoted by the writer.
pub fn to_csv(declarations: &[Declaration]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "File",
        "Section",
        "Name",
        "Kind",
        "Category",
        "ProofLines",
        "Dependencies",
        "Dep_Count",
        "Signature",
        "Meaning",
    ])?;

    for d in declarations {
        writer.write_record([
            d.source_file.display().to_string(),
            d.section.clone(),
            d.name.clone(),
            d.kind().to_string(),
            d.category().to_string(),
            d.proof_lines.to_string(),
            dependency_list(d, ", "),
            d.dependencies.len().to_string(),
            d.signature.clone(),
            d.comment().to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Failed to flush CSV output")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}
