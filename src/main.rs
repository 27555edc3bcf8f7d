//! `rocq-stats` command line.
//!
//! `analyze` reports on local directories, `build` writes the JSON site for
//! configured projects and `show` fetches one declaration from live sources.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use rayon::prelude::*;
use rocq_stats::analyzer::{Analyzer, Project, ProjectReport};
use rocq_stats::config::{load_project_dir, ProjectConfig};
use rocq_stats::fetch::{Fetcher, HttpSource, LiveSource, LocalSource, RawSource};
use rocq_stats::format::{to_csv, to_markdown, to_tsv};
use rocq_stats::highlight::{HighlightTag, HighlightedToken, Highlighter, Vocabulary};
use rocq_stats::site::{build_report, write_report, write_site_index, ProjectSummary};
use rocq_stats::source::Checkout;
use rocq_stats::{logging, classifier::Category};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Command line interface configuration using `clap`.
/// Global flags come first, then one of the subcommands below.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv).
    /// Logs go to stderr so they never mix with report output.
    /// `RUST_LOG` takes precedence when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan local directories as a single project and print a report.
    Analyze {
        /// Directories containing `.v` files, scanned recursively.
        /// Paths in the report are relative to the directory they were found in.
        #[arg(required = true)]
        dirs: Vec<PathBuf>,

        /// Output format.
        /// `text` is for reading, the others are for other tools.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Title of the report.
        #[arg(short, long, default_value = "Rocq Lemma Statistics")]
        title: String,

        /// Include highlighted bodies in JSON output.
        /// Ignored by the other formats.
        #[arg(long)]
        highlight: bool,
    },

    /// Build JSON reports for configured projects.
    Build {
        /// Project YAML file(s). Defaults to every file in `--projects-dir`.
        #[arg(short, long)]
        project: Vec<PathBuf>,

        /// Directory containing project YAML files.
        #[arg(long, default_value = "projects")]
        projects_dir: PathBuf,

        /// Use this local source directory instead of cloning.
        /// Every selected project is read from it.
        #[arg(short, long)]
        local: Option<PathBuf>,

        /// Output directory.
        #[arg(short, long, default_value = "site")]
        output: PathBuf,

        /// Include highlighted bodies in the reports.
        #[arg(long)]
        highlight: bool,
    },

    /// Fetch one declaration from live sources and print it highlighted.
    Show {
        /// Base URL of raw file contents.
        #[arg(long, required_unless_present = "root", conflicts_with = "root")]
        base_url: Option<String>,

        /// Local checkout to read from instead of a URL.
        #[arg(long)]
        root: Option<PathBuf>,

        /// File path relative to the base.
        path: String,

        /// Declaration name.
        name: String,

        /// Extra attempts after a transient network failure.
        /// Each retry waits twice as long as the one before.
        #[arg(long, default_value_t = 2)]
        retries: u32,

        /// Output raw JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Rendering of `analyze` results.
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
    Tsv,
    Csv,
}

/// Main entry point of the application.
///
/// Parses arguments, sets up logging and the highlighting vocabulary, then
/// hands over to the selected subcommand.
fn main() -> Result<()> {
    // Parse command line arguments using the Cli struct definition.
    let cli = Cli::parse();

    // Logging must be ready before any subcommand runs.
    logging::init(cli.verbose);

    // The vocabulary is built once and lent to every highlighter.
    let vocabulary = Vocabulary::coq();
    let highlighter = Highlighter::new(&vocabulary);

    // Dispatch. Errors propagate to `main` and end the process with a non-zero status.
    match cli.command {
        Command::Analyze {
            dirs,
            format,
            title,
            highlight,
        } => run_analyze(&dirs, format, &title, highlight.then_some(&highlighter)),
        Command::Build {
            project,
            projects_dir,
            local,
            output,
            highlight,
        } => run_build(
            &project,
            &projects_dir,
            local,
            &output,
            highlight.then_some(&highlighter),
        ),
        Command::Show {
            base_url,
            root,
            path,
            name,
            retries,
            json,
        } => match (base_url, root) {
            // Only remote sources are retried; local reads fail for good.
            (Some(url), _) => run_show(
                Fetcher::new(HttpSource::new(url)).with_retries(retries),
                &path,
                &name,
                json,
                &highlighter,
            ),
            (None, Some(root)) => run_show(
                Fetcher::new(LocalSource::new(root)),
                &path,
                &name,
                json,
                &highlighter,
            ),
            (None, None) => bail!("Either --base-url or --root is required"),
        },
    }
}

/// Scans `dirs` as one project and prints it in the requested format.
fn run_analyze(
    dirs: &[PathBuf],
    format: OutputFormat,
    title: &str,
    highlighter: Option<&Highlighter<'_>>,
) -> Result<()> {
    let analyzer = Analyzer::new();

    // Each directory is its own root, as if listed side by side.
    let mut files = Vec::new();
    for dir in dirs {
        if !dir.is_dir() {
            warn!("directory {} does not exist, skipping", dir.display());
            continue;
        }
        files.extend(analyzer.collect_files(dir, &[])?);
    }
    if files.is_empty() {
        bail!("No .v files found in any directory");
    }

    // Scan, resolve and classify in one pass, then render.
    let project = Project::build(title, files, analyzer.fallback_window);
    match format {
        OutputFormat::Json => {
            let mut report = project.report(highlighter);
            report.title = title.to_string();
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Markdown => println!("{}", to_markdown(&project.declarations)),
        OutputFormat::Tsv => println!("{}", to_tsv(&project.declarations)),
        OutputFormat::Csv => print!("{}", to_csv(&project.declarations)?),
        OutputFormat::Text => print_report(&project.report(None), title),
    }
    Ok(())
}

/// Builds every configured project and writes the site index.
///
/// This function:
/// 1. Loads the project configurations.
/// 2. Checks out each project's sources, or uses `local`.
/// 3. Analyzes and writes each project report in parallel.
/// 4. Writes the index over the projects that succeeded.
///
/// A project that fails is logged and skipped. Bad configuration files and
/// an unwritable index are errors.
fn run_build(
    project_files: &[PathBuf],
    projects_dir: &Path,
    local: Option<PathBuf>,
    output: &Path,
    highlighter: Option<&Highlighter<'_>>,
) -> Result<()> {
    // Explicit `--project` files win over the projects directory.
    let configs: Vec<ProjectConfig> = if project_files.is_empty() {
        if projects_dir.is_dir() {
            load_project_dir(projects_dir)?
        } else {
            Vec::new()
        }
    } else {
        project_files
            .iter()
            .map(|p| ProjectConfig::from_path(p))
            .collect::<Result<_>>()?
    };

    if configs.is_empty() {
        bail!(
            "No project configurations found. Add YAML files to {} or pass --project",
            projects_dir.display()
        );
    }

    println!("Building {} project(s) into {}", configs.len(), output.display());
    let analyzer = Analyzer::new();

    // Projects share nothing, so they are built in parallel.
    let summaries: Vec<ProjectSummary> = configs
        .par_iter()
        .filter_map(|config| {
            let checkout = match &local {
                Some(path) => Checkout::local(path.clone()),
                None => Checkout::clone_repo(&config.source),
            };
            let checkout = match checkout {
                Ok(checkout) => checkout,
                Err(e) => {
                    warn!("skipping {}: {:#}", config.name, e);
                    return None;
                }
            };

            let built = build_report(&analyzer, config, checkout.root(), highlighter)
                .and_then(|report| write_report(&report, output).map(|_| report));
            match built {
                Ok(report) => Some(ProjectSummary::from_report(&report)),
                Err(e) => {
                    warn!("skipping {}: {:#}", config.name, e);
                    None
                }
            }
        })
        .collect();

    // The index lists only the projects that were written.
    write_site_index(&summaries, output)?;

    println!("\n{}", "Site built".bold());
    for s in &summaries {
        println!(
            " * {}: {} declarations ({} main, {} helper) in {} files",
            s.name, s.total, s.main_count, s.helper_count, s.total_files
        );
    }
    if summaries.len() < configs.len() {
        println!(
            " * {} project(s) skipped, see warnings",
            configs.len() - summaries.len()
        );
    }
    Ok(())
}

/// Fetches one declaration and prints it, highlighted or as JSON.
///
/// Fetch failures are reported as outcomes, not errors, so the command
/// still exits cleanly.
fn run_show<S: RawSource>(
    fetcher: Fetcher<S>,
    path: &str,
    name: &str,
    json: bool,
    highlighter: &Highlighter<'_>,
) -> Result<()> {
    let result = fetcher.fetch(path, name, highlighter);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match result {
        LiveSource::Found {
            declaration,
            tokens,
        } => {
            println!(
                "{} {} ({}:{}-{})\n",
                declaration.kind().to_string().bold(),
                declaration.name.bold(),
                declaration.source_file.display(),
                declaration.start_line,
                declaration.end_line
            );
            println!("{}", render_tokens(&tokens));
        }
        LiveSource::NotFound { path, name } => {
            eprintln!("{} {} not found in {}", "Not found:".yellow(), name, path);
        }
        LiveSource::FetchFailed { path, message } => {
            eprintln!("{} {}: {}", "Fetch failed:".red(), path, message);
        }
    }
    Ok(())
}

/// Colors highlighted tokens for the terminal.
fn render_tokens(tokens: &[HighlightedToken]) -> String {
    tokens
        .iter()
        .map(|token| {
            let text = token.text.as_str();
            match token.tag {
                HighlightTag::Keyword => text.blue().bold().to_string(),
                HighlightTag::Tactic => text.green().to_string(),
                HighlightTag::Comment => text.dimmed().to_string(),
                HighlightTag::String => text.yellow().to_string(),
                HighlightTag::Plain | HighlightTag::Other => text.to_string(),
            }
        })
        .collect()
}

/// Prints a human-readable report.
fn print_report(report: &ProjectReport, title: &str) {
    let stats = &report.stats;

    println!("\n{}", title.bold());
    println!("===================================\n");

    println!("Summary:");
    println!(" * Declarations: {}", stats.total);
    println!(" * Main: {}", stats.main_count);
    println!(" * Helper: {}", stats.helper_count);
    println!(" * Files: {}", stats.total_files);
    println!(" * Proof lines: {}", stats.total_proof_lines);
    println!(" * Dependencies: {}", stats.total_dependencies);
    println!(
        " * Max / avg dependencies: {} / {:.2}",
        stats.max_out_degree, stats.avg_out_degree
    );
    if stats.truncated_count > 0 {
        println!(" * Without terminator: {}", stats.truncated_count);
    }
    if !report.cycle_members.is_empty() {
        println!(" * In reference cycles: {}", report.cycle_members.len());
    }

    // Group by file, keeping file order.
    let mut current_file = None;
    for d in &report.declarations {
        let file = d.source_file.display().to_string();
        if current_file.as_ref() != Some(&file) {
            let count = stats.per_file.get(&file).map_or(0, |f| f.total);
            println!("\n - {} ({} declarations)", file.cyan(), count);
            current_file = Some(file);
        }

        let label = match d.category() {
            Category::Main => d.name.green().bold(),
            Category::Helper => d.name.normal(),
        };
        println!("   {} {} [{}]", d.kind(), label, d.section);
        println!("    └─ lines {}-{}", d.start_line, d.end_line);
        if !d.dependencies.is_empty() {
            let uses: Vec<&str> = d.dependencies.iter().map(String::as_str).collect();
            println!("    └─ uses {}", uses.join(", "));
        }
        if !d.terminated {
            println!("    └─ {}", "no terminator, truncated".yellow());
        }
    }
}
