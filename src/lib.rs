// Lib file to expose modules for testing and external usage.
// This file serves as the root for the library crate.

/// Module containing the lossless comment/string/word tokenizer.
pub mod tokenizer;

/// Module containing the line-based declaration scanner.
/// This includes the `Declaration` and `SourceFile` data structures.
pub mod scanner;

/// Module containing the Main/Helper classification rule.
pub mod classifier;

/// Module containing dependency resolution and the reference graph.
pub mod resolver;

/// Module computing per-project statistics.
pub mod stats;

/// Module containing the vocabulary-driven highlighter.
pub mod highlight;

/// Module with the single-declaration extraction shared by every caller.
pub mod extract;

/// Module containing the per-project pipeline.
/// This includes the `Analyzer` struct and the serializable `ProjectReport`.
pub mod analyzer;

/// Module for YAML project configuration.
pub mod config;

/// Module acquiring sources (local directory or git clone).
pub mod source;

/// Module writing project reports and the site index.
pub mod site;

/// Module fetching single declarations from live source text.
pub mod fetch;

/// Module rendering declaration tables as Markdown or TSV.
pub mod format;

/// Module setting up the tracing subscriber.
pub mod logging;

/// Module containing utility functions.
pub mod utils;
