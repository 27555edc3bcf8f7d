//! Line-oriented discovery of proof declarations in a `.v` file.
//!
//! Headers are matched on code-only lines, so text inside comments and
//! strings never opens a declaration. Each declaration runs from its header
//! (or the comment directly above it) to the next `Qed.`, `Defined.` or
//! `Admitted.`, or to the fallback window when no terminator follows.

use crate::classifier::{classify, Category};
use crate::tokenizer::{code_only, strip_comments, tokenize, TokenKind, COMMENT_CLOSE, COMMENT_OPEN};
use crate::utils::{collapse_whitespace, LineIndex};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Number of lines kept after `start_line` when a declaration has no terminator.
pub const FALLBACK_WINDOW: usize = 50;

/// Appended on its own line to the body of a declaration cut by the fallback window.
/// It is a comment, so the resolver and the highlighter never read it as code.
pub const TRUNCATION_MARKER: &str = "(* ... truncated *)";

/// Section name used outside of any `Section ... End` block.
pub const TOP_LEVEL_SECTION: &str = "Top-level";

/// Maximum number of lines read when collecting a signature.
const SIGNATURE_LINE_LIMIT: usize = 20;

lazy_static::lazy_static! {
    // A declaration header: kind keyword (any case), whitespace, then the name.
    // Matched against lines whose comments and strings have been blanked.
    static ref HEADER_RE: Regex = Regex::new(
        r"^\s*(?i:(lemma|theorem|corollary|proposition|fact|remark))\s+(\w[\w']*)"
    ).unwrap();

    // Proof-closing keywords that end a declaration, matched on comment-stripped
    // lines. `Abort` is not one of them.
    static ref TERMINATOR_RE: Regex = Regex::new(r"\b(?:Qed|Defined|Admitted)\s*\.").unwrap();

    static ref SECTION_START_RE: Regex = Regex::new(r"^\s*Section\s+([\w']+)\s*\.").unwrap();
    static ref SECTION_END_RE: Regex = Regex::new(r"^\s*End\s+([\w']+)\s*\.").unwrap();
    static ref PROOF_RE: Regex = Regex::new(r"\bProof\b").unwrap();
}

/// The keyword a declaration was introduced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeclKind {
    Lemma,
    Theorem,
    Corollary,
    Proposition,
    Fact,
    Remark,
}

impl DeclKind {
    pub const ALL: [DeclKind; 6] = [
        DeclKind::Lemma,
        DeclKind::Theorem,
        DeclKind::Corollary,
        DeclKind::Proposition,
        DeclKind::Fact,
        DeclKind::Remark,
    ];

    /// Canonical spelling of the keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKind::Lemma => "Lemma",
            DeclKind::Theorem => "Theorem",
            DeclKind::Corollary => "Corollary",
            DeclKind::Proposition => "Proposition",
            DeclKind::Fact => "Fact",
            DeclKind::Remark => "Remark",
        }
    }

    /// Parses a keyword regardless of case (`LEMMA`, `lemma` and `Lemma` are all `Lemma`).
    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(word))
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proof script read from disk (or fetched), identified by its path
/// relative to the project root.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The lines of the file, split on `\n`.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }
}

/// A named claim together with its attached comment and proof.
///
/// `kind`, `comment` and `category` are private: the category is derived from
/// the other two and the only way to change them goes through setters that
/// classify again.
#[derive(Debug, Clone, Serialize)]
pub struct Declaration {
    pub name: String,
    kind: DeclKind,
    category: Category,
    /// Text of the attached comment, markers stripped. Empty when none.
    comment: String,
    /// Enclosing `Section`, or [`TOP_LEVEL_SECTION`].
    pub section: String,
    /// The statement, from the keyword up to its final period or `Proof`.
    pub signature: String,
    pub source_file: PathBuf,
    /// First line of the declaration (the attached comment if there is one). 1-indexed.
    pub start_line: usize,
    /// Line holding the kind keyword. 1-indexed.
    pub header_line: usize,
    /// Line of the terminator, or the last line of the fallback window. 1-indexed.
    pub end_line: usize,
    pub body_text: String,
    pub terminated: bool,
    /// Non-blank code lines from `Proof` to the end of the declaration.
    pub proof_lines: usize,
    /// Names of other declarations referenced in the body.
    pub dependencies: BTreeSet<String>,
    /// Names of declarations whose bodies reference this one.
    pub used_by: BTreeSet<String>,
}

impl Declaration {
    /// Creates a declaration with no comment, no body and no location.
    pub fn new(name: impl Into<String>, kind: DeclKind, source_file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind,
            category: classify(kind, ""),
            comment: String::new(),
            section: TOP_LEVEL_SECTION.to_string(),
            signature: String::new(),
            source_file: source_file.into(),
            start_line: 0,
            header_line: 0,
            end_line: 0,
            body_text: String::new(),
            terminated: true,
            proof_lines: 0,
            dependencies: BTreeSet::new(),
            used_by: BTreeSet::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.set_comment(comment);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body_text = body.into();
        self
    }

    pub fn kind(&self) -> DeclKind {
        self.kind
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn is_main(&self) -> bool {
        self.category == Category::Main
    }

    pub fn set_kind(&mut self, kind: DeclKind) {
        self.kind = kind;
        self.category = classify(self.kind, &self.comment);
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
        self.category = classify(self.kind, &self.comment);
    }
}

/// A comment span located on lines (0-indexed).
struct CommentSpan<'a> {
    text: &'a str,
    start_line: usize,
    end_line: usize,
    /// Only whitespace precedes the comment on its first line.
    starts_line: bool,
    /// Only whitespace follows the comment on its last line.
    ends_line: bool,
}

/// Header of the declaration being scanned. Lines are 0-indexed.
struct OpenDeclaration {
    kind: DeclKind,
    name: String,
    start: usize,
    header: usize,
    comment: String,
    section: String,
}

enum ScanState {
    ScanningForHeader,
    InDeclaration(OpenDeclaration),
}

/// Line-based declaration scanner for a single file.
///
/// Only one declaration is open at a time. A header opens it, the first
/// terminator closes it, and scanning for the next header resumes on the
/// following line.
pub struct Scanner<'a> {
    file: &'a SourceFile,
    lines: Vec<&'a str>,
    /// Lines with comments and strings blanked.
    code: Vec<String>,
    /// Lines with comments blanked.
    stripped: Vec<String>,
    comments: Vec<CommentSpan<'a>>,
    fallback_window: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(file: &'a SourceFile) -> Self {
        let text = file.text();
        let index = LineIndex::new(text);

        let comments = tokenize(text)
            .into_iter()
            .filter(|token| token.kind == TokenKind::Comment)
            .map(|token| {
                let start_line = index.line_of(token.offset);
                let end_line = index.line_of(token.end() - 1);
                let line_start = index.line_start(start_line).unwrap_or(0);
                let rest_of_line = text[token.end()..].split('\n').next().unwrap_or("");
                CommentSpan {
                    text: token.text,
                    start_line,
                    end_line,
                    starts_line: text[line_start..token.offset].trim().is_empty(),
                    ends_line: rest_of_line.trim().is_empty(),
                }
            })
            .collect();

        Self {
            file,
            lines: text.split('\n').collect(),
            code: code_only(text).split('\n').map(String::from).collect(),
            stripped: strip_comments(text).split('\n').map(String::from).collect(),
            comments,
            fallback_window: FALLBACK_WINDOW,
        }
    }

    /// Overrides the number of lines kept for declarations without a terminator.
    pub fn with_fallback_window(mut self, lines: usize) -> Self {
        self.fallback_window = lines;
        self
    }

    /// Extracts every declaration of the file, in file order.
    pub fn scan(&self) -> Vec<Declaration> {
        let mut declarations = Vec::new();
        let mut sections = vec![TOP_LEVEL_SECTION.to_string()];
        let mut state = ScanState::ScanningForHeader;
        // First line the next declaration may claim.
        let mut floor = 0;
        let mut idx = 0;
        let last = self.lines.len() - 1;

        while idx < self.lines.len() {
            state = match state {
                ScanState::ScanningForHeader => match self.header_at(idx) {
                    // Stay on the header line: it may also hold the terminator.
                    Some((kind, name)) => ScanState::InDeclaration(self.open(
                        kind,
                        name,
                        idx,
                        floor,
                        &sections,
                    )),
                    None => {
                        self.track_section(idx, &mut sections);
                        idx += 1;
                        ScanState::ScanningForHeader
                    }
                },
                ScanState::InDeclaration(open) => {
                    if TERMINATOR_RE.is_match(&self.stripped[idx]) {
                        declarations.push(self.close(open, idx, true));
                        idx += 1;
                        floor = idx;
                        ScanState::ScanningForHeader
                    } else if idx == last {
                        let end = (open.start + self.fallback_window).min(last).max(open.header);
                        debug!(
                            "{} {} in {} has no terminator, keeping lines {}..={}",
                            open.kind,
                            open.name,
                            self.file.path().display(),
                            open.start + 1,
                            end + 1
                        );
                        declarations.push(self.close(open, end, false));
                        idx = end + 1;
                        floor = idx;
                        ScanState::ScanningForHeader
                    } else {
                        idx += 1;
                        ScanState::InDeclaration(open)
                    }
                }
            };
        }

        declarations
    }

    /// Finds a declaration header on a line, outside comments and strings.
    fn header_at(&self, idx: usize) -> Option<(DeclKind, String)> {
        let caps = HEADER_RE.captures(&self.code[idx])?;
        let kind = DeclKind::from_keyword(caps.get(1)?.as_str())?;
        Some((kind, caps.get(2)?.as_str().to_string()))
    }

    /// Pushes or pops the section stack. The top level is never popped.
    fn track_section(&self, idx: usize, sections: &mut Vec<String>) {
        let line = &self.code[idx];
        if let Some(caps) = SECTION_START_RE.captures(line) {
            sections.push(caps[1].to_string());
        } else if SECTION_END_RE.is_match(line) && sections.len() > 1 {
            sections.pop();
        }
    }

    fn open(
        &self,
        kind: DeclKind,
        name: String,
        header: usize,
        floor: usize,
        sections: &[String],
    ) -> OpenDeclaration {
        let attached = self.attached_comment(header, floor);
        OpenDeclaration {
            kind,
            name,
            start: attached.map_or(header, |c| c.start_line),
            header,
            comment: attached.map(|c| comment_text(c.text)).unwrap_or_default(),
            section: sections
                .last()
                .cloned()
                .unwrap_or_else(|| TOP_LEVEL_SECTION.to_string()),
        }
    }

    /// The comment directly above a header, if any.
    ///
    /// Blank lines are skipped once. The nearest non-blank line must end a
    /// comment that starts at the beginning of its own line; a comment further
    /// up is never considered.
    fn attached_comment(&self, header: usize, floor: usize) -> Option<&CommentSpan<'a>> {
        let mut idx = header;
        loop {
            if idx <= floor {
                return None;
            }
            idx -= 1;
            if !self.lines[idx].trim().is_empty() {
                break;
            }
        }

        self.comments.iter().find(|comment| {
            comment.end_line == idx
                && comment.ends_line
                && comment.starts_line
                && comment.start_line >= floor
        })
    }

    fn close(&self, open: OpenDeclaration, end: usize, terminated: bool) -> Declaration {
        let mut body_text = self.lines[open.start..=end].join("\n");
        if !terminated {
            body_text.push('\n');
            body_text.push_str(TRUNCATION_MARKER);
        }

        let mut declaration = Declaration::new(open.name, open.kind, self.file.path())
            .with_comment(open.comment)
            .with_body(body_text);
        declaration.section = open.section;
        declaration.signature = self.signature(open.header, end);
        declaration.start_line = open.start + 1;
        declaration.header_line = open.header + 1;
        declaration.end_line = end + 1;
        declaration.terminated = terminated;
        declaration.proof_lines = self.proof_lines(open.header, end, terminated);
        declaration
    }

    /// Collects the statement text, stopping at `Proof` or at a period that
    /// closes every bracket once a colon has been seen.
    fn signature(&self, header: usize, end: usize) -> String {
        let mut parts = Vec::new();
        let mut depth: i64 = 0;
        let mut seen_colon = false;

        for line in &self.stripped[header..=end.min(header + SIGNATURE_LINE_LIMIT)] {
            let line = line.trim();
            if let Some(m) = PROOF_RE.find(line) {
                parts.push(&line[..m.start()]);
                break;
            }
            parts.push(line);
            depth += bracket_balance(line);
            seen_colon |= line.contains(':');
            if line.ends_with('.') && depth <= 0 && seen_colon {
                break;
            }
        }

        collapse_whitespace(&parts.join(" "))
    }

    fn proof_lines(&self, header: usize, end: usize, terminated: bool) -> usize {
        match (header..=end).find(|&i| PROOF_RE.is_match(&self.code[i])) {
            Some(proof) => (proof..=end)
                .filter(|&i| !self.code[i].trim().is_empty())
                .count()
                .max(1),
            // One-liner closed without `Proof`.
            None if terminated => 1,
            None => 0,
        }
    }
}

/// Scans a file with the default fallback window.
pub fn scan(file: &SourceFile) -> Vec<Declaration> {
    Scanner::new(file).scan()
}

/// Strips comment markers and leading stars, collapsing whitespace.
fn comment_text(raw: &str) -> String {
    let inner = raw.strip_prefix(COMMENT_OPEN).unwrap_or(raw);
    let inner = inner.strip_suffix(COMMENT_CLOSE).unwrap_or(inner);
    let cleaned: Vec<&str> = inner
        .lines()
        .map(|line| line.trim().trim_matches('*').trim())
        .collect();
    collapse_whitespace(&cleaned.join(" "))
}

/// Opening minus closing brackets of all three shapes.
fn bracket_balance(line: &str) -> i64 {
    line.chars()
        .map(|c| match c {
            '(' | '[' | '{' => 1,
            ')' | ']' | '}' => -1,
            _ => 0,
        })
        .sum()
}
