//! Lossless tokenizer for Rocq/Coq source text.
//!
//! The tokenizer only distinguishes four kinds of spans: comments, string
//! literals, identifier-like words and everything else. That is enough to
//! keep keyword matching and reference resolution away from comments and
//! strings, and to feed the highlighter.

use serde::Serialize;

/// Opening marker of a comment.
pub const COMMENT_OPEN: &str = "(*";
/// Closing marker of a comment. The first one closes the comment; nested
/// comments are not balanced.
pub const COMMENT_CLOSE: &str = "*)";

/// The kind of a span produced by [`tokenize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// `(* ... *)`, markers included.
    Comment,
    /// `"..."`, quotes included.
    String,
    /// A maximal run of identifier characters.
    Word,
    /// Whitespace, punctuation and operators.
    Other,
}

/// A span of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset of the first character of the span.
    pub offset: usize,
}

impl Token<'_> {
    /// Byte offset one past the last character of the span.
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

/// Characters that may start a word.
fn is_word_start(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Characters that may continue a word. The prime is used for names like `x'`.
fn is_word_continue(ch: char) -> bool {
    is_word_start(ch) || ch == '\''
}

/// Splits `source` into comment, string, word and other spans.
///
/// Concatenating the `text` of every returned token gives back `source`
/// exactly. Unterminated comments and strings run to the end of the input.
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    // Start of the pending run of `Other` characters, if any.
    let mut other_start: Option<usize> = None;
    let mut pos = 0;

    while pos < source.len() {
        let rest = &source[pos..];

        let (kind, len) = if rest.starts_with(COMMENT_OPEN) {
            let body = &rest[COMMENT_OPEN.len()..];
            let len = match body.find(COMMENT_CLOSE) {
                Some(i) => COMMENT_OPEN.len() + i + COMMENT_CLOSE.len(),
                None => rest.len(),
            };
            (TokenKind::Comment, len)
        } else {
            let Some(ch) = rest.chars().next() else {
                break;
            };
            if ch == '"' {
                let len = match rest[1..].find('"') {
                    Some(i) => i + 2,
                    None => rest.len(),
                };
                (TokenKind::String, len)
            } else if is_word_start(ch) {
                let len = rest
                    .char_indices()
                    .find(|&(_, c)| !is_word_continue(c))
                    .map_or(rest.len(), |(i, _)| i);
                (TokenKind::Word, len)
            } else {
                // Grow the current run of other characters.
                other_start.get_or_insert(pos);
                pos += ch.len_utf8();
                continue;
            }
        };

        if let Some(start) = other_start.take() {
            tokens.push(Token {
                kind: TokenKind::Other,
                text: &source[start..pos],
                offset: start,
            });
        }
        tokens.push(Token {
            kind,
            text: &source[pos..pos + len],
            offset: pos,
        });
        pos += len;
    }

    if let Some(start) = other_start {
        tokens.push(Token {
            kind: TokenKind::Other,
            text: &source[start..],
            offset: start,
        });
    }

    tokens
}

/// Returns `source` with every span of the given kinds blanked out.
///
/// Blanked characters become spaces while newlines are kept, so the result
/// has exactly the same lines as the input.
fn mask(source: &str, hidden: &[TokenKind]) -> String {
    let mut out = String::with_capacity(source.len());
    for token in tokenize(source) {
        if hidden.contains(&token.kind) {
            out.extend(
                token
                    .text
                    .chars()
                    .map(|c| if c == '\n' { '\n' } else { ' ' }),
            );
        } else {
            out.push_str(token.text);
        }
    }
    out
}

/// Blanks comments only. String literals are kept.
pub fn strip_comments(source: &str) -> String {
    mask(source, &[TokenKind::Comment])
}

/// Blanks comments and string literals, leaving only code for keyword matching.
pub fn code_only(source: &str) -> String {
    mask(source, &[TokenKind::Comment, TokenKind::String])
}
