//! Presentational tagging of proof text.
//!
//! The highlighter reuses the tokenizer and refines word spans with two fixed
//! vocabularies: language keywords and tactics.

use crate::tokenizer::{tokenize, TokenKind};
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// Vernacular and term-level keywords.
pub const COQ_KEYWORDS: &[&str] = &[
    "Lemma", "Theorem", "Corollary", "Proposition", "Fact", "Remark", "Definition", "Fixpoint",
    "CoFixpoint", "Inductive", "CoInductive", "Record", "Structure", "Class", "Instance", "Let",
    "Variable", "Variables", "Hypothesis", "Hypotheses", "Context", "Section", "End", "Module",
    "Require", "Import", "Export", "Open", "Scope", "Notation", "Local", "Global", "Arguments",
    "Implicit", "Proof", "Qed", "Defined", "Admitted", "Abort", "forall", "fun", "match", "with",
    "end", "as", "in", "return", "if", "then", "else", "let", "Type", "Prop", "Set",
];

/// Proof tactics.
pub const COQ_TACTICS: &[&str] = &[
    "intros", "intro", "apply", "eapply", "exact", "rewrite", "simpl", "auto", "eauto", "trivial",
    "reflexivity", "symmetry", "transitivity", "split", "destruct", "induction", "case", "elim",
    "unfold", "fold", "assert", "pose", "set", "subst", "inversion", "discriminate", "injection",
    "congruence", "lia", "nia", "omega", "ring", "field", "constructor", "exists", "left", "right",
    "exfalso", "contradiction", "assumption", "specialize", "generalize", "revert", "clear",
    "rename", "move", "cbn", "cbv", "compute", "red", "f_equal", "tauto", "intuition",
    "firstorder", "easy", "now", "by", "done", "have", "suff", "repeat", "try", "first", "solve",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VocabularyError {
    #[error("words listed as both keyword and tactic: {}", .0.join(", "))]
    Overlap(Vec<String>),
}

/// The two disjoint word lists used for tagging. Matching is case-sensitive.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    keywords: HashSet<String>,
    tactics: HashSet<String>,
}

impl Vocabulary {
    /// Builds a vocabulary, rejecting any word present in both lists.
    pub fn new<K, T>(keywords: K, tactics: T) -> Result<Self, VocabularyError>
    where
        K: IntoIterator,
        K::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let keywords: HashSet<String> = keywords.into_iter().map(Into::into).collect();
        let tactics: HashSet<String> = tactics.into_iter().map(Into::into).collect();

        let mut overlap: Vec<String> = keywords.intersection(&tactics).cloned().collect();
        if !overlap.is_empty() {
            overlap.sort();
            return Err(VocabularyError::Overlap(overlap));
        }

        Ok(Self { keywords, tactics })
    }

    /// The built-in Rocq/Coq vocabulary.
    pub fn coq() -> Self {
        // The built-in lists are disjoint; the check only matters for user lists.
        Self {
            keywords: COQ_KEYWORDS.iter().map(|w| w.to_string()).collect(),
            tactics: COQ_TACTICS.iter().map(|w| w.to_string()).collect(),
        }
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords.contains(word)
    }

    pub fn is_tactic(&self, word: &str) -> bool {
        self.tactics.contains(word)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightTag {
    Keyword,
    Tactic,
    Plain,
    Comment,
    String,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightedToken {
    pub tag: HighlightTag,
    pub text: String,
}

/// Tags proof text for display.
pub struct Highlighter<'v> {
    vocabulary: &'v Vocabulary,
}

impl<'v> Highlighter<'v> {
    pub fn new(vocabulary: &'v Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// Tokenizes `text` and tags every span. The texts concatenate back to `text`.
    pub fn highlight(&self, text: &str) -> Vec<HighlightedToken> {
        tokenize(text)
            .into_iter()
            .map(|token| {
                let tag = match token.kind {
                    TokenKind::Comment => HighlightTag::Comment,
                    TokenKind::String => HighlightTag::String,
                    TokenKind::Other => HighlightTag::Other,
                    TokenKind::Word if self.vocabulary.is_keyword(token.text) => {
                        HighlightTag::Keyword
                    }
                    TokenKind::Word if self.vocabulary.is_tactic(token.text) => {
                        HighlightTag::Tactic
                    }
                    TokenKind::Word => HighlightTag::Plain,
                };
                HighlightedToken {
                    tag,
                    text: token.text.to_string(),
                }
            })
            .collect()
    }
}
