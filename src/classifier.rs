use crate::scanner::DeclKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a declaration is one of the results a development is about, or
/// supporting material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Main,
    Helper,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Main => "main",
            Category::Helper => "helper",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a declaration from its kind and attached comment.
///
/// Theorems are always main results. Anything else is main only when its
/// comment mentions "main" in any case (a plain substring test, so
/// "Main result" and "MAIN" both count).
pub fn classify(kind: DeclKind, comment: &str) -> Category {
    if kind == DeclKind::Theorem || comment.to_lowercase().contains("main") {
        Category::Main
    } else {
        Category::Helper
    }
}
