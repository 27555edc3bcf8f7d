//! Name resolution between declarations.
//!
//! A declaration depends on another when a word token of its body, outside
//! comments and strings, equals the other's name. When two declarations share
//! a name the later one wins.

use crate::scanner::Declaration;
use crate::tokenizer::{tokenize, TokenKind};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// A reference from the body of `from` to the declaration named `to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
}

impl DependencyEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Directed reference graph between declarations, keyed by name.
///
/// Cycles are allowed. Every traversal keeps a visited set, so none of them
/// can loop forever.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct DependencyGraph {
    edges: BTreeSet<DependencyEdge>,
}

impl DependencyGraph {
    pub fn from_edges(edges: impl IntoIterator<Item = DependencyEdge>) -> Self {
        Self {
            edges: edges.into_iter().filter(|e| e.from != e.to).collect(),
        }
    }

    /// Edges sorted by source, then target.
    pub fn edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.edges.iter()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn contains(&self, from: &str, to: &str) -> bool {
        self.edges.contains(&DependencyEdge::new(from, to))
    }

    /// Names referenced by `name`, sorted.
    pub fn uses<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .range(DependencyEdge::new(name, "")..)
            .take_while(move |edge| edge.from == name)
            .map(|edge| edge.to.as_str())
    }

    /// Names whose bodies reference `name`, sorted.
    pub fn used_by<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |edge| edge.to == name)
            .map(|edge| edge.from.as_str())
    }

    pub fn out_degree(&self, name: &str) -> usize {
        self.uses(name).count()
    }

    /// Every name reachable from `name` in at most `max_depth` steps,
    /// excluding `name` itself unless it lies on a cycle.
    pub fn reachable_from(&self, name: &str, max_depth: usize) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
        queue.push_back((name, 0));

        while let Some((current, depth)) = queue.pop_front() {
            if depth == max_depth {
                continue;
            }
            for next in self.uses(current) {
                if seen.insert(next.to_string()) {
                    queue.push_back((next, depth + 1));
                }
            }
        }

        seen
    }

    /// Names that can reach themselves through at least one edge.
    pub fn cycle_members(&self) -> BTreeSet<String> {
        let sources: BTreeSet<&str> = self.edges.iter().map(|e| e.from.as_str()).collect();
        sources
            .into_iter()
            .filter(|name| self.reachable_from(name, usize::MAX).contains(*name))
            .map(str::to_string)
            .collect()
    }

    pub fn has_cycle(&self) -> bool {
        !self.cycle_members().is_empty()
    }
}

/// Fills `dependencies` and `used_by` for every declaration of a project and
/// returns the resulting graph.
///
/// Only word tokens count, so names inside comments and strings are ignored,
/// and matching is exact and case-sensitive. When two declarations share a
/// name, the later one shadows the earlier one in the lookup.
pub fn resolve(declarations: &mut [Declaration]) -> DependencyGraph {
    let mut lookup: HashMap<String, usize> = HashMap::with_capacity(declarations.len());
    for (index, declaration) in declarations.iter().enumerate() {
        lookup.insert(declaration.name.clone(), index);
    }

    let uses: Vec<BTreeSet<String>> = declarations
        .iter()
        .map(|declaration| {
            tokenize(&declaration.body_text)
                .into_iter()
                .filter(|token| token.kind == TokenKind::Word)
                .filter(|token| token.text != declaration.name && lookup.contains_key(token.text))
                .map(|token| token.text.to_string())
                .collect()
        })
        .collect();

    let mut edges = BTreeSet::new();
    for declaration in declarations.iter_mut() {
        declaration.used_by.clear();
    }
    for (index, names) in uses.into_iter().enumerate() {
        let from = declarations[index].name.clone();
        for to in &names {
            if let Some(&target) = lookup.get(to) {
                declarations[target].used_by.insert(from.clone());
            }
            edges.insert(DependencyEdge::new(from.clone(), to.clone()));
        }
        declarations[index].dependencies = names;
    }

    DependencyGraph { edges }
}
