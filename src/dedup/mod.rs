//! The merge core: flattens per-file statement lists into a single
//! duplicate-free, order-preserving statement list.

use crate::config::{ParsedFile, SourceLocation, Statement};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// How aggressively duplicates are detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupMode {
    /// Exact structural equality only (the legacy behavior).
    ExactOnly,
    /// Exact equality plus keying `upstream` blocks on their name and
    /// `server` blocks on their first `server_name`.
    #[default]
    SemanticKeyed,
}

/// Why a candidate statement was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "key")]
pub enum DuplicateKind {
    Exact,
    UpstreamName(String),
    ServerName(String),
}

impl fmt::Display for DuplicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact duplicate"),
            Self::UpstreamName(name) => write!(f, "duplicate upstream \"{}\"", name),
            Self::ServerName(name) => write!(f, "duplicate server_name \"{}\"", name),
        }
    }
}

/// One dropped statement, reported for diagnostics only.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateNote {
    pub directive: String,
    pub location: SourceLocation,
    #[serde(flatten)]
    pub kind: DuplicateKind,
}

/// The deduplicated, ordered statement list plus notes about what was
/// dropped along the way.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub statements: Vec<Statement>,
    pub duplicates: Vec<DuplicateNote>,
}

pub struct Deduplicator {
    mode: DedupMode,
}

impl Deduplicator {
    pub fn new(mode: DedupMode) -> Self {
        Self { mode }
    }

    /// Flatten the files in input order. The traversal order (file order,
    /// then in-file order) is the single precedence rule: the first
    /// occurrence of a key always wins, whole block included, and later
    /// occurrences are dropped even when their bodies differ.
    pub fn merge(&self, files: &[ParsedFile]) -> MergedConfig {
        let mut statements: Vec<Statement> = Vec::new();
        let mut duplicates: Vec<DuplicateNote> = Vec::new();
        let mut upstream_names: HashSet<String> = HashSet::new();
        let mut server_names: HashSet<String> = HashSet::new();

        for file in files {
            for candidate in &file.statements {
                if statements.contains(candidate) {
                    duplicates.push(note(candidate, DuplicateKind::Exact));
                    continue;
                }

                if self.mode == DedupMode::SemanticKeyed {
                    if let Some(name) = upstream_name(candidate) {
                        if !upstream_names.insert(name.to_string()) {
                            duplicates
                                .push(note(candidate, DuplicateKind::UpstreamName(name.to_string())));
                            continue;
                        }
                    } else if let Some(name) = server_name(candidate) {
                        if !server_names.insert(name.to_string()) {
                            duplicates
                                .push(note(candidate, DuplicateKind::ServerName(name.to_string())));
                            continue;
                        }
                    }
                }

                statements.push(candidate.clone());
            }
        }

        MergedConfig {
            statements,
            duplicates,
        }
    }
}

/// Dedup key of an `upstream` block: its first argument.
fn upstream_name(statement: &Statement) -> Option<&str> {
    if statement.directive != "upstream" {
        return None;
    }
    statement.first_arg()
}

/// Dedup key of a `server` block: the first argument of its first
/// `server_name` child. A `server` block without one has no key and is
/// always retained.
fn server_name(statement: &Statement) -> Option<&str> {
    if statement.directive != "server" {
        return None;
    }
    statement
        .find_directive("server_name")
        .and_then(Statement::first_arg)
}

fn note(statement: &Statement, kind: DuplicateKind) -> DuplicateNote {
    DuplicateNote {
        directive: statement.directive.clone(),
        location: statement.location.clone(),
        kind,
    }
}
