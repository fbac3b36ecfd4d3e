//! Configuration statement model shared by the parser, deduplicator and emitter.

use serde::Serialize;
use std::path::PathBuf;

/// Where a statement was parsed from.
#[derive(Debug, Clone, Serialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
}

impl SourceLocation {
    pub fn new(file: PathBuf, line: usize) -> Self {
        Self { file, line }
    }
}

/// A single nginx directive, simple (`include ./a.conf;`) or block
/// (`upstream app { ... }`).
#[derive(Debug, Clone)]
pub struct Statement {
    pub directive: String,
    pub args: Vec<String>,
    pub block: Option<Vec<Statement>>,
    pub location: SourceLocation,
}

/// Structural equality over directive, args and block. The source location
/// never takes part in duplicate detection: the same statement contributed
/// by two different nodes must compare equal.
impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        self.directive == other.directive && self.args == other.args && self.block == other.block
    }
}

impl Eq for Statement {}

impl Statement {
    pub fn new(directive: impl Into<String>, line: usize, file: PathBuf) -> Self {
        Self {
            directive: directive.into(),
            args: Vec::new(),
            block: None,
            location: SourceLocation::new(file, line),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_block(mut self, block: Vec<Statement>) -> Self {
        self.block = Some(block);
        self
    }

    /// Get the first argument
    pub fn first_arg(&self) -> Option<&str> {
        self.args.first().map(|s| s.as_str())
    }

    /// Find the first child statement with the given directive name
    pub fn find_directive(&self, directive: &str) -> Option<&Statement> {
        self.block
            .as_ref()
            .and_then(|b| b.iter().find(|s| s.directive == directive))
    }

    /// Get block children
    pub fn children(&self) -> &[Statement] {
        self.block.as_deref().unwrap_or(&[])
    }
}

/// The top-level statements contributed by one configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub statements: Vec<Statement>,
}
