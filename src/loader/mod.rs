//! Loads the swarm aggregation file and the per-node fragments it includes.

use crate::config::{ParsedFile, Statement};
use crate::parser::{parse_source, ParseError};
use glob::glob;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Written when the aggregation entry point is missing: every nginx-proxy
/// node drops its fragment next to it, so pull in all of them.
pub const DEFAULT_SWARM_CONFIG: &str = "http {\n    include ./*.conf;\n}\n";

/// Reads the swarm aggregation file and produces one `ParsedFile` per
/// contributing fragment, in include-then-glob order.
pub struct ConfigLoader {
    swarm_config: PathBuf,
}

impl ConfigLoader {
    pub fn new(swarm_config: impl Into<PathBuf>) -> Self {
        Self {
            swarm_config: swarm_config.into(),
        }
    }

    /// Ensure the aggregation file exists (writing the default if it does
    /// not), parse it, and expand the includes of its top-level blocks.
    /// Literal statements inside an aggregation block are grouped as if the
    /// aggregation file were one more contributing node, preserving their
    /// position among the includes.
    pub fn load(&self) -> Result<Vec<ParsedFile>, ParseError> {
        if !self.swarm_config.is_file() {
            fs::write(&self.swarm_config, DEFAULT_SWARM_CONFIG)?;
        }

        let content = fs::read_to_string(&self.swarm_config)?;
        let statements = parse_source(&content, &self.swarm_config)?;
        let base_dir = self
            .swarm_config
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut files: Vec<ParsedFile> = Vec::new();
        for statement in &statements {
            let Some(children) = statement.block.as_deref() else {
                continue;
            };
            for child in children {
                if child.directive == "include" {
                    let Some(pattern) = child.first_arg() else {
                        continue;
                    };
                    for path in self.expand_include(pattern, &base_dir, child)? {
                        let fragment = fs::read_to_string(&path)?;
                        files.push(ParsedFile {
                            statements: parse_source(&fragment, &path)?,
                            path,
                        });
                    }
                } else {
                    match files.last_mut() {
                        Some(last) if last.path == self.swarm_config => {
                            last.statements.push(child.clone())
                        }
                        _ => files.push(ParsedFile {
                            path: self.swarm_config.clone(),
                            statements: vec![child.clone()],
                        }),
                    }
                }
            }
        }

        Ok(files)
    }

    /// Expand an include argument into fragment paths. Globs with no match
    /// yield nothing (nginx semantics); a literal path that does not exist
    /// is an error. The aggregation file never includes itself.
    fn expand_include(
        &self,
        pattern: &str,
        base_dir: &Path,
        origin: &Statement,
    ) -> Result<Vec<PathBuf>, ParseError> {
        let resolved = if Path::new(pattern).is_absolute() {
            pattern.to_string()
        } else {
            base_dir.join(pattern).to_string_lossy().into_owned()
        };

        if resolved.contains(|c: char| matches!(c, '*' | '?' | '[')) {
            let entry = self
                .swarm_config
                .canonicalize()
                .unwrap_or_else(|_| self.swarm_config.clone());

            let mut paths: Vec<PathBuf> = glob(&resolved)
                .map_err(|e| ParseError::Syntax {
                    file: origin.location.file.clone(),
                    line: origin.location.line,
                    message: format!("invalid include pattern: {}", e),
                })?
                .filter_map(|entry| entry.ok())
                .filter(|path| path.is_file())
                .filter(|path| path.canonicalize().map(|c| c != entry).unwrap_or(true))
                .collect();

            // Sort for consistent ordering
            paths.sort();
            Ok(paths)
        } else {
            let path = PathBuf::from(resolved);
            if path.is_file() {
                Ok(vec![path])
            } else {
                Err(ParseError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("include file not found: {}", path.display()),
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_default_aggregation_file() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("swarm.conf");

        let files = ConfigLoader::new(&entry).load().unwrap();

        assert_eq!(fs::read_to_string(&entry).unwrap(), DEFAULT_SWARM_CONFIG);
        // The wildcard matches only the aggregation file itself, which is
        // excluded from its own expansion.
        assert!(files.is_empty());
    }

    #[test]
    fn test_loads_fragments_in_sorted_order() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("swarm.conf");
        fs::write(&entry, "http { include ./node-*.conf; }").unwrap();
        fs::write(dir.path().join("node-b.conf"), "upstream b { server 10.0.0.2; }").unwrap();
        fs::write(dir.path().join("node-a.conf"), "upstream a { server 10.0.0.1; }").unwrap();

        let files = ConfigLoader::new(&entry).load().unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, dir.path().join("node-a.conf"));
        assert_eq!(files[0].statements[0].args, vec!["a"]);
        assert_eq!(files[1].statements[0].args, vec!["b"]);
    }

    #[test]
    fn test_groups_literal_statements_with_entry_file() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("swarm.conf");
        fs::write(
            &entry,
            "http {\n    resolver 127.0.0.11;\n    include ./node-*.conf;\n}\n",
        )
        .unwrap();
        fs::write(dir.path().join("node-a.conf"), "server_tokens off;").unwrap();

        let files = ConfigLoader::new(&entry).load().unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, entry);
        assert_eq!(files[0].statements[0].directive, "resolver");
        assert_eq!(files[1].statements[0].directive, "server_tokens");
    }

    #[test]
    fn test_missing_literal_include_is_an_error() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("swarm.conf");
        fs::write(&entry, "http { include ./missing.conf; }").unwrap();

        let err = ConfigLoader::new(&entry).load().unwrap_err();
        assert!(matches!(err, ParseError::Io(_)));
    }

    #[test]
    fn test_fragment_parse_error_propagates() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("swarm.conf");
        fs::write(&entry, "http { include ./node-*.conf; }").unwrap();
        fs::write(dir.path().join("node-a.conf"), "server_name x.test").unwrap();

        let err = ConfigLoader::new(&entry).load().unwrap_err();
        match err {
            ParseError::Syntax { file, .. } => {
                assert_eq!(file, dir.path().join("node-a.conf"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_nested_includes_are_not_expanded() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("swarm.conf");
        fs::write(&entry, "http { include ./node-*.conf; }").unwrap();
        fs::write(
            dir.path().join("node-a.conf"),
            "server {\n    include /etc/nginx/vhost.d/x.test;\n}\n",
        )
        .unwrap();

        let files = ConfigLoader::new(&entry).load().unwrap();
        let server = &files[0].statements[0];
        assert_eq!(server.children()[0].directive, "include");
        assert_eq!(server.children()[0].args, vec!["/etc/nginx/vhost.d/x.test"]);
    }
}
