//! swarm-merge
//!
//! Merges the nginx virtual-host fragments contributed by each nginx-proxy
//! node in a swarm into one deduplicated configuration file and reloads
//! nginx. Duplicate `upstream` blocks (same name) and `server` blocks (same
//! `server_name`) contributed by multiple nodes collapse into the
//! first-seen entry.

pub mod cli;
pub mod config;
pub mod dedup;
pub mod emitter;
pub mod loader;
pub mod parser;
pub mod reload;

use dedup::{DedupMode, Deduplicator, MergedConfig};
use emitter::{EmitterOptions, NginxEmitter};
use loader::ConfigLoader;
use reload::ReloadInvoker;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use thiserror::Error;

/// Default aggregation entry point the nginx-proxy nodes write next to.
pub const DEFAULT_SWARM_CONFIG_PATH: &str = "/etc/nginx/node.conf.d/swarm.conf";

/// Default merged output consumed by nginx.
pub const DEFAULT_OUTPUT_PATH: &str = "/etc/nginx/conf.d/default.conf";

/// Default reload command.
pub const DEFAULT_RELOAD_CMD: &str = "nginx -s reload";

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("{0}")]
    Parse(#[from] parser::ParseError),

    #[error("Failed to write {path}: {source}")]
    WriteOutput { path: PathBuf, source: io::Error },

    #[error("Failed to run reload command: {0}")]
    Reload(io::Error),
}

pub type Result<T> = std::result::Result<T, MergeError>;

/// Options for a merge run.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Swarm aggregation entry point
    pub swarm_config: PathBuf,
    /// Duplicate detection mode
    pub mode: DedupMode,
    /// Output rendering options
    pub emitter: EmitterOptions,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            swarm_config: PathBuf::from(DEFAULT_SWARM_CONFIG_PATH),
            mode: DedupMode::default(),
            emitter: EmitterOptions::default(),
        }
    }
}

/// Outcome of the load, dedup and render stages.
#[derive(Debug, Clone)]
pub struct MergeReport {
    /// Fragment files that contributed statements, in traversal order
    pub sources: Vec<PathBuf>,
    /// The deduplicated statement list and duplicate notes
    pub merged: MergedConfig,
    /// The merged configuration rendered as nginx syntax
    pub rendered: String,
}

/// Load the swarm aggregation file, deduplicate the fragments it includes
/// and render the merged configuration. Writes nothing except the default
/// aggregation file when it is missing; writing the output and invoking
/// the reload are the caller's next steps, in that order.
pub fn merge(options: &MergeOptions) -> Result<MergeReport> {
    let files = ConfigLoader::new(&options.swarm_config).load()?;
    let merged = Deduplicator::new(options.mode).merge(&files);
    let rendered = NginxEmitter::new(options.emitter.clone()).emit(&merged.statements);

    Ok(MergeReport {
        sources: files.into_iter().map(|f| f.path).collect(),
        merged,
        rendered,
    })
}

/// Write the rendered configuration, fully replacing any previous content.
/// Nothing is written until the whole merged config has been computed, so a
/// failed run never leaves a partial file behind.
pub fn write_output(path: &Path, rendered: &str) -> Result<()> {
    fs::write(path, rendered).map_err(|source| MergeError::WriteOutput {
        path: path.to_path_buf(),
        source,
    })
}

/// Run the whole pipeline: merge, write the output, then invoke the reload
/// command. The reload only runs once the output write has succeeded, so a
/// write failure never reloads the server against a stale file. The exit
/// status is returned for the caller to report.
pub fn run(
    options: &MergeOptions,
    output: &Path,
    reload_cmd: &str,
) -> Result<(MergeReport, ExitStatus)> {
    let report = merge(options)?;
    write_output(output, &report.rendered)?;
    let status = ReloadInvoker::new(reload_cmd).invoke()?;
    Ok((report, status))
}
