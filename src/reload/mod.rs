//! Invokes the external reload command and relays its output.

use crate::{MergeError, Result};
use std::io::{self, Write};
use std::process::{Command, ExitStatus, Output};

/// Runs a configured reload command (e.g. `nginx -s reload`).
pub struct ReloadInvoker {
    command: String,
}

impl ReloadInvoker {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Run the command to completion and relay any captured stdout/stderr
    /// verbatim to this process's streams. The exit status is returned for
    /// the caller to report; a non-zero status is not an error here.
    pub fn invoke(&self) -> Result<ExitStatus> {
        let mut parts = self.command.split_whitespace();
        let program = parts.next().ok_or_else(|| {
            MergeError::Reload(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty reload command",
            ))
        })?;

        let output = Command::new(program)
            .args(parts)
            .output()
            .map_err(MergeError::Reload)?;

        relay(&output)?;
        Ok(output.status)
    }
}

fn relay(output: &Output) -> Result<()> {
    if !output.stdout.is_empty() {
        io::stdout()
            .write_all(&output.stdout)
            .map_err(MergeError::Reload)?;
    }
    if !output.stderr.is_empty() {
        io::stderr()
            .write_all(&output.stderr)
            .map_err(MergeError::Reload)?;
    }
    Ok(())
}
