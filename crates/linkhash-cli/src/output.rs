//! Output sink wiring.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::CliError;
use crate::config::OutputTarget;

/// What happened to the output destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The file already held exactly these bytes and was left alone.
    Unchanged,
}

impl WriteOutcome {
    /// Structured-log event name.
    pub fn event(self) -> &'static str {
        match self {
            Self::Written => "output.written",
            Self::Unchanged => "output.unchanged",
        }
    }
}

/// Write a fully rendered output to `target`.
///
/// Files are created if missing and truncated before writing. With
/// `only_if_changed`, a file whose current contents equal `bytes` is not
/// opened for writing at all, so its modification time is preserved.
/// `only_if_changed` has no effect on stdout.
pub fn write_output(
    target: &OutputTarget,
    bytes: &[u8],
    only_if_changed: bool,
) -> Result<WriteOutcome, CliError> {
    match target {
        OutputTarget::Stdout => {
            let mut out = io::stdout().lock();
            out.write_all(bytes)
                .and_then(|()| out.flush())
                .map_err(|source| CliError::OutputWrite {
                    target: target.describe(),
                    source,
                })?;
            Ok(WriteOutcome::Written)
        }
        OutputTarget::File(path) => {
            if only_if_changed && holds_exactly(path, bytes) {
                return Ok(WriteOutcome::Unchanged);
            }
            write_file(path, bytes)?;
            Ok(WriteOutcome::Written)
        }
    }
}

fn holds_exactly(path: &Path, bytes: &[u8]) -> bool {
    // Any read failure just means the file gets rewritten.
    std::fs::read(path).is_ok_and(|current| current == bytes)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    let mut file = File::create(path).map_err(|source| CliError::OutputOpen {
        path: path.to_path_buf(),
        source,
    })?;
    file.write_all(bytes)
        .and_then(|()| file.flush())
        .map_err(|source| CliError::OutputWrite {
            target: path.display().to_string(),
            source,
        })
}
