//! Command-line front end for `linkhash`.
//!
//! - [`config`]: `clap` parser and the validated [`config::Config`]
//! - [`run`]: maps the input, renders the fingerprint and writes it out
//! - [`output`]: stdout / file sinks, including the write-only-if-changed mode
//! - [`structured_log`]: optional JSONL log of each run
#![forbid(unsafe_code)]

pub mod config;
pub mod output;
pub mod run;
pub mod structured_log;

use std::path::PathBuf;

use thiserror::Error;

pub use config::{Cli, Config, OutputTarget};
pub use output::WriteOutcome;
pub use run::{RunReport, execute};

/// Anything that makes a run exit non-zero.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Fingerprint(#[from] linkhash_core::Error),
    #[error("failed to open {} for writing: {source}", path.display())]
    OutputOpen {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write output to {target}: {source}")]
    OutputWrite {
        target: String,
        source: std::io::Error,
    },
    #[error("failed to open log file {}: {source}", path.display())]
    LogOpen {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write structured log: {0}")]
    LogWrite(std::io::Error),
}

impl CliError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        1
    }
}
