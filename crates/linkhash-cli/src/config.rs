//! Command-line parsing and the validated run configuration.

use std::path::PathBuf;

use clap::Parser;
use linkhash_core::OutputMode;

/// Computes a hash of the public API of an ELF shared object: the sorted list
/// of its GLOBAL and WEAK symbols, as a SHA-1 digest or as plain text.
#[derive(Debug, Parser)]
#[command(name = "linkhash")]
#[command(version)]
pub struct Cli {
    /// Output file, or `-` for stdout.
    #[arg(short = 'o', long = "outfile", value_name = "PATH", default_value = "-")]
    pub outfile: PathBuf,

    /// Print the API listing (`<BINDING>,<name>` per line) instead of its digest.
    #[arg(long)]
    pub dump_api: bool,

    /// Leave the output file untouched if it already holds exactly the new output.
    #[arg(long)]
    pub only_if_changed: bool,

    /// Write a JSONL structured log of the run to this path.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Shared object to fingerprint.
    #[arg(value_name = "FILEPATH")]
    pub filepath: PathBuf,
}

/// Where rendered output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    /// Short label for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Stdout => "-".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// Everything one run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input: PathBuf,
    pub output: OutputTarget,
    pub mode: OutputMode,
    pub only_if_changed: bool,
    pub log_file: Option<PathBuf>,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        let output = if cli.outfile.as_os_str() == "-" {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(cli.outfile)
        };
        let mode = if cli.dump_api {
            OutputMode::Dump
        } else {
            OutputMode::Digest
        };
        Self {
            input: cli.filepath,
            output,
            mode,
            only_if_changed: cli.only_if_changed,
            log_file: cli.log_file,
        }
    }
}
