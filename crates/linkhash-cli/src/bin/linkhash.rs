//! CLI entrypoint for linkhash.

use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use linkhash_cli::{Cli, Config, execute};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version go to stdout and count as success.
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
            let _ = err.print();
            return code;
        }
    };

    match execute(&Config::from(cli)) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("linkhash: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
