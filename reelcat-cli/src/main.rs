// reelcat-cli/src/main.rs
//
// Entry point of the `reelcat` binary: parses arguments, initializes logging,
// dispatches to a command and maps the result to the process exit code
// (0 on success, 1 on any failure or a cancelled conversion).

use clap::Parser;
use reelcat_cli::error::user_message;
use reelcat_cli::logging::init_logging;
use reelcat_cli::terminal::print_error;
use reelcat_cli::{Cli, Commands, run_convert, run_probe};
use std::process;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Convert(args) => run_convert(args).map(|outcome| outcome.exit_code()),
        Commands::Probe(args) => run_probe(args).map(|()| 0),
    };

    match result {
        Ok(0) => {}
        Ok(code) => process::exit(code),
        Err(e) => {
            log::debug!("Command failed: {e:?}");
            let (message, hint) = user_message(&e);
            print_error(&message, hint);
            process::exit(1);
        }
    }
}
