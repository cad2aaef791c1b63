// reelcat-cli/src/lib.rs
//
// Library portion of the Reelcat CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod terminal;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, ConvertArgs, EncodingArgs, ProbeArgs};
pub use commands::convert::{ConvertOutcome, run_convert};
pub use commands::probe::run_probe;
pub use error::CliResult;
