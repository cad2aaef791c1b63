// ============================================================================
// reelcat-cli/src/commands/convert.rs
// ============================================================================
//
// CONVERT COMMAND: One conversion job from the command line
//
// Builds the inventory and encoding config from the arguments, submits the
// job to the orchestrator and renders its events until it ends. The CLI is
// the inventory owner: probe results coming back from the job are recorded
// into it by item id. On a terminal, typing `q` and Enter cancels the job
// after the step that is running.

use super::{build_encoding_config, build_inventory, load_settings};
use crate::cli::ConvertArgs;
use crate::error::CliResult;
use crate::logging::get_timestamp;
use crate::terminal::{JobDisplay, print_section, print_status, print_success, print_warning};
use reelcat_core::error::invalid_parameter;
use reelcat_core::external::check_dependencies;
use reelcat_core::job::{JobEvent, JobOutcome, Orchestrator};
use reelcat_core::progress::CancellationToken;
use reelcat_core::utils::{default_output_path, format_bytes, format_duration};
use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

/// How a `convert` run ended when nothing failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertOutcome {
    Completed(PathBuf),
    Cancelled,
}

impl ConvertOutcome {
    /// Process exit code for this outcome.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            ConvertOutcome::Completed(_) => 0,
            ConvertOutcome::Cancelled => 1,
        }
    }
}

/// Cancels through `cancel` once a line reading `q` arrives on `input`.
///
/// Returns whether a stop was requested before `input` ended.
pub fn watch_for_stop<R: BufRead>(input: R, cancel: &CancellationToken) -> bool {
    for line in input.lines() {
        match line {
            Ok(line) if line.trim().eq_ignore_ascii_case("q") => {
                log::info!("Stop requested, finishing the current step");
                cancel.cancel();
                return true;
            }
            Ok(_) => {}
            Err(e) => {
                log::debug!("Stopped watching stdin: {e}");
                break;
            }
        }
    }
    false
}

/// Runs the `convert` command.
pub fn run_convert(args: ConvertArgs) -> CliResult<ConvertOutcome> {
    let started = Instant::now();

    let settings = load_settings(&args.encoding)?;
    let config = build_encoding_config(&args.encoding, &settings)?;
    let mut inventory = build_inventory(&args.inputs, args.keep_order)?;

    let output = match args.output {
        Some(output) => output,
        None => inventory
            .items()
            .first()
            .map(|first| default_output_path(&first.path, &get_timestamp()))
            .ok_or_else(|| invalid_parameter("no input files selected"))?,
    };

    let mut pipeline = settings.pipeline_settings();
    if args.temp_dir.is_some() {
        pipeline.temp_dir = args.temp_dir;
    }

    check_dependencies()?;

    print_section("Conversion");
    print_status(
        "Inputs",
        &format!(
            "{} {}(s)",
            inventory.len(),
            inventory.kind().map_or_else(String::new, |k| k.to_string())
        ),
        false,
    );
    print_status("Frame rate", &format!("{} fps", config.fps), false);
    print_status("Output", &output.display().to_string(), true);

    let orchestrator = Orchestrator::with_defaults(pipeline);
    let handle = orchestrator.submit(inventory.snapshot(), config, output)?;

    if io::stdin().is_terminal() {
        let token = handle.cancellation_token();
        let watcher = thread::Builder::new()
            .name("reelcat-stdin".to_string())
            .spawn(move || {
                watch_for_stop(io::stdin().lock(), &token);
            });
        match watcher {
            Ok(_) => print_status("Stop", "type q and press Enter", false),
            Err(e) => log::debug!("Could not watch stdin for a stop request: {e}"),
        }
    }

    let mut display = JobDisplay::new();
    for event in handle.events().iter() {
        if let JobEvent::Probed { id, probe } = &event {
            inventory.record_probe(*id, *probe);
        }
        display.handle(&event);
    }
    drop(display);

    match handle.wait() {
        JobOutcome::Succeeded(path) => {
            print_section("Results");
            print_success("Conversion complete");
            print_status("Output", &path.display().to_string(), true);
            if let Ok(metadata) = std::fs::metadata(&path) {
                print_status("Size", &format_bytes(metadata.len()), false);
            }
            print_status(
                "Total time",
                &format_duration(started.elapsed().as_secs_f64()),
                false,
            );
            Ok(ConvertOutcome::Completed(path))
        }
        JobOutcome::Failed(e) => Err(e),
        JobOutcome::Cancelled => {
            print_section("Results");
            print_warning("Conversion cancelled");
            Ok(ConvertOutcome::Cancelled)
        }
    }
}
