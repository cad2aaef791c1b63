// reelcat-cli/src/commands/probe.rs
//
// Shows each input's kind and probed facts, followed by the resolution and
// bitrate a conversion with the same options would use. Nothing is encoded.

use super::{build_encoding_config, build_inventory, load_settings};
use crate::cli::ProbeArgs;
use crate::error::CliResult;
use crate::terminal::{print_processing, print_section, print_status};
use reelcat_core::external::{FfprobeProber, probe_items};
use reelcat_core::params::resolve;

/// Runs the `probe` command.
pub fn run_probe(args: ProbeArgs) -> CliResult<()> {
    let settings = load_settings(&args.encoding)?;
    let config = build_encoding_config(&args.encoding, &settings)?;
    let mut inventory = build_inventory(&args.inputs, args.keep_order)?;

    let probes = probe_items(&FfprobeProber, inventory.items());
    let ids: Vec<_> = inventory.items().iter().map(|item| item.id).collect();
    for (id, probe) in ids.into_iter().zip(probes) {
        inventory.record_probe(id, probe);
    }

    print_section("Inputs");
    for item in inventory.items() {
        print_processing(&item.path.display().to_string());
        print_status("Kind", &item.kind.to_string(), false);
        let dimensions = item
            .probe
            .dimensions
            .map_or_else(|| "unknown".to_string(), |d| d.to_string());
        print_status("Dimensions", &dimensions, false);
        if let Some(kbps) = item.probe.bitrate_kbps {
            print_status("Bitrate", &format!("{kbps} kbps"), false);
        }
    }

    let params = resolve(&config, inventory.items())?;
    print_section("Conversion parameters");
    print_status("Frame rate", &format!("{} fps", config.fps), false);
    print_status(
        "Resolution",
        &params
            .resolution
            .map_or_else(|| "native".to_string(), |r| r.to_string()),
        true,
    );
    print_status("Bitrate", &format!("{} kbps", params.bitrate_kbps), true);
    print_status(
        "Hardware",
        if config.use_hardware_encoder {
            "NVENC if available"
        } else {
            "disabled"
        },
        false,
    );
    Ok(())
}
