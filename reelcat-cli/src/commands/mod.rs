//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command; the
//! helpers here turn shared arguments into core types.

/// The `convert` command: runs one conversion job with live progress.
pub mod convert;

/// The `probe` command: shows what a conversion would do.
pub mod probe;

use crate::cli::EncodingArgs;
use crate::error::CliResult;
use reelcat_core::config::{
    EncodingConfig, EncodingConfigBuilder, EncodingSettings, SizeUnit, parse_bitrate, parse_fps,
    parse_resolution, parse_target_size,
};
use reelcat_core::error::invalid_parameter;
use reelcat_core::inventory::{MediaInventory, natural_sort_paths};
use std::path::PathBuf;

/// Reads the settings file named by `--config`, if any.
pub fn load_settings(args: &EncodingArgs) -> CliResult<EncodingSettings> {
    match &args.config {
        Some(path) => EncodingSettings::load(path),
        None => Ok(EncodingSettings::default()),
    }
}

/// Settings file values, overridden by flags and environment variables.
pub fn build_encoding_config(
    args: &EncodingArgs,
    settings: &EncodingSettings,
) -> CliResult<EncodingConfig> {
    let mut builder = EncodingConfigBuilder::from_settings(settings);

    if let Some(raw) = &args.fps {
        builder = builder.fps(parse_fps(raw)?);
    }
    if let Some(kbps) = args.bitrate.as_deref().map(parse_bitrate).transpose()?.flatten() {
        builder = builder.bitrate_kbps(kbps);
    }
    if let Some(resolution) = args
        .resolution
        .as_deref()
        .map(parse_resolution)
        .transpose()?
        .flatten()
    {
        builder = builder.resolution(resolution);
    }

    let unit = match &args.size_unit {
        Some(raw) => raw.parse::<SizeUnit>()?,
        None => settings.target_size.map(|t| t.unit).unwrap_or_default(),
    };
    if let Some(raw) = &args.target_size {
        if let Some(target) = parse_target_size(raw, unit)? {
            builder = builder.target_size(target);
        }
    }

    if args.no_hardware {
        builder = builder.use_hardware_encoder(false);
    }

    let config = builder.build();
    config.validate()?;
    log::debug!("Encoding config: {config:?}");
    Ok(config)
}

/// Builds the inventory from the command-line inputs.
///
/// Inputs must be existing files. Unless `keep_order` is set they are put
/// in natural filename order first.
pub fn build_inventory(inputs: &[PathBuf], keep_order: bool) -> CliResult<MediaInventory> {
    if let Some(missing) = inputs.iter().find(|path| !path.is_file()) {
        return Err(invalid_parameter(format!(
            "input file not found: {}",
            missing.display()
        )));
    }

    let mut paths = inputs.to_vec();
    if !keep_order {
        natural_sort_paths(&mut paths);
    }

    let mut inventory = MediaInventory::new();
    inventory.add(paths)?;
    Ok(inventory)
}
