// ============================================================================
// reelcat-cli/src/logging.rs
// ============================================================================
//
// LOGGING: env_logger setup and timestamp helper
//
// The core library logs through the `log` facade; the CLI installs
// `env_logger` as the backend with a compact, colored format on stderr.
//
// USAGE:
// - RUST_LOG=info (default): Normal operation logs
// - RUST_LOG=debug or --verbose: ffmpeg command lines, probe results
// - RUST_LOG=trace: Very verbose debugging information

use log::LevelFilter;
use owo_colors::OwoColorize;
use std::io::Write;

/// Initializes env_logger. `RUST_LOG` wins over the `verbose` default.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let env = env_logger::Env::default().default_filter_or(default_level.as_str());
    let use_color = std::env::var_os("NO_COLOR").is_none();

    env_logger::Builder::from_env(env)
        .format(move |buf, record| {
            let timestamp = buf.timestamp_seconds();
            let level_str = match record.level() {
                log::Level::Error => "ERROR",
                log::Level::Warn => "WARN ",
                log::Level::Info => "INFO ",
                log::Level::Debug => "DEBUG",
                log::Level::Trace => "TRACE",
            };

            if use_color {
                let level_colored = match record.level() {
                    log::Level::Error => level_str.bright_red().to_string(),
                    log::Level::Warn => level_str.yellow().to_string(),
                    log::Level::Info => level_str.green().to_string(),
                    log::Level::Debug => level_str.blue().to_string(),
                    log::Level::Trace => level_str.magenta().to_string(),
                };
                writeln!(buf, "{} {} {}", timestamp.dimmed(), level_colored, record.args())
            } else {
                writeln!(buf, "{timestamp} {level_str} {}", record.args())
            }
        })
        .init();

    log::debug!("Logger initialized with default level: {default_level}");
}

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// Used for the default output file name.
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_shape() {
        let stamp = get_timestamp();
        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.as_bytes()[8], b'_');
        assert!(stamp.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }
}
