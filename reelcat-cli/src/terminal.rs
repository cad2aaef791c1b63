// ============================================================================
// reelcat-cli/src/terminal.rs
// ============================================================================
//
// TERMINAL OUTPUT: UI Components and Styling
//
// Section headers, status lines and the encode progress bar. Job events are
// rendered here on the main thread; the job itself never touches the
// terminal.
//
// KEY COMPONENTS:
// - print_section / print_processing / print_status / print_success
// - print_warning / print_error
// - JobDisplay: turns JobEvents into status lines, a clip spinner and an
//   indicatif bar

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use reelcat_core::job::{JobEvent, JobState};
use reelcat_core::progress::ProgressSnapshot;
use reelcat_core::utils::format_eta;
use std::time::Duration;

/// Check if color should be used (respects NO_COLOR environment variable)
fn should_use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// Print a section header
pub fn print_section(title: &str) {
    println!();
    if should_use_color() {
        println!("===== {} =====", title.to_uppercase().cyan().bold());
    } else {
        println!("===== {} =====", title.to_uppercase());
    }
}

/// Print a processing step
pub fn print_processing(message: &str) {
    if should_use_color() {
        println!("  » {}", style(message).bold());
    } else {
        println!("  » {message}");
    }
}

/// Print an aligned `label: value` line
pub fn print_status(label: &str, value: &str, highlight: bool) {
    let label_width: usize = 15;
    let padding = label_width.saturating_sub(label.len()).max(1);

    if should_use_color() && highlight {
        println!("      {label}:{} {}", " ".repeat(padding), style(value).bold());
    } else {
        println!("      {label}:{} {value}", " ".repeat(padding));
    }
}

pub fn print_success(message: &str) {
    if should_use_color() {
        println!("  {} {}", "✓".green().bold(), message.green());
    } else {
        println!("  ✓ {message}");
    }
}

/// Print a warning line
pub fn print_warning(message: &str) {
    if should_use_color() {
        println!("  {} {}", "⚠".yellow().bold(), message.yellow());
    } else {
        println!("  ⚠ {message}");
    }
}

/// Print a failure with an optional hint to stderr
pub fn print_error(message: &str, hint: Option<&str>) {
    if should_use_color() {
        eprintln!("{} {}", style("✗").bold().red(), style(message).bold().red());
    } else {
        eprintln!("✗ {message}");
    }
    if let Some(hint) = hint {
        eprintln!("  {hint}");
    }
}

/// Text after the bar: frame count, throughput and time remaining.
pub fn format_progress_message(snapshot: &ProgressSnapshot) -> String {
    let fps = snapshot
        .fps
        .map_or_else(|| "--".to_string(), |fps| format!("{fps:.1}"));
    let eta = snapshot.eta.map_or_else(|| "--:--".to_string(), format_eta);
    format!(
        "frame {}/{} | {fps} fps | ETA {eta}",
        snapshot.current_frame, snapshot.total_units
    )
}

/// Spinner text while a clip is normalized; clips have no known length.
pub fn format_clip_message(clip: usize, total: usize, snapshot: &ProgressSnapshot) -> String {
    let fps = snapshot
        .fps
        .map_or_else(|| "--".to_string(), |fps| format!("{fps:.1}"));
    format!("clip {clip}/{total} | frame {} | {fps} fps", snapshot.current_frame)
}

/// Renders the events of one conversion job.
#[derive(Default)]
pub struct JobDisplay {
    bar: Option<ProgressBar>,
}

impl JobDisplay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: &JobEvent) {
        match event {
            JobEvent::State(JobState::Probing) => print_processing("Probing inputs"),
            JobEvent::State(JobState::Transcoding) => {
                print_processing("Normalizing clips");
                self.start_spinner();
            }
            JobEvent::State(JobState::Concatenating) => {
                self.finish_bar();
                print_processing("Encoding");
                self.start_bar();
            }
            JobEvent::State(state) if state.is_terminal() => self.finish_bar(),
            JobEvent::State(_) => {}
            JobEvent::Probed { .. } => {}
            JobEvent::ClipTranscoded { done, total } => {
                let line = || print_status("Clips", &format!("{done}/{total}"), false);
                match &self.bar {
                    Some(bar) => bar.suspend(line),
                    None => line(),
                }
            }
            JobEvent::ClipProgress {
                clip,
                total,
                snapshot,
            } => {
                if let Some(bar) = &self.bar {
                    bar.set_message(format_clip_message(*clip, *total, snapshot));
                }
            }
            JobEvent::Progress(snapshot) => {
                if let Some(bar) = &self.bar {
                    bar.set_position(snapshot.percent.round() as u64);
                    bar.set_message(format_progress_message(snapshot));
                }
            }
        }
    }

    fn start_bar(&mut self) {
        let bar = ProgressBar::new(100);
        let template = if should_use_color() {
            "Encoding [{bar:40.cyan/blue}] {percent:>3}% | {msg}"
        } else {
            "Encoding [{bar:40}] {percent:>3}% | {msg}"
        };
        match ProgressStyle::default_bar().template(template) {
            Ok(progress_style) => bar.set_style(progress_style.progress_chars("=> ")),
            Err(e) => log::debug!("Falling back to the default progress style: {e}"),
        }
        bar.enable_steady_tick(Duration::from_millis(120));
        self.bar = Some(bar);
    }

    fn start_spinner(&mut self) {
        let spinner = ProgressBar::new_spinner();
        match ProgressStyle::default_spinner().template("  {spinner} {msg}") {
            Ok(progress_style) => spinner.set_style(progress_style),
            Err(e) => log::debug!("Falling back to the default spinner style: {e}"),
        }
        spinner.enable_steady_tick(Duration::from_millis(120));
        self.bar = Some(spinner);
    }

    fn finish_bar(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Drop for JobDisplay {
    fn drop(&mut self) {
        self.finish_bar();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_message() {
        let snapshot = ProgressSnapshot {
            current_frame: 12,
            total_units: 30,
            percent: 40.0,
            fps: Some(24.0),
            eta: Some(Duration::from_secs(65)),
            elapsed: Duration::from_secs(2),
        };
        assert_eq!(
            format_progress_message(&snapshot),
            "frame 12/30 | 24.0 fps | ETA 01:05"
        );

        let early = ProgressSnapshot {
            fps: None,
            eta: None,
            ..snapshot
        };
        assert_eq!(
            format_progress_message(&early),
            "frame 12/30 | -- fps | ETA --:--"
        );
    }

    #[test]
    fn test_clip_message_has_no_total_frames() {
        let snapshot = ProgressSnapshot {
            current_frame: 48,
            total_units: 0,
            percent: 0.0,
            fps: Some(96.0),
            eta: None,
            elapsed: Duration::from_millis(500),
        };
        assert_eq!(
            format_clip_message(2, 3, &snapshot),
            "clip 2/3 | frame 48 | 96.0 fps"
        );
    }

    #[test]
    fn test_display_switches_from_spinner_to_bar() {
        let snapshot = ProgressSnapshot {
            current_frame: 5,
            total_units: 0,
            percent: 0.0,
            fps: None,
            eta: None,
            elapsed: Duration::ZERO,
        };
        let mut display = JobDisplay::new();
        display.handle(&JobEvent::State(JobState::Transcoding));
        assert!(display.bar.is_some());
        display.handle(&JobEvent::ClipProgress {
            clip: 1,
            total: 1,
            snapshot,
        });
        display.handle(&JobEvent::ClipTranscoded { done: 1, total: 1 });
        display.handle(&JobEvent::State(JobState::Concatenating));
        assert_eq!(display.bar.as_ref().and_then(ProgressBar::length), Some(100));
        display.handle(&JobEvent::State(JobState::Succeeded));
        assert!(display.bar.is_none());
    }
}
