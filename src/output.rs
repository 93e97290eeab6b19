//! CLI output formatting.
//!
//! Every formatter is a pure function returning display lines, so the exact
//! text is unit-tested without capturing stdout. The `print_*` wrappers write
//! those lines.
//!
//! # Output Format
//!
//! ## Convert
//!
//! One line per file as it finishes (completion order), then a summary:
//!
//! ```text
//! Converted a.heic to a.jpg
//! Copied b.jpg to output folder
//! Skipped c.txt: unsupported extension        (--verbose only)
//! Failed d.heic: transcode failed: ...
//! Converted 1, copied 1, skipped 1, failed 1
//! ```
//!
//! ## Check
//!
//! ```text
//! a.heic → a.jpg
//! b.jpg → copy
//! c.txt → skip (unsupported extension)
//! 1 to convert, 1 to copy, 1 to skip
//! ```

use crate::process::{BatchReport, PlanEntry, PlannedAction, ProcessEvent};
use crate::types::ExifStatus;

// ============================================================================
// Convert output
// ============================================================================

/// Format a single progress event as display lines.
///
/// Skipped files and the start banner are only shown when `verbose`.
pub fn format_process_event(event: &ProcessEvent, verbose: bool) -> Vec<String> {
    match event {
        ProcessEvent::Started { total, workers } if verbose => {
            vec![format!("Processing {} entries with {} workers", total, workers)]
        }
        ProcessEvent::Started { .. } => Vec::new(),
        ProcessEvent::Converted { file, output, exif } => {
            let mut line = format!("Converted {} to {}", file, output);
            if verbose {
                match exif {
                    ExifStatus::Preserved => line.push_str(" (exif preserved)"),
                    ExifStatus::Absent => line.push_str(" (no exif)"),
                    ExifStatus::Stripped => line.push_str(" (exif stripped)"),
                }
            }
            vec![line]
        }
        ProcessEvent::Copied { file } => vec![format!("Copied {} to output folder", file)],
        ProcessEvent::Skipped { file, reason } if verbose => {
            vec![format!("Skipped {}: {}", file, reason)]
        }
        ProcessEvent::Skipped { .. } => Vec::new(),
        ProcessEvent::Failed { file, error } => vec![format!("Failed {}: {}", file, error)],
    }
}

pub fn print_process_event(event: &ProcessEvent, verbose: bool) {
    for line in format_process_event(event, verbose) {
        println!("{}", line);
    }
}

/// Format the end-of-batch summary line.
pub fn format_summary(report: &BatchReport) -> Vec<String> {
    vec![format!(
        "Converted {}, copied {}, skipped {}, failed {}",
        report.converted, report.copied, report.skipped, report.failed
    )]
}

pub fn print_summary(report: &BatchReport) {
    for line in format_summary(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format the dry-run plan: one line per entry, then totals.
pub fn format_plan(entries: &[PlanEntry]) -> Vec<String> {
    let mut lines = Vec::new();
    let (mut convert, mut copy, mut skip) = (0, 0, 0);

    for entry in entries {
        let target = match &entry.action {
            PlannedAction::Transcode { output } => {
                convert += 1;
                output.clone()
            }
            PlannedAction::Copy => {
                copy += 1;
                "copy".to_string()
            }
            PlannedAction::Skip(reason) => {
                skip += 1;
                format!("skip ({})", reason)
            }
        };
        lines.push(format!("{} \u{2192} {}", entry.file_name, target));
    }

    lines.push(format!(
        "{} to convert, {} to copy, {} to skip",
        convert, copy, skip
    ));
    lines
}

pub fn print_plan(entries: &[PlanEntry]) {
    for line in format_plan(entries) {
        println!("{}", line);
    }
}
