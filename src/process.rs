//! Batch dispatch and per-file processing.
//!
//! Takes one flat input directory and fills an output directory:
//!
//! ```text
//! input/                 output/
//! ├── a.heic     ──→     ├── a.jpg      (decoded, re-encoded, Exif carried over)
//! ├── b.jpg      ──→     ├── b.jpg      (byte copy, timestamps kept)
//! ├── c.txt              │              (skipped)
//! └── d.heic             └──            (failed: corrupt container)
//! ```
//!
//! ## Parallel Processing
//!
//! Entries are processed on a dedicated [rayon](https://docs.rs/rayon) pool
//! sized from [`BatchConfig::max_workers`]. Each file runs to completion on
//! one worker. A failing or panicking file becomes a
//! [`Outcome::Failed`] entry and never stops its siblings.
//!
//! ## Progress
//!
//! When given a channel, the dispatcher sends [`ProcessEvent::Started`] and
//! then one event per file as it finishes, in completion order. The returned
//! [`BatchReport`] lists every file in enumeration order.

use crate::config::{self, ConvertConfig, ProcessingConfig};
use crate::imaging::{
    BackendError, ExifError, HeifBackend, ImageBackend, Quality, TranscodeError,
    TranscodeOptions, copy_with_metadata, transcode_heic,
};
use crate::naming::{self, Action, Planned};
use crate::scan::{self, ScanError};
use crate::types::{ExifStatus, SkipReason, WorkItem};
use rayon::prelude::*;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Errors that stop the whole batch before any file is touched.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("Cannot start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Why a single file failed. Recorded in its outcome; the batch continues.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("transcode failed: {0}")]
    Transcode(#[source] BackendError),
    #[error("metadata failed: {0}")]
    Metadata(#[source] ExifError),
    #[error("copy failed: {0}")]
    Copy(#[source] std::io::Error),
    #[error("worker panicked: {0}")]
    Panicked(String),
}

impl From<TranscodeError> for FileError {
    fn from(e: TranscodeError) -> Self {
        match e {
            TranscodeError::Codec(e) => FileError::Transcode(e),
            TranscodeError::Metadata(e) => FileError::Metadata(e),
        }
    }
}

/// Terminal result for one entry.
#[derive(Debug)]
pub enum Outcome {
    Converted { output: PathBuf, exif: ExifStatus },
    Copied { output: PathBuf },
    Skipped { reason: SkipReason },
    Failed { error: FileError },
}

/// One entry's outcome, tagged with where it came from.
#[derive(Debug)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub file_name: String,
    pub outcome: Outcome,
}

/// Inputs for one batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Upper bound on parallel workers. `None` means one per CPU core.
    pub max_workers: Option<usize>,
    pub quality: Quality,
    pub preserve_exif: bool,
}

impl BatchConfig {
    /// Batch with default quality, Exif preserved, and automatic worker count.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self::from_config(input_dir, output_dir, &ConvertConfig::default())
    }

    /// Build a batch from resolved converter config.
    pub fn from_config(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        config: &ConvertConfig,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            max_workers: config.processing.max_processes,
            quality: Quality::new(config.jpeg.quality),
            preserve_exif: config.metadata.preserve_exif,
        }
    }

    /// Worker threads actually used: `min(max_workers, cores)`.
    pub fn effective_workers(&self) -> usize {
        config::effective_threads(&ProcessingConfig {
            max_processes: self.max_workers,
        })
    }

    fn transcode_options(&self) -> TranscodeOptions {
        TranscodeOptions {
            quality: self.quality,
            preserve_exif: self.preserve_exif,
        }
    }
}

/// Progress notifications sent while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    Started {
        total: usize,
        workers: usize,
    },
    Converted {
        file: String,
        output: String,
        exif: ExifStatus,
    },
    Copied {
        file: String,
    },
    Skipped {
        file: String,
        reason: SkipReason,
    },
    Failed {
        file: String,
        error: String,
    },
}

impl ProcessEvent {
    pub fn from_outcome(outcome: &FileOutcome) -> Self {
        let file = outcome.file_name.clone();
        match &outcome.outcome {
            Outcome::Converted { output, exif } => ProcessEvent::Converted {
                file,
                output: display_name(output),
                exif: *exif,
            },
            Outcome::Copied { .. } => ProcessEvent::Copied { file },
            Outcome::Skipped { reason } => ProcessEvent::Skipped {
                file,
                reason: *reason,
            },
            Outcome::Failed { error } => ProcessEvent::Failed {
                file,
                error: error.to_string(),
            },
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Every outcome of a run, in enumeration order, with per-kind counts.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub workers: usize,
    pub converted: usize,
    pub copied: usize,
    pub skipped: usize,
    pub failed: usize,
    pub files: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn new(workers: usize, files: Vec<FileOutcome>) -> Self {
        let mut report = Self {
            workers,
            ..Default::default()
        };
        for file in &files {
            match file.outcome {
                Outcome::Converted { .. } => report.converted += 1,
                Outcome::Copied { .. } => report.copied += 1,
                Outcome::Skipped { .. } => report.skipped += 1,
                Outcome::Failed { .. } => report.failed += 1,
            }
        }
        report.files = files;
        report
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn total(&self) -> usize {
        self.files.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, Outcome::Failed { .. }))
    }

    /// Pretty-printed JSON for `--report`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&ReportJson::from(self))
    }
}

#[derive(Serialize)]
struct ReportJson<'a> {
    converted: usize,
    copied: usize,
    skipped: usize,
    failed: usize,
    files: Vec<ReportEntry<'a>>,
}

#[derive(Serialize)]
struct ReportEntry<'a> {
    file: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exif: Option<ExifStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> From<&'a BatchReport> for ReportJson<'a> {
    fn from(report: &'a BatchReport) -> Self {
        let files = report
            .files
            .iter()
            .map(|f| {
                let mut entry = ReportEntry {
                    file: &f.file_name,
                    status: "",
                    output: None,
                    exif: None,
                    reason: None,
                    error: None,
                };
                match &f.outcome {
                    Outcome::Converted { output, exif } => {
                        entry.status = "converted";
                        entry.output = Some(display_name(output));
                        entry.exif = Some(*exif);
                    }
                    Outcome::Copied { output } => {
                        entry.status = "copied";
                        entry.output = Some(display_name(output));
                    }
                    Outcome::Skipped { reason } => {
                        entry.status = "skipped";
                        entry.reason = Some(*reason);
                    }
                    Outcome::Failed { error } => {
                        entry.status = "failed";
                        entry.error = Some(error.to_string());
                    }
                }
                entry
            })
            .collect();

        Self {
            converted: report.converted,
            copied: report.copied,
            skipped: report.skipped,
            failed: report.failed,
            files,
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Run a batch with the production codec backend.
pub fn process(
    config: &BatchConfig,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BatchReport, ProcessError> {
    let backend = HeifBackend::new();
    process_with_backend(&backend, config, events)
}

/// Run a batch using a specific backend (allows testing with mock).
///
/// Fails only for problems that prevent the batch from starting. Every
/// enumerated entry yields exactly one [`FileOutcome`] in the report.
pub fn process_with_backend(
    backend: &impl ImageBackend,
    config: &BatchConfig,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BatchReport, ProcessError> {
    let items = scan::scan(&config.input_dir, &config.output_dir)?;
    scan::prepare_output_dir(&config.input_dir, &config.output_dir)?;

    let workers = config.effective_workers();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("convert-{i}"))
        .build()?;

    if let Some(tx) = &events {
        tx.send(ProcessEvent::Started {
            total: items.len(),
            workers,
        })
        .ok();
    }

    let options = config.transcode_options();
    let files: Vec<FileOutcome> = pool.install(|| {
        items
            .par_iter()
            .map_with(events, |tx, item| {
                let outcome = FileOutcome {
                    source: item.source.clone(),
                    file_name: item.file_name(),
                    outcome: run_isolated(backend, item, &options),
                };
                if let Some(tx) = tx {
                    // Receiver may have gone away; the report still has it
                    tx.send(ProcessEvent::from_outcome(&outcome)).ok();
                }
                outcome
            })
            .collect()
    });

    Ok(BatchReport::new(workers, files))
}

/// Process one item, turning a panic into a failed outcome.
fn run_isolated(
    backend: &impl ImageBackend,
    item: &WorkItem,
    options: &TranscodeOptions,
) -> Outcome {
    panic::catch_unwind(AssertUnwindSafe(|| process_file(backend, item, options))).unwrap_or_else(
        |payload| Outcome::Failed {
            error: FileError::Panicked(panic_message(&*payload)),
        },
    )
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

// ============================================================================
// Per-file processing
// ============================================================================

/// Decide what an entry will become, without touching the output.
fn classify_entry(source: &Path) -> Result<Planned, SkipReason> {
    if !source.is_file() {
        return Err(SkipReason::NotAFile);
    }
    source
        .file_name()
        .and_then(|name| naming::plan(Path::new(name)))
        .ok_or(SkipReason::UnsupportedExtension)
}

/// Transcode, copy, or skip a single entry.
pub fn process_file(
    backend: &impl ImageBackend,
    item: &WorkItem,
    options: &TranscodeOptions,
) -> Outcome {
    let planned = match classify_entry(&item.source) {
        Ok(planned) => planned,
        Err(reason) => return Outcome::Skipped { reason },
    };
    let output = item.output_dir.join(&planned.output_name);

    match planned.action {
        Action::Transcode => match transcode_heic(backend, &item.source, &output, options) {
            Ok(exif) => Outcome::Converted { output, exif },
            Err(e) => Outcome::Failed { error: e.into() },
        },
        Action::Copy => match copy_with_metadata(&item.source, &output) {
            Ok(()) => Outcome::Copied { output },
            Err(e) => Outcome::Failed {
                error: FileError::Copy(e),
            },
        },
    }
}

// ============================================================================
// Dry run
// ============================================================================

/// What a batch would do with one entry.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedAction {
    Transcode { output: String },
    Copy,
    Skip(SkipReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntry {
    pub file_name: String,
    pub action: PlannedAction,
}

/// Classify every entry of `input_dir` without writing anything.
pub fn plan_batch(input_dir: &Path) -> Result<Vec<PlanEntry>, ProcessError> {
    let entries = scan::list_entries(input_dir)?;
    Ok(entries
        .iter()
        .map(|source| {
            let action = match classify_entry(source) {
                Ok(Planned {
                    action: Action::Transcode,
                    output_name,
                }) => PlannedAction::Transcode {
                    output: output_name.to_string_lossy().into_owned(),
                },
                Ok(Planned {
                    action: Action::Copy,
                    ..
                }) => PlannedAction::Copy,
                Err(reason) => PlannedAction::Skip(reason),
            };
            PlanEntry {
                file_name: display_name(source),
                action,
            }
        })
        .collect())
}
