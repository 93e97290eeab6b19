//! # Simple HEIC
//!
//! Batch-convert a folder of phone photos: every `.heic` becomes a `.jpg`
//! with its Exif metadata intact, and the media a JPEG workflow already
//! understands (`.jpg`, `.png`, `.mp4`, `.mp3`) is copied alongside unchanged.
//! Anything else is left behind.
//!
//! ```text
//! input/                 output/
//! ├── IMG_0001.HEIC  →   ├── IMG_0001.jpg
//! ├── IMG_0002.jpg   →   ├── IMG_0002.jpg
//! ├── clip.mp4       →   ├── clip.mp4
//! └── notes.txt          └── (skipped)
//! ```
//!
//! # Architecture
//!
//! One pass, one flat directory, one rayon pool:
//!
//! ```text
//! scan        input/   →  Vec<WorkItem>       (sorted, non-recursive)
//! process     items    →  output/ + events    (parallel, per-file isolation)
//! report      outcomes →  BatchReport         (counters, JSON, exit status)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Lists the input directory and prepares the output directory |
//! | [`naming`] | Extension-based routing and output file names |
//! | [`process`] | Dispatcher, per-file processing, outcomes and the batch report |
//! | [`imaging`] | HEIC decode, JPEG encode, Exif carry-over, timestamped copies |
//! | [`config`] | Layered TOML config: stock defaults, file, command-line overrides |
//! | [`types`] | Small shared types (`WorkItem`, `SkipReason`, `ExifStatus`) |
//! | [`output`] | CLI line formatting for progress, summary and dry runs |
//!
//! # Design Decisions
//!
//! ## Failures Stay Local
//!
//! A corrupt HEIC, an unreadable file, or even a panicking decoder turns into
//! one `Failed` outcome. Every other file of the batch is still processed and
//! reported. Only problems that make the whole batch meaningless (missing
//! input directory, output directory that cannot be created) abort early.
//!
//! ## libheif Behind a Feature
//!
//! HEIC decoding links the system libheif through `libheif-rs`, enabled with
//! the `heif` cargo feature. JPEG encoding, Exif handling and copying are pure
//! Rust, so a build without the feature still copies media and reports each
//! HEIC as a clear per-file failure.

pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
