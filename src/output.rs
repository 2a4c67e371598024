//! CLI output formatting.
//!
//! # Identity-First Display
//!
//! Every line leads with the media item's identity (`<class> <id>`), with
//! paths and errors shown as indented context. Workers for different classes
//! run concurrently, so progress lines are self-contained rather than
//! grouped under a header that another worker could interleave with.
//!
//! # Output Format
//!
//! ## Processing
//!
//! ```text
//! photo 42: processing
//!     t50 50x50
//!     f300 300x225
//! photo 42: ready
//! avatar 7: failed
//!     Error: cannot read original static/avatars/7_o.jpg: ...
//! ```
//!
//! ## Status
//!
//! ```text
//! Photos
//! 001 #42 ready
//!     Original: photos/42_k3v9...q1_o.jpg
//!
//! Avatars
//! 001 #7 failed
//!     Original: avatars/7_o.jpg
//!
//! 1 ready, 0 pending, 1 failed
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::paths::{ORIGINAL_SUFFIX, PathResolver};
use crate::pipeline::{PipelineStats, ProcessEvent};
use crate::types::{MediaClass, MediaItem, ProcessingStatus};
use std::path::{Path, PathBuf};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn section_title(class: MediaClass) -> &'static str {
    match class {
        MediaClass::Photo => "Photos",
        MediaClass::Avatar => "Avatars",
    }
}

fn plural(n: u64, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Processing progress
// ============================================================================

/// Format a single worker progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Started { class, id } => vec![format!("{class} {id}: processing")],
        ProcessEvent::DerivativeWritten {
            suffix,
            width,
            height,
            ..
        } => vec![format!("{}{suffix} {width}x{height}", indent(1))],
        ProcessEvent::Finished {
            class,
            id,
            status,
            error,
        } => {
            let mut lines = vec![format!("{class} {id}: {status}")];
            if let Some(message) = error {
                lines.push(format!("{}Error: {message}", indent(1)));
            }
            lines
        }
    }
}

/// Print a worker progress event to stdout.
pub fn print_process_event(event: &ProcessEvent) {
    for line in format_process_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Status listing
// ============================================================================

/// Format every record grouped by class, with a closing tally.
pub fn format_status_output(items: &[MediaItem], resolver: &PathResolver) -> Vec<String> {
    let mut lines = Vec::new();

    if items.is_empty() {
        lines.push("No media recorded".to_string());
        return lines;
    }

    for class in MediaClass::ALL {
        let of_class: Vec<&MediaItem> = items.iter().filter(|i| i.class == class).collect();
        if of_class.is_empty() {
            continue;
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(section_title(class).to_string());
        for (i, item) in of_class.iter().enumerate() {
            lines.push(format!("{} #{} {}", format_index(i + 1), item.id, item.status));
            lines.push(format!(
                "{}Original: {}",
                indent(1),
                resolver.relative_path(item.class, item.id, &item.token, ORIGINAL_SUFFIX)
            ));
        }
    }

    let count = |status: ProcessingStatus| items.iter().filter(|i| i.status == status).count();
    lines.push(String::new());
    lines.push(format!(
        "{} ready, {} pending, {} failed",
        count(ProcessingStatus::Ready),
        count(ProcessingStatus::Pending),
        count(ProcessingStatus::Failed)
    ));

    lines
}

/// Print the status listing to stdout.
pub fn print_status_output(items: &[MediaItem], resolver: &PathResolver) {
    for line in format_status_output(items, resolver) {
        println!("{}", line);
    }
}

// ============================================================================
// Pipeline summary
// ============================================================================

/// Format final worker counters, one line per class that saw work.
pub fn format_stats(stats: &PipelineStats) -> Vec<String> {
    let mut lines = Vec::new();
    for class in MediaClass::ALL {
        let s = stats.for_class(class);
        if s.processed + s.failed + s.status_errors == 0 {
            continue;
        }
        let mut line = format!(
            "{}: {} ready, {} failed",
            section_title(class),
            s.processed,
            s.failed
        );
        if s.status_errors > 0 {
            let noun = if s.status_errors == 1 { "status" } else { "statuses" };
            line.push_str(&format!(", {} {noun} not recorded", s.status_errors));
        }
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push("Nothing processed".to_string());
    }
    lines
}

/// Print final worker counters to stdout.
pub fn print_stats(stats: &PipelineStats) {
    for line in format_stats(stats) {
        println!("{}", line);
    }
}

// ============================================================================
// File lists
// ============================================================================

/// Format written files relative to the storage root, under a heading.
pub fn format_written_files(heading: &str, files: &[PathBuf], root: &Path) -> Vec<String> {
    let mut lines = vec![format!("{heading} ({})", plural(files.len() as u64, "file"))];
    for file in files {
        let shown = file.strip_prefix(root).unwrap_or(file);
        lines.push(format!("{}{}", indent(1), shown.display()));
    }
    lines
}

/// Print written files to stdout.
pub fn print_written_files(heading: &str, files: &[PathBuf], root: &Path) {
    for line in format_written_files(heading, files, root) {
        println!("{}", line);
    }
}
