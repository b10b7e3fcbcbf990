//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every item leads with its positional index and title. The source file and
//! the card it got are indented context lines underneath, so the output reads
//! as an inventory of the site's content rather than a list of files.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! posts (2 items)
//!     001 Hello World
//!         Source: _posts/2024-01-05-hello-world.md
//!         Card: /assets/images/og/posts/hello-world.png (rendered)
//!     002 Draft Thoughts
//!         Source: _posts/2024-02-01-draft-thoughts.md
//!         Skipped: draft
//! recipes: unknown collection
//!
//! Rendered 1, existing 0, skipped 1, failed 0
//! ```
//!
//! ## Check
//!
//! ```text
//! Config
//!     config.toml
//!     Output: assets/images/og
//!     Canvas: 1200x600 #ffffff
//! Collections
//!     posts: 12 items
//!     recipes: not found
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::config::CardConfig;
use crate::render::{ItemOutcome, RenderEvent, RenderReport, UNKNOWN_COLLECTION};
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Context line describing what happened to an item's card.
fn outcome_line(outcome: &ItemOutcome, output: Option<&str>) -> String {
    let card = |status: &str| match output {
        Some(path) => format!("Card: {path} ({status})"),
        None => format!("Card: {status}"),
    };
    match outcome {
        ItemOutcome::Rendered => card("rendered"),
        ItemOutcome::Existing => card("exists"),
        ItemOutcome::SkippedDraft => "Skipped: draft".to_string(),
        ItemOutcome::Disabled => "Skipped: disabled".to_string(),
        ItemOutcome::Failed(reason) => format!("Failed: {reason}"),
    }
}

// ============================================================================
// Build
// ============================================================================

/// Format a single render progress event as display lines.
pub fn format_render_event(event: &RenderEvent) -> Vec<String> {
    match event {
        RenderEvent::CollectionStarted { name, item_count } => {
            vec![format!("{} ({})", name, plural(*item_count, "item"))]
        }
        RenderEvent::CollectionSkipped { name, reason } => {
            vec![format!("{name}: {reason}")]
        }
        RenderEvent::ItemFinished {
            index,
            title,
            source_path,
            output,
            outcome,
        } => vec![
            format!("{}{} {}", indent(1), format_index(*index), title),
            format!("{}Source: {}", indent(2), source_path),
            format!("{}{}", indent(2), outcome_line(outcome, output.as_deref())),
        ],
    }
}

/// Totals line printed after a build.
pub fn format_report(report: &RenderReport) -> Vec<String> {
    let rendered = report.count(|o| *o == ItemOutcome::Rendered);
    let existing = report.count(|o| *o == ItemOutcome::Existing);
    let skipped = report.count(|o| matches!(o, ItemOutcome::SkippedDraft | ItemOutcome::Disabled));
    let failed = report.count(|o| matches!(o, ItemOutcome::Failed(_)));

    let mut lines = vec![format!(
        "Rendered {rendered}, existing {existing}, skipped {skipped}, failed {failed}"
    )];
    for collection in &report.collections {
        if let Some(error) = &collection.error
            && error != UNKNOWN_COLLECTION
        {
            lines.push(format!("Collection {} failed: {}", collection.name, error));
        }
    }
    lines
}

pub fn print_report(report: &RenderReport) {
    println!();
    for line in format_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Summarize the effective config and what each collection holds.
///
/// `counts` maps collection names to their item count, `None` for
/// collections the site doesn't have.
pub fn format_check(
    config: &CardConfig,
    config_path: &Path,
    counts: &BTreeMap<String, Option<usize>>,
) -> Vec<String> {
    let mut lines = vec!["Config".to_string()];
    if config_path.exists() {
        lines.push(format!("{}{}", indent(1), config_path.display()));
    } else {
        lines.push(format!("{}(defaults, no {})", indent(1), config_path.display()));
    }
    if !config.enabled {
        lines.push(format!("{}Disabled", indent(1)));
    }
    lines.push(format!("{}Output: {}", indent(1), config.output_dir));
    lines.push(format!(
        "{}Canvas: {}x{} {}",
        indent(1),
        config.canvas.width,
        config.canvas.height,
        config.canvas.background_color
    ));
    if let Some(domain) = &config.domain {
        lines.push(format!("{}Domain: {}", indent(1), domain));
    }
    if let Some(path) = &config.image.path {
        lines.push(format!("{}Image: {}", indent(1), path));
    }

    lines.push("Collections".to_string());
    for name in &config.collections {
        let detail = match counts.get(name) {
            Some(Some(n)) => plural(*n, "item"),
            _ => "not found".to_string(),
        };
        lines.push(format!("{}{}: {}", indent(1), name, detail));
    }
    lines
}

pub fn print_check(config: &CardConfig, config_path: &Path, counts: &BTreeMap<String, Option<usize>>) {
    for line in format_check(config, config_path, counts) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
