//! CLI output formatting for the build.
//!
//! # Output Format
//!
//! ## Progress
//!
//! ```text
//! ==> Loading manifest
//! ==> Resetting output directory
//! ==> Generating assets
//!     index.html
//!     shopping-list.js
//!     shopping-list.css
//! ==> Packaging offline assets (skipped)
//! ==> Done
//! ```
//!
//! ## Report
//!
//! ```text
//! Output target/
//!     index.html
//!     shopping-list.css
//!     shopping-list.js
//! built shopping-list 1.4.0 successfully
//! ```
//!
//! # Architecture
//!
//! Each `format_*` function returns `Vec<String>` for testability and has a
//! `print_*` wrapper that writes to stdout. Format functions are pure: no
//! I/O, no side effects.

use crate::config::BuildConfiguration;
use crate::pipeline::{BuildEvent, BuildReport, BuildState};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn stage_line(state: BuildState) -> String {
    format!("==> {}", state.label())
}

/// Format one progress event.
pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::StageStarted(state) => vec![stage_line(*state)],
        BuildEvent::StageSkipped(state) => vec![format!("{} (skipped)", stage_line(*state))],
        BuildEvent::ArtifactWritten { file } => vec![format!("{}{}", indent(1), file)],
        BuildEvent::Failed { stage, message } => vec![
            format!("{}: {}", stage_line(BuildState::Failed), stage.label()),
            format!("{}{}", indent(1), message),
        ],
        BuildEvent::Finished { .. } => vec![stage_line(BuildState::Done)],
    }
}

/// The one-line confirmation printed after a successful build.
pub fn completion_line(name: &str, version: &str) -> String {
    format!("built {name} {version} successfully")
}

/// Format the final report: every output file, then the confirmation.
pub fn format_report(report: &BuildReport, target: &Path) -> Vec<String> {
    let mut lines = vec![format!("Output {}/", target.display())];
    for file in &report.outputs {
        lines.push(format!("{}{}", indent(1), file));
    }
    lines.push(completion_line(&report.name, &report.version));
    lines
}

/// Banner for `sitepack check`: the project and the switches it is checked with.
pub fn format_check_banner(root: &Path, config: &BuildConfiguration) -> String {
    let mut modes = vec![if config.offline { "offline" } else { "online" }];
    if config.debug {
        modes.push("debug");
    }
    format!("==> Checking {} ({})", root.display(), modes.join(", "))
}

pub fn print_build_event(event: &BuildEvent) {
    for line in format_build_event(event) {
        println!("{}", line);
    }
}

pub fn print_report(report: &BuildReport, target: &Path) {
    for line in format_report(report, target) {
        println!("{}", line);
    }
}
