//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag.
//! Diagnostics go to stderr so stdout stays pipeable; `--json` output
//! bypasses these helpers entirely.

use std::fmt::Display;

use crate::core::config::OptionInfo;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Quiet mode - results only
    Quiet,
    /// Normal mode - standard output
    #[default]
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags. Quiet wins over debug.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a result line. Always shown; results are the point of quiet mode.
pub fn result(message: impl Display) {
    println!("{}", message);
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Format options as aligned `path = value` lines.
///
/// Overridden options are marked with their default.
pub fn format_options(options: &[OptionInfo]) -> String {
    let width = options.iter().map(|o| o.path.as_str().len()).max().unwrap_or(0);
    options
        .iter()
        .map(|o| {
            let line = format!("{:width$} = {}", o.path.as_str(), o.value, width = width);
            if o.is_overridden() {
                format!("{line}  (default: {})", o.default)
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
