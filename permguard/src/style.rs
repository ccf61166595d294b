//! TTY-aware styling for messages written to stderr.
//!
//! Built on the [`console`] crate which automatically detects whether
//! stderr is a terminal and respects the `NO_COLOR` environment
//! variable (<https://no-color.org/>). Stdout is never styled: it carries
//! hook JSON and reports that other programs read.

use console::Style;

/// A `Style` targeting **stderr** (auto-detects TTY + NO_COLOR).
fn err() -> Style {
    Style::new().for_stderr()
}

/// Bold red on stderr.
pub fn err_red_bold(text: &str) -> String {
    err().red().bold().apply_to(text).to_string()
}

/// Dim on stderr.
pub fn err_dim(text: &str) -> String {
    err().dim().apply_to(text).to_string()
}

/// Bold cyan on stderr (hints).
pub fn err_cyan_bold(text: &str) -> String {
    err().cyan().bold().apply_to(text).to_string()
}

/// Yellow on stderr (notices).
pub fn err_yellow(text: &str) -> String {
    err().yellow().apply_to(text).to_string()
}
