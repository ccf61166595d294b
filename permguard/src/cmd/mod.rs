//! Subcommand implementations.

pub mod analyze;
pub mod hooks;
pub mod realpath;
