//! permguard library — Claude Code hook handlers and policy audit commands.
//!
//! The policy logic lives in [`claude_policy`]; this crate wires it to the
//! Claude Code hook protocol and the command line.
//!
//! # Modules
//!
//! - [`hooks`] — Input/output types for the Claude Code hook protocol.
//! - [`guard_hook`] — The `guard-home-dir` PreToolUse handler.
//! - [`cli`] — Command line definitions.
//! - [`cmd`] — Subcommand implementations.
//! - [`errors`] — User-facing error display.
//!
//! # Example
//!
//! ```no_run
//! use claude_policy::GuardConfig;
//! use permguard::guard_hook;
//!
//! let home = dirs::home_dir().unwrap();
//! guard_hook::run(
//!     std::io::stdin().lock(),
//!     std::io::stdout().lock(),
//!     &home,
//!     &GuardConfig::default(),
//! )
//! .unwrap();
//! ```

pub mod cli;
pub mod cmd;
pub mod errors;
pub mod guard_hook;
pub mod hooks;
pub mod style;
pub mod tracing_init;
pub mod version;
