//! The `guard-home-dir` PreToolUse handler.
//!
//! Blocks tool calls that would read or walk parts of the home directory
//! outside the session's project and the configured allowed subdirectories.
//! Only scanning shell commands are inspected; any other `Bash` command
//! passes untouched.

use std::io::{Read, Write};
use std::path::Path;

use anyhow::Context;
use claude_policy::GuardConfig;
use claude_policy::guard::check_paths;
use claude_policy::realpath::{clean_path, resolve_realpath};
use claude_policy::scan::{exceeds_command_limit, extract_scan_targets};
use tracing::{Level, debug, info, instrument};

use crate::hooks::{HookOutput, ToolInput, ToolUseHookInput};

/// Resolves a path like `realpath -m`, falling back to lexical cleaning.
fn resolve(path: &Path) -> String {
    resolve_realpath(path)
        .unwrap_or_else(|_| clean_path(path))
        .to_string_lossy()
        .into_owned()
}

fn non_empty(path: String) -> Vec<String> {
    if path.is_empty() { Vec::new() } else { vec![path] }
}

/// Decides one tool call. `None` lets it through; `Some` is a deny.
///
/// `home` must already be realpath-resolved.
#[instrument(level = Level::TRACE, skip(input, config), fields(tool = %input.tool_name))]
pub fn check_tool_use(
    input: &ToolUseHookInput,
    home: &str,
    config: &GuardConfig,
) -> Option<HookOutput> {
    let paths = match input.typed_tool_input() {
        ToolInput::Read(f) | ToolInput::Edit(f) | ToolInput::Write(f) => non_empty(f.file_path),
        ToolInput::NotebookEdit(nb) => non_empty(nb.notebook_path),
        ToolInput::Glob(s) | ToolInput::Grep(s) => match s.path {
            Some(path) if !path.is_empty() => vec![path],
            _ => return None,
        },
        ToolInput::Bash(bash) => {
            if bash.command.is_empty() {
                return None;
            }
            if exceeds_command_limit(&bash.command, config.max_command_len) {
                info!(len = bash.command.len(), "command too long to audit");
                return Some(HookOutput::deny(format!(
                    "Home directory scan guard: command is longer than {} bytes \
                     and cannot be audited",
                    config.max_command_len
                )));
            }
            extract_scan_targets(&bash.command, home)?
        }
        ToolInput::Unknown(_) => return None,
    };

    if paths.is_empty() {
        return None;
    }

    let cwd = if input.cwd.is_empty() {
        String::new()
    } else {
        resolve(Path::new(&input.cwd))
    };

    let resolved: Vec<String> = paths
        .iter()
        .map(|p| resolve(&Path::new(&cwd).join(p)))
        .collect();
    debug!(?resolved, cwd = %cwd, "checking paths");

    let denied = check_paths(&resolved, home, &cwd, &config.allowed_subdirs)?;
    info!(path = %denied, "denying access outside allowed home locations");
    Some(HookOutput::deny(format!(
        "Home directory scan guard: {denied} is outside the project directory and the allowed paths"
    )))
}

/// Reads one hook payload from `reader` and writes a deny to `writer` if needed.
///
/// Nothing is written when the call is allowed.
#[instrument(level = Level::TRACE, skip(reader, writer, config))]
pub fn run(
    reader: impl Read,
    writer: impl Write,
    home: &Path,
    config: &GuardConfig,
) -> anyhow::Result<Option<HookOutput>> {
    let input = ToolUseHookInput::from_reader(reader).context("failed to parse hook input")?;
    let home = resolve(home);

    let output = check_tool_use(&input, &home, config);
    if let Some(ref out) = output {
        out.write_to(writer).context("failed to write hook output")?;
    }
    Ok(output)
}
