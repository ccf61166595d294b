use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use claude_policy::realpath::resolve_realpath;

/// Prints `path` resolved like `realpath -m`.
///
/// Relative paths resolve against the working directory.
pub fn run(path: &Path, mut out: impl Write) -> Result<()> {
    let resolved = resolve_realpath(path)
        .with_context(|| format!("failed to resolve {}", path.display()))?;
    writeln!(out, "{}", resolved.display())?;
    Ok(())
}
