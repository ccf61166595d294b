//! Path canonicalization that tolerates missing components.
//!
//! [`resolve_realpath`] behaves like `realpath -m`: existing components
//! have their symlinks resolved in order and the missing rest is applied
//! lexically, so `/var/tmp/new/file` on macOS becomes
//! `/private/var/tmp/new/file` even though `new` does not exist yet.

use std::env;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{Level, instrument, trace};

/// Lexically normalizes a path.
///
/// `.` components are dropped, `..` pops the previous component (never above
/// the root), and repeated separators collapse. An empty relative result is
/// `.`. The filesystem is not consulted.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(name) => {
                out.push(name);
                depth += 1;
            }
        }
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Resolves `path` to an absolute, symlink-free path without requiring it to exist.
///
/// Relative paths are made absolute against the process working directory.
/// Components are resolved left to right: each existing prefix is
/// canonicalized before the next component is applied, so a `..` that
/// follows a symlink climbs out of the symlink's target. Once a component
/// is missing the rest is applied lexically.
#[instrument(level = Level::TRACE)]
pub fn resolve_realpath(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };

    if let Ok(resolved) = fs::canonicalize(&absolute) {
        return Ok(resolved);
    }

    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(p) => resolved.push(p.as_os_str()),
            Component::RootDir => resolved.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                let next = resolved.join(name);
                resolved = fs::canonicalize(&next).unwrap_or(next);
            }
        }
    }

    trace!(path = %resolved.display(), "resolved with missing components");
    Ok(resolved)
}
