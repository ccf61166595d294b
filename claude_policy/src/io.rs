//! Reading Claude Code settings files.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{Level, debug, instrument};

use crate::error::{PolicyError, Result};
use crate::types::{Permissions, Settings};

/// Reads and parses a settings file.
#[instrument(level = Level::TRACE)]
pub fn read_settings(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PolicyError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => PolicyError::PermissionDenied {
            path: path.to_path_buf(),
            source: e,
        },
        _ => PolicyError::ReadError {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    serde_json::from_str(&content).map_err(|e| PolicyError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Reads the `permissions` object of a settings file.
///
/// A file without a `permissions` object yields empty lists.
#[instrument(level = Level::TRACE)]
pub fn read_permissions(path: &Path) -> Result<Permissions> {
    let settings = read_settings(path)?;
    debug!(
        path = %path.display(),
        allow = settings.permissions.allow.len(),
        ask = settings.permissions.ask.len(),
        deny = settings.permissions.deny.len(),
        "loaded permissions"
    );
    Ok(settings.permissions)
}
