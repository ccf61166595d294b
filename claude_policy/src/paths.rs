//! Path resolution for the settings file, transcripts and configuration.

use std::env;
use std::path::{Path, PathBuf};

use tracing::{Level, debug, instrument};

use crate::error::{PolicyError, Result};

/// The name of the Claude settings directory.
const CLAUDE_DIR: &str = ".claude";

/// The name of the settings file.
const SETTINGS_FILE: &str = "settings.json";

/// Repository-local settings directory checked before the user's own.
const REPO_SETTINGS_DIR: &str = "dotclaude";

/// Transcript directory below the Claude settings directory.
const PROJECTS_DIR: &str = "projects";

/// Configuration file below the Claude settings directory.
const CONFIG_FILE: &str = "permguard.json";

/// Resolver for the files permguard reads.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    /// Override for the home directory (useful for testing).
    home_override: Option<PathBuf>,

    /// Override for the working directory.
    cwd_override: Option<PathBuf>,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a custom home directory.
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home_override = Some(home.into());
        self
    }

    /// Uses a custom working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd_override = Some(cwd.into());
        self
    }

    /// Returns the home directory path.
    pub fn home_dir(&self) -> Result<PathBuf> {
        if let Some(ref home) = self.home_override {
            return Ok(home.clone());
        }
        dirs::home_dir().ok_or(PolicyError::NoHomeDirectory)
    }

    /// Returns the working directory path.
    pub fn cwd(&self) -> Result<PathBuf> {
        if let Some(ref cwd) = self.cwd_override {
            return Ok(cwd.clone());
        }
        env::current_dir().map_err(|e| PolicyError::NoWorkingDirectory(e.to_string()))
    }

    /// Returns `~/.claude`.
    pub fn claude_dir(&self) -> Result<PathBuf> {
        Ok(self.home_dir()?.join(CLAUDE_DIR))
    }

    /// Returns the settings file to analyze.
    ///
    /// An explicit path wins. Otherwise the enclosing git repository's
    /// `dotclaude/settings.json` is used when it exists, and
    /// `~/.claude/settings.json` when it does not.
    #[instrument(level = Level::TRACE, skip(self))]
    pub fn settings_path(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }

        if let Ok(cwd) = self.cwd()
            && let Some(root) = find_ancestor_with(&cwd, ".git")
        {
            let candidate = root.join(REPO_SETTINGS_DIR).join(SETTINGS_FILE);
            if candidate.is_file() {
                debug!(path = %candidate.display(), "using repository settings");
                return Ok(candidate);
            }
        }

        Ok(self.claude_dir()?.join(SETTINGS_FILE))
    }

    /// Returns the transcript directory, `~/.claude/projects` unless given.
    pub fn projects_dir(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        match explicit {
            Some(path) => Ok(path.to_path_buf()),
            None => Ok(self.claude_dir()?.join(PROJECTS_DIR)),
        }
    }

    /// Returns `~/.claude/permguard.json`.
    pub fn config_path(&self) -> Result<PathBuf> {
        Ok(self.claude_dir()?.join(CONFIG_FILE))
    }
}

/// Finds the nearest ancestor directory containing the given name.
pub fn find_ancestor_with(start: &Path, name: &str) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(name).exists() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}
