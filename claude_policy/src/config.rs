//! Runtime configuration.
//!
//! Values are layered with figment, lowest precedence first:
//! 1. built-in defaults
//! 2. `~/.claude/permguard.json`
//! 3. `PERMGUARD_*` environment variables, nested with `__`
//!    (`PERMGUARD_ANALYZE__DAYS=7`)
//!
//! Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized};
use serde::{Deserialize, Serialize};
use tracing::{Level, instrument};

use crate::error::Result;
use crate::guard::DEFAULT_ALLOWED_SUBDIRS;
use crate::paths::PathResolver;
use crate::scan::MAX_COMMAND_LEN;

/// Default analysis window in days.
pub const DEFAULT_DAYS: u32 = 30;

const ENV_PREFIX: &str = "PERMGUARD_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub guard: GuardConfig,
    pub analyze: AnalyzeConfig,
}

/// Settings for the home-directory guard hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Subdirectories of home that scanning commands may always touch.
    pub allowed_subdirs: Vec<String>,
    /// Longest command the guard will parse; longer ones are denied.
    pub max_command_len: usize,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            allowed_subdirs: DEFAULT_ALLOWED_SUBDIRS.iter().map(|s| s.to_string()).collect(),
            max_command_len: MAX_COMMAND_LEN,
        }
    }
}

/// Settings for transcript analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzeConfig {
    pub days: u32,
    pub projects_dir: Option<PathBuf>,
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            days: DEFAULT_DAYS,
            projects_dir: None,
        }
    }
}

impl Config {
    /// Builds the layered figment, reading `file` when it exists.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file
            && path.exists()
        {
            figment = figment.merge(Json::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads configuration from an explicit file plus the environment.
    #[instrument(level = Level::TRACE)]
    pub fn load_from(file: Option<&Path>) -> Result<Self> {
        Ok(Self::figment(file).extract()?)
    }

    /// Loads configuration from `~/.claude/permguard.json` plus the environment.
    #[instrument(level = Level::TRACE)]
    pub fn load(resolver: &PathResolver) -> Result<Self> {
        let path = resolver.config_path().ok();
        Self::load_from(path.as_deref())
    }
}
