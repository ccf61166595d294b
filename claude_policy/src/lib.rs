//! # Claude Policy
//!
//! Auditing and enforcement primitives for Claude Code permission settings.
//!
//! ## Overview
//!
//! The crate has two halves that share the shell and pattern machinery:
//!
//! - **Enforcement**: [`scan::extract_scan_targets`] recovers the paths a
//!   shell command would walk, and [`guard::check_paths`] decides whether a
//!   resolved path leaves the allowed part of the home directory.
//! - **Auditing**: [`permission`] parses `Tool(pattern)` entries and matches
//!   them, [`risk`] classifies observed tool patterns, [`crosscheck`] finds
//!   inconsistencies between the allow and deny lists, and [`report`] folds
//!   transcript samples from [`transcript`] into a usage report.
//!
//! The pure modules ([`shell`], [`scan`], [`guard`], [`permission`],
//! [`risk`], [`crosscheck`]) do no I/O. Everything that touches the
//! filesystem goes through [`io`], [`paths`], [`realpath`], [`transcript`]
//! and [`config`].
//!
//! ## Quick Start
//!
//! ```rust
//! use claude_policy::{Permissions, analyze_policy};
//!
//! let perms = Permissions::new()
//!     .allow("Bash(cat:*)")
//!     .allow("Bash(gh:*)")
//!     .deny("Read(~/.ssh/**)")
//!     .deny("Bash(gh auth:*)");
//!
//! let findings = analyze_policy(&perms);
//! assert_eq!(findings.deny_bypass.len(), 1);
//! assert_eq!(findings.allow_encompasses_deny.len(), 1);
//! ```
//!
//! ## Auditing a Machine
//!
//! ```rust,no_run
//! use claude_policy::{AuditRequest, PolicyAuditor, report::format_summary};
//!
//! let auditor = PolicyAuditor::new();
//! let report = auditor.audit(&AuditRequest::default())?;
//! print!("{}", format_summary(&report, None));
//! # Ok::<(), claude_policy::PolicyError>(())
//! ```

pub mod config;
pub mod crosscheck;
pub mod error;
pub mod guard;
pub mod io;
pub mod paths;
pub mod permission;
pub mod realpath;
pub mod report;
pub mod risk;
pub mod scan;
pub mod shell;
pub mod transcript;
pub mod types;

pub use config::{AnalyzeConfig, Config, GuardConfig};
pub use crosscheck::{Finding, PolicyFindings, analyze_policy};
pub use error::{PolicyError, Result};
pub use paths::PathResolver;
pub use permission::{PermissionEntry, PermissionRule, matches_pattern, matches_permission};
pub use report::Report;
pub use risk::{BypassRisk, Categorization, RiskCategory, categorize};
pub use transcript::ToolSample;
pub use types::{Permissions, Settings};

use std::path::PathBuf;

use tracing::{Level, info, instrument};

/// Inputs for one audit run. `None` fields fall back to configuration and
/// the default locations.
#[derive(Debug, Clone, Default)]
pub struct AuditRequest {
    pub days: Option<u32>,
    pub settings: Option<PathBuf>,
    pub projects_dir: Option<PathBuf>,
}

/// High-level interface for auditing the settings of one machine.
///
/// # Example
///
/// ```rust
/// use claude_policy::{PathResolver, PolicyAuditor};
///
/// let resolver = PathResolver::new()
///     .with_home("/custom/home")
///     .with_cwd("/custom/project");
///
/// let auditor = PolicyAuditor::with_resolver(resolver);
/// assert_eq!(
///     auditor.resolver().projects_dir(None).unwrap(),
///     std::path::PathBuf::from("/custom/home/.claude/projects"),
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct PolicyAuditor {
    resolver: PathResolver,
}

impl PolicyAuditor {
    #[instrument(level = Level::TRACE)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a custom path resolver; handy for tests and non-standard homes.
    #[instrument(level = Level::TRACE)]
    pub fn with_resolver(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Loads the layered configuration for this home directory.
    #[instrument(level = Level::TRACE, skip(self))]
    pub fn config(&self) -> Result<Config> {
        Config::load(&self.resolver)
    }

    /// Resolves the settings file and reads its permission lists.
    #[instrument(level = Level::TRACE, skip(self))]
    pub fn permissions(
        &self,
        explicit: Option<&std::path::Path>,
    ) -> Result<(PathBuf, Permissions)> {
        let path = self.resolver.settings_path(explicit)?;
        let perms = io::read_permissions(&path)?;
        Ok((path, perms))
    }

    /// Scans transcripts and builds a report against the current policy.
    #[instrument(level = Level::TRACE, skip(self))]
    pub fn audit(&self, request: &AuditRequest) -> Result<Report> {
        let config = self.config()?;
        let days = request.days.unwrap_or(config.analyze.days);
        let explicit_projects = request
            .projects_dir
            .as_deref()
            .or(config.analyze.projects_dir.as_deref());
        let projects_dir = self.resolver.projects_dir(explicit_projects)?;

        let (settings_path, perms) = self.permissions(request.settings.as_deref())?;
        let home = self.resolver.home_dir()?;

        let samples =
            transcript::scan_transcripts(&projects_dir, days, &home.to_string_lossy())?;
        let files_scanned = transcript::count_unique_files(&samples);
        info!(
            settings = %settings_path.display(),
            projects = %projects_dir.display(),
            samples = samples.len(),
            files = files_scanned,
            "audit inputs collected"
        );

        Ok(report::generate_report(&samples, &perms, days, files_scanned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PolicyAuditor) {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("home");
        fs::create_dir_all(home.join(".claude/projects/p")).unwrap();
        fs::create_dir_all(temp.path().join("work")).unwrap();
        let resolver = PathResolver::new()
            .with_home(&home)
            .with_cwd(temp.path().join("work"));
        (temp, PolicyAuditor::with_resolver(resolver))
    }

    #[test]
    fn test_audit_end_to_end() {
        let (temp, auditor) = setup();
        let claude = temp.path().join("home/.claude");
        fs::write(
            claude.join("settings.json"),
            json!({"permissions": {"allow": ["Bash(git status:*)"], "deny": ["Read(.env)"]}})
                .to_string(),
        )
        .unwrap();
        let line = json!({
            "cwd": "/w",
            "message": {"content": [
                {"type": "tool_use", "name": "Bash", "input": {"command": "git status"}},
                {"type": "tool_use", "name": "Bash", "input": {"command": "cargo test"}}
            ]}
        });
        fs::write(claude.join("projects/p/s.jsonl"), line.to_string()).unwrap();

        let report = auditor
            .audit(&AuditRequest {
                days: Some(3),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(report.metadata.days_analyzed, 3);
        assert_eq!(report.metadata.files_scanned, 1);
        assert_eq!(report.metadata.total_tool_calls, 2);
        assert_eq!(report.recommendations.add.len(), 1);
        assert_eq!(report.recommendations.add[0].pattern, "cargo test");
        assert_eq!(report.recommendations.unused[0].entry, "Read(.env)");
    }

    #[test]
    fn test_missing_settings_is_error() {
        let (_temp, auditor) = setup();
        let result = auditor.audit(&AuditRequest::default());
        assert!(matches!(result, Err(PolicyError::NotFound(_))));
    }
}
