//! Permission entry parsing and pattern matching.
//!
//! Claude Code permission entries follow these formats:
//! - `ToolName` - a bare entry, applies to every use of the tool
//! - `ToolName(pattern)` - applies to uses matching the pattern
//! - `ToolName(prefix:*)` - prefix form, stored here as `prefix`
//! - `ToolName(dir/**)` - everything below `dir`
//!
//! ## Examples
//!
//! ```rust
//! use claude_policy::permission::{PermissionEntry, matches_pattern};
//!
//! let entry = PermissionEntry::parse("Bash(gh:*)").unwrap();
//! assert_eq!(entry.tool(), "Bash");
//! assert_eq!(entry.pattern(), "gh");
//! assert!(entry.matches("Bash", "gh auth"));
//!
//! assert!(matches_pattern("src/main.rs", "src"));
//! assert!(matches_pattern("src/a/b", "src/**"));
//! assert!(!matches_pattern("ghost", "gh"));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{Level, instrument};

use crate::error::{PolicyError, Result};

/// Which policy list an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionRule {
    /// Permission is granted without confirmation.
    Allow,
    /// Permission requires user confirmation.
    Ask,
    /// Permission is explicitly denied.
    Deny,
}

impl PermissionRule {
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionRule::Allow => "allow",
            PermissionRule::Ask => "ask",
            PermissionRule::Deny => "deny",
        }
    }
}

impl fmt::Display for PermissionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed permission entry.
///
/// `pattern` is `None` for a bare entry (`Bash`) and `Some("")` for an
/// explicitly empty one (`Bash()`); only the former grants the whole tool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PermissionEntry {
    tool: String,
    pattern: Option<String>,
}

impl PermissionEntry {
    /// Creates a bare entry for a tool.
    pub fn bare(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            pattern: None,
        }
    }

    /// Creates an entry with a pattern.
    pub fn with_pattern(tool: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            pattern: Some(pattern.into()),
        }
    }

    /// Parses `Tool(pattern)` or `Tool`.
    ///
    /// A trailing `:*` on the pattern is stripped, so `Bash(git:*)` and
    /// `Bash(git)` carry the same pattern. Fails on unbalanced parentheses,
    /// text after the closing parenthesis, and empty or whitespace-bearing
    /// tool names.
    #[instrument(level = Level::TRACE)]
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        let Some(open) = s.find('(') else {
            if s.contains(')') {
                return Err(PolicyError::InvalidPermission(format!(
                    "unbalanced parentheses: {s}"
                )));
            }
            validate_tool(s)?;
            return Ok(Self::bare(s));
        };

        let tool = &s[..open];
        validate_tool(tool)?;

        let Some(inner) = s[open + 1..].strip_suffix(')') else {
            return Err(PolicyError::InvalidPermission(format!(
                "malformed permission entry: {s}"
            )));
        };
        if !balanced(inner) {
            return Err(PolicyError::InvalidPermission(format!(
                "unbalanced parentheses: {s}"
            )));
        }

        let pattern = inner.strip_suffix(":*").unwrap_or(inner);
        Ok(Self::with_pattern(tool, pattern))
    }

    /// Returns the tool name.
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Returns the pattern, or `""` for a bare entry.
    pub fn pattern(&self) -> &str {
        self.pattern.as_deref().unwrap_or("")
    }

    /// Returns true for a bare (unparenthesized) entry.
    pub fn is_bare(&self) -> bool {
        self.pattern.is_none()
    }

    /// Returns true if this entry covers `pattern` for `tool`.
    ///
    /// Bare entries cover every pattern of their tool.
    pub fn matches(&self, tool: &str, pattern: &str) -> bool {
        self.tool == tool
            && match &self.pattern {
                None => true,
                Some(policy) => matches_pattern(pattern, policy),
            }
    }

    /// Renders the entry in its canonical textual form.
    pub fn to_entry_string(&self) -> String {
        match &self.pattern {
            None => self.tool.clone(),
            Some(p) => format!("{}({})", self.tool, p),
        }
    }
}

fn validate_tool(tool: &str) -> Result<()> {
    if tool.is_empty() {
        return Err(PolicyError::InvalidPermission("empty tool name".to_string()));
    }
    if tool.chars().any(|c| c.is_whitespace() || c == ')') {
        return Err(PolicyError::InvalidPermission(format!(
            "invalid tool name: {tool}"
        )));
    }
    Ok(())
}

/// Parentheses nest and close within the pattern.
fn balanced(s: &str) -> bool {
    let mut depth = 0usize;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}

impl FromStr for PermissionEntry {
    type Err = PolicyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        PermissionEntry::parse(s)
    }
}

impl fmt::Display for PermissionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_entry_string())
    }
}

/// Returns true if an observed pattern is covered by a policy pattern.
///
/// Rules, in order:
/// 1. exact equality;
/// 2. `observed` continues `policy` after a space or `/`
///    (`gh` covers `gh auth`, `src` covers `src/main.go`);
/// 3. `policy` ends in `/**`: `observed` is the prefix or lies below it.
pub fn matches_pattern(observed: &str, policy: &str) -> bool {
    if observed == policy {
        return true;
    }

    if let Some(rest) = observed.strip_prefix(policy)
        && (rest.starts_with(' ') || rest.starts_with('/'))
    {
        return true;
    }

    if policy.len() > 3
        && let Some(prefix) = policy.strip_suffix("/**")
    {
        return observed == prefix
            || observed
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'));
    }

    false
}

/// Returns true if any parseable entry in `entries` covers `tool`/`pattern`.
pub fn matches_permission<S: AsRef<str>>(tool: &str, pattern: &str, entries: &[S]) -> bool {
    entries.iter().any(|entry| {
        PermissionEntry::parse(entry.as_ref())
            .map(|e| e.matches(tool, pattern))
            .unwrap_or(false)
    })
}
