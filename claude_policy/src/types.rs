//! Settings-file types.
//!
//! Only the `permissions` object of a Claude Code `settings.json` matters
//! here; every other key is carried through untouched in `extra`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::permission::PermissionRule;

/// The subset of a Claude Code settings file that policy analysis reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Tool permission lists.
    #[serde(default)]
    pub permissions: Permissions,

    /// Any additional fields not explicitly defined.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// The allow, ask and deny lists of a settings file, in file order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Permissions {
    /// Entries granted without confirmation.
    /// Format: "ToolName(pattern:*)" or just "ToolName"
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow: Vec<String>,

    /// Entries that require user confirmation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ask: Vec<String>,

    /// Entries that are explicitly denied.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deny: Vec<String>,
}

impl Permissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an allow entry.
    pub fn allow(mut self, entry: impl Into<String>) -> Self {
        self.allow.push(entry.into());
        self
    }

    /// Adds an ask entry.
    pub fn ask(mut self, entry: impl Into<String>) -> Self {
        self.ask.push(entry.into());
        self
    }

    /// Adds a deny entry.
    pub fn deny(mut self, entry: impl Into<String>) -> Self {
        self.deny.push(entry.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.ask.is_empty() && self.deny.is_empty()
    }

    /// Returns the entries of one list.
    pub fn list(&self, rule: PermissionRule) -> &[String] {
        match rule {
            PermissionRule::Allow => &self.allow,
            PermissionRule::Ask => &self.ask,
            PermissionRule::Deny => &self.deny,
        }
    }

    /// Iterates the three lists in allow, deny, ask order.
    pub fn lists(&self) -> impl Iterator<Item = (PermissionRule, &[String])> {
        [PermissionRule::Allow, PermissionRule::Deny, PermissionRule::Ask]
            .into_iter()
            .map(|rule| (rule, self.list(rule)))
    }
}
