//! Consistency checks across the allow, ask and deny lists.
//!
//! None of these checks is fatal: each detector returns findings in the
//! order of the entries it was given, and unparsable entries are skipped by
//! every detector except [`detect_malformed_entries`].

use serde::{Deserialize, Serialize};
use tracing::{Level, debug, instrument, warn};

use crate::permission::{PermissionEntry, PermissionRule, matches_pattern};
use crate::risk::{BypassRisk, categorize};
use crate::types::Permissions;

/// A single policy inconsistency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// A tool name without a pattern, granting or blocking every use.
    BareEntry { list: PermissionRule, tool: String },
    /// A shell allow entry that can read or write what a file deny protects.
    DenyBypass {
        allow_entry: String,
        deny_entry: String,
        risk: BypassRisk,
        reason: String,
    },
    /// An allow entry whose pattern covers a narrower deny pattern.
    AllowEncompassesDeny {
        allow_entry: String,
        deny_entry: String,
    },
    /// An entry that does not parse.
    MalformedEntry {
        list: PermissionRule,
        entry: String,
        error: String,
    },
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Finding::BareEntry { list, tool } => {
                write!(f, "bare entry {tool} in {list} list applies to every use of the tool")
            }
            Finding::DenyBypass {
                allow_entry,
                deny_entry,
                risk,
                reason,
            } => write!(
                f,
                "{allow_entry} can bypass {deny_entry} ({risk} bypass: {reason})"
            ),
            Finding::AllowEncompassesDeny {
                allow_entry,
                deny_entry,
            } => write!(f, "{allow_entry} encompasses {deny_entry}"),
            Finding::MalformedEntry { list, entry, error } => {
                write!(f, "malformed entry {entry:?} in {list} list: {error}")
            }
        }
    }
}

/// Every finding for one policy, grouped by detector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyFindings {
    pub bare_entries: Vec<Finding>,
    pub deny_bypass: Vec<Finding>,
    pub allow_encompasses_deny: Vec<Finding>,
    pub malformed: Vec<Finding>,
}

impl PolicyFindings {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.bare_entries.len()
            + self.deny_bypass.len()
            + self.allow_encompasses_deny.len()
            + self.malformed.len()
    }

    /// Iterates every finding, grouped in detector order.
    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        self.bare_entries
            .iter()
            .chain(&self.deny_bypass)
            .chain(&self.allow_encompasses_deny)
            .chain(&self.malformed)
    }
}

/// Parses entries, silently dropping the ones that fail.
fn parsed<S: AsRef<str>>(entries: &[S]) -> impl Iterator<Item = (&str, PermissionEntry)> {
    entries.iter().filter_map(|raw| {
        let raw = raw.as_ref();
        PermissionEntry::parse(raw).ok().map(|entry| (raw, entry))
    })
}

/// Reports every bare entry, scanning allow, deny then ask.
#[instrument(level = Level::TRACE, skip(perms))]
pub fn detect_bare_entries(perms: &Permissions) -> Vec<Finding> {
    perms
        .lists()
        .flat_map(|(list, entries)| {
            parsed(entries)
                .filter(|(_, entry)| entry.is_bare())
                .map(move |(_, entry)| Finding::BareEntry {
                    list,
                    tool: entry.tool().to_string(),
                })
        })
        .collect()
}

/// Reports shell allow entries that can sidestep `Read`/`Write` deny entries.
#[instrument(level = Level::TRACE, skip(allow, deny))]
pub fn detect_deny_bypass<A, D>(allow: &[A], deny: &[D]) -> Vec<Finding>
where
    A: AsRef<str>,
    D: AsRef<str>,
{
    let deny: Vec<(&str, PermissionEntry)> = parsed(deny).collect();
    let mut findings = Vec::new();

    for (allow_raw, allow_entry) in parsed(allow) {
        if allow_entry.tool() != "Bash" {
            continue;
        }
        let cat = categorize("Bash", allow_entry.pattern());
        if !cat.deny_bypass_risk() {
            continue;
        }
        for (deny_raw, deny_entry) in &deny {
            if cat.bypass.bypasses(deny_entry.tool()) {
                debug!(allow = allow_raw, deny = *deny_raw, risk = %cat.bypass, "deny bypass");
                findings.push(Finding::DenyBypass {
                    allow_entry: allow_raw.to_string(),
                    deny_entry: deny_raw.to_string(),
                    risk: cat.bypass,
                    reason: cat.reason.to_string(),
                });
            }
        }
    }

    findings
}

/// Reports allow entries whose pattern covers a deny entry of the same tool.
///
/// The deny pattern is matched literally as the observed side, so
/// `Read(src/**)` encompasses `Read(src/secret/**)` but not the reverse.
/// Identical patterns and empty patterns never produce a finding.
#[instrument(level = Level::TRACE, skip(allow, deny))]
pub fn detect_allow_encompasses_deny<A, D>(allow: &[A], deny: &[D]) -> Vec<Finding>
where
    A: AsRef<str>,
    D: AsRef<str>,
{
    let deny: Vec<(&str, PermissionEntry)> = parsed(deny).collect();
    let mut findings = Vec::new();

    for (allow_raw, allow_entry) in parsed(allow) {
        let allow_pattern = allow_entry.pattern();
        if allow_pattern.is_empty() {
            continue;
        }
        for (deny_raw, deny_entry) in &deny {
            let deny_pattern = deny_entry.pattern();
            if deny_entry.tool() == allow_entry.tool()
                && !deny_pattern.is_empty()
                && deny_pattern != allow_pattern
                && matches_pattern(deny_pattern, allow_pattern)
            {
                findings.push(Finding::AllowEncompassesDeny {
                    allow_entry: allow_raw.to_string(),
                    deny_entry: deny_raw.to_string(),
                });
            }
        }
    }

    findings
}

/// Reports every entry that fails to parse.
#[instrument(level = Level::TRACE, skip(perms))]
pub fn detect_malformed_entries(perms: &Permissions) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (list, entries) in perms.lists() {
        for raw in entries {
            if let Err(e) = PermissionEntry::parse(raw) {
                warn!(
                    list = %list,
                    entry = %raw,
                    error = %e,
                    "skipping malformed permission entry"
                );
                findings.push(Finding::MalformedEntry {
                    list,
                    entry: raw.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    findings
}

/// Runs every detector over a policy.
#[instrument(level = Level::TRACE, skip(perms))]
pub fn analyze_policy(perms: &Permissions) -> PolicyFindings {
    PolicyFindings {
        bare_entries: detect_bare_entries(perms),
        deny_bypass: detect_deny_bypass(&perms.allow, &perms.deny),
        allow_encompasses_deny: detect_allow_encompasses_deny(&perms.allow, &perms.deny),
        malformed: detect_malformed_entries(perms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_entry_in_each_list() {
        for list in [PermissionRule::Allow, PermissionRule::Ask, PermissionRule::Deny] {
            let perms = match list {
                PermissionRule::Allow => Permissions::new().allow("Bash"),
                PermissionRule::Ask => Permissions::new().ask("Bash"),
                PermissionRule::Deny => Permissions::new().deny("Bash"),
            };
            assert_eq!(
                detect_bare_entries(&perms),
                vec![Finding::BareEntry {
                    list,
                    tool: "Bash".to_string()
                }]
            );
        }
    }

    #[test]
    fn test_bare_entry_ignores_patterns() {
        let perms = Permissions::new().allow("Bash(x)").allow("Bash()").deny("Read(.env)");
        assert!(detect_bare_entries(&perms).is_empty());
    }

    #[test]
    fn test_bare_entries_ordered_allow_deny_ask() {
        let perms = Permissions::new().ask("Edit").deny("Write").allow("Read");
        let tools: Vec<String> = detect_bare_entries(&perms)
            .into_iter()
            .map(|f| match f {
                Finding::BareEntry { tool, .. } => tool,
                other => panic!("unexpected finding {other:?}"),
            })
            .collect();
        assert_eq!(tools, vec!["Read", "Write", "Edit"]);
    }

    #[test]
    fn test_deny_bypass_read() {
        let findings = detect_deny_bypass(&["Bash(cat:*)"], &["Read(~/.ssh/**)"]);
        assert_eq!(findings.len(), 1);
        let Finding::DenyBypass {
            allow_entry,
            deny_entry,
            risk,
            reason,
        } = &findings[0]
        else {
            panic!("expected deny bypass, got {:?}", findings[0]);
        };
        assert_eq!(allow_entry, "Bash(cat:*)");
        assert_eq!(deny_entry, "Read(~/.ssh/**)");
        assert_eq!(*risk, BypassRisk::Read);
        assert_eq!(reason, categorize("Bash", "cat").reason);
    }

    #[test]
    fn test_deny_bypass_write() {
        let findings = detect_deny_bypass(&["Bash(echo:*)"], &["Write(.env)"]);
        assert_eq!(findings.len(), 1);
        assert!(matches!(
            &findings[0],
            Finding::DenyBypass {
                risk: BypassRisk::Write,
                ..
            }
        ));
    }

    #[test]
    fn test_deny_bypass_respects_direction() {
        assert!(detect_deny_bypass(&["Bash(cat:*)"], &["Write(.env)"]).is_empty());
        assert!(detect_deny_bypass(&["Bash(echo:*)"], &["Read(.env)"]).is_empty());
        assert!(detect_deny_bypass(&["Bash(cat:*)"], &["Edit(.env)"]).is_empty());
    }

    #[test]
    fn test_deny_bypass_both() {
        let findings = detect_deny_bypass(&["Bash(python3:*)"], &["Read(.env)", "Write(.env)"]);
        assert_eq!(findings.len(), 2);
    }

    #[test]
    fn test_deny_bypass_bare_bash() {
        let findings = detect_deny_bypass(&["Bash"], &["Read(~/.aws/**)"]);
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_no_deny_bypass_for_safe_command() {
        assert!(detect_deny_bypass(&["Bash(git status:*)"], &["Read(~/.ssh/**)"]).is_empty());
    }

    #[test]
    fn test_deny_bypass_ignores_non_bash_allow() {
        assert!(detect_deny_bypass(&["Read(cat)"], &["Read(~/.ssh/**)"]).is_empty());
    }

    #[test]
    fn test_allow_encompasses_deny_bash() {
        let findings = detect_allow_encompasses_deny(&["Bash(gh:*)"], &["Bash(gh auth:*)"]);
        assert_eq!(
            findings,
            vec![Finding::AllowEncompassesDeny {
                allow_entry: "Bash(gh:*)".to_string(),
                deny_entry: "Bash(gh auth:*)".to_string(),
            }]
        );
    }

    #[test]
    fn test_allow_encompasses_deny_identical_is_silent() {
        assert!(detect_allow_encompasses_deny(&["Bash(gh:*)"], &["Bash(gh:*)"]).is_empty());
        // `:*` is stripped before comparison
        assert!(detect_allow_encompasses_deny(&["Bash(gh:*)"], &["Bash(gh)"]).is_empty());
    }

    #[test]
    fn test_allow_encompasses_deny_different_tools() {
        assert!(detect_allow_encompasses_deny(&["Read(src)"], &["Write(src/a)"]).is_empty());
    }

    #[test]
    fn test_allow_encompasses_deny_empty_patterns() {
        assert!(detect_allow_encompasses_deny(&["Read"], &["Read(src/a)"]).is_empty());
        assert!(detect_allow_encompasses_deny(&["Read(src)"], &["Read"]).is_empty());
        assert!(detect_allow_encompasses_deny(&["Read()"], &["Read()"]).is_empty());
    }

    #[test]
    fn test_allow_encompasses_deny_glob_table() {
        let cases = [
            ("Read(~/src/**)", "Read(~/src/secret/**)", true),
            ("Read(src/**)", "Read(src/secret/**)", true),
            ("Read(src/secret/**)", "Read(src/**)", false),
            ("Read(src/**)", "Read(src/**)", false),
            ("Read(src)", "Read(src/**)", true),
            ("Read(src/**)", "Read(src)", true),
            ("Read(src/**)", "Read(src2/x)", false),
            ("Read(/**)", "Read(/etc/passwd)", false),
        ];
        for (allow, deny, want) in cases {
            let got = !detect_allow_encompasses_deny(&[allow], &[deny]).is_empty();
            assert_eq!(got, want, "allow {allow} vs deny {deny}");
        }
    }

    #[test]
    fn test_detectors_skip_malformed() {
        assert!(detect_deny_bypass(&["Bash(cat"], &["Read(.env)"]).is_empty());
        assert!(detect_allow_encompasses_deny(&["Bash(gh:*)"], &["Bash(gh auth"]).is_empty());
    }

    #[test]
    fn test_malformed_entries() {
        let perms = Permissions::new().allow("Bash(cat").deny("Read(.env)").ask("x)");
        let findings = detect_malformed_entries(&perms);
        assert_eq!(findings.len(), 2);
        assert!(matches!(
            &findings[0],
            Finding::MalformedEntry {
                list: PermissionRule::Allow,
                entry,
                ..
            } if entry == "Bash(cat"
        ));
        assert!(matches!(
            &findings[1],
            Finding::MalformedEntry { list: PermissionRule::Ask, .. }
        ));
    }

    #[test]
    fn test_analyze_policy() {
        let perms = Permissions::new()
            .allow("Bash(cat:*)")
            .allow("Bash(gh:*)")
            .allow("WebSearch")
            .deny("Read(~/.ssh/**)")
            .deny("Bash(gh auth:*)")
            .ask("Edit(");
        let findings = analyze_policy(&perms);
        assert_eq!(findings.bare_entries.len(), 1);
        assert_eq!(findings.deny_bypass.len(), 1);
        assert_eq!(findings.allow_encompasses_deny.len(), 1);
        assert_eq!(findings.malformed.len(), 1);
        assert_eq!(findings.len(), 4);
        assert_eq!(findings.iter().count(), 4);
    }

    #[test]
    fn test_analyze_clean_policy() {
        let perms = Permissions::new()
            .allow("Bash(git status:*)")
            .allow("Read(src/**)")
            .deny("Read(.env)");
        assert!(analyze_policy(&perms).is_empty());
    }

    #[test]
    fn test_finding_serializes_tagged() {
        let finding = Finding::BareEntry {
            list: PermissionRule::Allow,
            tool: "Bash".to_string(),
        };
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "bare_entry", "list": "allow", "tool": "Bash"})
        );
    }

    #[test]
    fn test_finding_display() {
        let finding = Finding::AllowEncompassesDeny {
            allow_entry: "Bash(gh:*)".to_string(),
            deny_entry: "Bash(gh auth:*)".to_string(),
        };
        assert_eq!(finding.to_string(), "Bash(gh:*) encompasses Bash(gh auth:*)");
    }
}
