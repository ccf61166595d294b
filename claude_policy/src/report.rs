//! Permission usage reports.
//!
//! [`generate_report`] folds transcript samples and the current policy into a
//! [`Report`]: how often each pattern was used, how risky it is, whether the
//! policy already covers it, which entries went unused, and every
//! cross-check finding. [`format_summary`] renders the compact text view.

use std::collections::HashMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tracing::{Level, instrument};

use crate::crosscheck::{Finding, analyze_policy};
use crate::permission::{PermissionEntry, PermissionRule, matches_pattern, matches_permission};
use crate::risk::{BypassRisk, RiskCategory, categorize};
use crate::transcript::ToolSample;
use crate::types::Permissions;

/// Rows shown per section of the text summary.
const SUMMARY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub current_allow: Vec<String>,
    pub current_deny: Vec<String>,
    pub current_ask: Vec<String>,
    pub recommendations: Recommendations,
    pub all_patterns: Vec<PatternSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Local date of the analysis, `YYYY-MM-DD`.
    pub analysis_date: String,
    pub days_analyzed: u32,
    pub files_scanned: usize,
    pub total_tool_calls: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub add: Vec<PatternRecommendation>,
    pub review: Vec<PatternRecommendation>,
    pub unused: Vec<UnusedEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bare_entry_warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deny_bypass_warnings: Vec<DenyBypassWarning>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_encompasses_deny: Vec<AllowEncompassesDenyWarning>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub malformed_entries: Vec<MalformedEntryWarning>,
}

impl Recommendations {
    pub fn has_warnings(&self) -> bool {
        !self.bare_entry_warnings.is_empty()
            || !self.deny_bypass_warnings.is_empty()
            || !self.allow_encompasses_deny.is_empty()
            || !self.malformed_entries.is_empty()
    }
}

/// A used pattern that no list covers yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRecommendation {
    pub tool_name: String,
    pub pattern: String,
    pub count: usize,
    pub category: RiskCategory,
    pub reason: String,
}

/// A list entry that matched nothing in the analysis window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnusedEntry {
    pub entry: String,
    pub list: PermissionRule,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenyBypassWarning {
    pub allow_entry: String,
    pub bypassed_deny: String,
    pub bypass: BypassRisk,
    pub risk: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowEncompassesDenyWarning {
    pub allow_entry: String,
    pub deny_entry: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MalformedEntryWarning {
    pub list: PermissionRule,
    pub entry: String,
    pub error: String,
}

/// Usage and coverage of one observed pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSummary {
    pub tool_name: String,
    pub pattern: String,
    pub count: usize,
    pub category: RiskCategory,
    pub in_allowlist: bool,
    pub in_denylist: bool,
    pub in_asklist: bool,
}

/// Counts samples per `(tool, pattern)`, keeping first-seen order.
fn aggregate(samples: &[ToolSample]) -> Vec<(&str, &str, usize)> {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut counts: Vec<(&str, &str, usize)> = Vec::new();

    for sample in samples {
        let key = (sample.tool.as_str(), sample.pattern.as_str());
        match index.get(&key) {
            Some(&i) => counts[i].2 += 1,
            None => {
                index.insert(key, counts.len());
                counts.push((key.0, key.1, 1));
            }
        }
    }
    counts
}

fn unused_entries(
    perms: &Permissions,
    observed: &[(&str, &str, usize)],
    days: u32,
) -> Vec<UnusedEntry> {
    let mut unused = Vec::new();
    for (list, entries) in perms.lists() {
        for raw in entries {
            let Ok(entry) = PermissionEntry::parse(raw) else {
                continue;
            };
            if entry.is_bare() {
                continue;
            }
            let used = observed.iter().any(|(tool, pattern, _)| {
                *tool == entry.tool() && matches_pattern(pattern, entry.pattern())
            });
            if !used {
                unused.push(UnusedEntry {
                    entry: raw.clone(),
                    list,
                    note: format!("unused in the last {days} days"),
                });
            }
        }
    }
    unused
}

/// Builds a report from transcript samples and the current policy.
#[instrument(level = Level::TRACE, skip(samples, perms))]
pub fn generate_report(
    samples: &[ToolSample],
    perms: &Permissions,
    days: u32,
    files_scanned: usize,
) -> Report {
    let observed = aggregate(samples);

    let mut all_patterns = Vec::with_capacity(observed.len());
    let mut add = Vec::new();
    let mut review = Vec::new();

    for &(tool, pattern, count) in &observed {
        let cat = categorize(tool, pattern);
        let in_allowlist = matches_permission(tool, pattern, &perms.allow);
        let in_denylist = matches_permission(tool, pattern, &perms.deny);
        let in_asklist = matches_permission(tool, pattern, &perms.ask);

        all_patterns.push(PatternSummary {
            tool_name: tool.to_string(),
            pattern: pattern.to_string(),
            count,
            category: cat.category,
            in_allowlist,
            in_denylist,
            in_asklist,
        });

        if in_allowlist || in_denylist || in_asklist {
            continue;
        }

        let mut rec = PatternRecommendation {
            tool_name: tool.to_string(),
            pattern: pattern.to_string(),
            count,
            category: cat.category,
            reason: cat.reason.to_string(),
        };
        match cat.category {
            RiskCategory::Safe => add.push(rec),
            RiskCategory::Review | RiskCategory::Ask => review.push(rec),
            RiskCategory::Deny => {
                rec.reason = format!("{} (recommend adding to deny list)", cat.reason);
                review.push(rec);
            }
        }
    }

    all_patterns.sort_by(|a, b| b.count.cmp(&a.count));
    add.sort_by(|a, b| b.count.cmp(&a.count));
    review.sort_by(|a, b| b.count.cmp(&a.count));

    let findings = analyze_policy(perms);
    let mut recommendations = Recommendations {
        add,
        review,
        unused: unused_entries(perms, &observed, days),
        ..Default::default()
    };
    for finding in findings.iter().cloned() {
        match finding {
            Finding::BareEntry { tool, .. } => recommendations.bare_entry_warnings.push(tool),
            Finding::DenyBypass {
                allow_entry,
                deny_entry,
                risk,
                reason,
            } => recommendations.deny_bypass_warnings.push(DenyBypassWarning {
                allow_entry,
                bypassed_deny: deny_entry,
                bypass: risk,
                risk: reason,
            }),
            Finding::AllowEncompassesDeny {
                allow_entry,
                deny_entry,
            } => recommendations
                .allow_encompasses_deny
                .push(AllowEncompassesDenyWarning {
                    note: format!(
                        "{allow_entry} in allow covers {deny_entry} in deny \
                         (deny wins, but check the intent)"
                    ),
                    allow_entry,
                    deny_entry,
                }),
            Finding::MalformedEntry { list, entry, error } => recommendations
                .malformed_entries
                .push(MalformedEntryWarning { list, entry, error }),
        }
    }

    Report {
        metadata: ReportMetadata {
            analysis_date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            days_analyzed: days,
            files_scanned,
            total_tool_calls: samples.len(),
        },
        current_allow: perms.allow.clone(),
        current_deny: perms.deny.clone(),
        current_ask: perms.ask.clone(),
        recommendations,
        all_patterns,
    }
}

/// Renders a pattern the way it would be written in a settings file.
pub fn format_permission(tool: &str, pattern: &str) -> String {
    if pattern.is_empty() {
        tool.to_string()
    } else if tool == "Bash" {
        format!("Bash({pattern}:*)")
    } else {
        format!("{tool}({pattern})")
    }
}

fn write_more(out: &mut String, total: usize, shown: usize) {
    if total > shown {
        let _ = writeln!(
            out,
            "  ... and {} more (use --format json for full list)",
            total - shown
        );
    }
}

fn write_recommendations(out: &mut String, title: &str, recs: &[PatternRecommendation]) {
    if recs.is_empty() {
        return;
    }
    let total = recs.len();
    let shown = total.min(SUMMARY_LIMIT);
    let _ = writeln!(out, "\n[{title}] {total} patterns (showing {shown}/{total}):");
    for rec in &recs[..shown] {
        let _ = writeln!(
            out,
            "  {:<30} {:>4} uses  {}",
            format_permission(&rec.tool_name, &rec.pattern),
            rec.count,
            rec.reason
        );
    }
    write_more(out, total, shown);
}

/// Renders the compact text summary.
///
/// `json_output_path` is mentioned at the end when the full JSON report was
/// also written to a file.
pub fn format_summary(report: &Report, json_output_path: Option<&str>) -> String {
    let recs = &report.recommendations;
    let mut out = String::new();

    let _ = writeln!(out, "=== Permission Optimizer Report ===");
    let _ = writeln!(
        out,
        "Period: {} days | Files: {} | Tool Calls: {}",
        report.metadata.days_analyzed,
        report.metadata.files_scanned,
        report.metadata.total_tool_calls
    );

    write_recommendations(&mut out, "ADD to allow", &recs.add);
    write_recommendations(&mut out, "REVIEW", &recs.review);

    if !recs.unused.is_empty() {
        let total = recs.unused.len();
        let shown = total.min(SUMMARY_LIMIT);
        let _ = writeln!(out, "\n[UNUSED] {total} entries (showing {shown}/{total}):");
        for unused in &recs.unused[..shown] {
            let _ = writeln!(out, "  {}: {}  {}", unused.list, unused.entry, unused.note);
        }
        write_more(&mut out, total, shown);
    }

    if recs.has_warnings() {
        let _ = writeln!(out, "\n[WARNINGS]");
        if !recs.bare_entry_warnings.is_empty() {
            let _ = writeln!(out, "  Bare entries: {}", recs.bare_entry_warnings.join(", "));
        }
        for w in &recs.deny_bypass_warnings {
            let _ = writeln!(out, "  Deny bypass: {} -> {}", w.allow_entry, w.bypassed_deny);
        }
        for w in &recs.allow_encompasses_deny {
            let _ = writeln!(
                out,
                "  Allow encompasses deny: {} covers {}",
                w.allow_entry, w.deny_entry
            );
        }
        for w in &recs.malformed_entries {
            let _ = writeln!(out, "  Malformed entry: {}: {} ({})", w.list, w.entry, w.error);
        }
    }

    let _ = write!(
        out,
        "\nSummary: {} allow / {} deny / {} ask",
        report.current_allow.len(),
        report.current_deny.len(),
        report.current_ask.len()
    );
    if !recs.add.is_empty() || !recs.unused.is_empty() || !recs.review.is_empty() {
        let _ = write!(
            out,
            " | +{} add, {} unused, {} review",
            recs.add.len(),
            recs.unused.len(),
            recs.review.len()
        );
    }
    out.push('\n');

    if let Some(path) = json_output_path.filter(|p| !p.is_empty()) {
        let _ = writeln!(out, "Full JSON: {path}");
    }

    out
}
