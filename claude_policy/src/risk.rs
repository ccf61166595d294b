//! Risk classification for observed tool patterns.
//!
//! Every `(tool, pattern)` pair maps to exactly one [`RiskCategory`]. The
//! classification is driven by flat, ordered rule tables: each rule is a
//! predicate, a category and a reason, and the first rule whose predicate
//! holds wins. Shell patterns are additionally looked up in the bypass table,
//! which says whether allowing the command would let it read or write files
//! that a `Read(...)`/`Write(...)` deny rule is meant to protect.
//!
//! ```rust
//! use claude_policy::risk::{BypassRisk, RiskCategory, categorize};
//!
//! let cat = categorize("Bash", "git status");
//! assert_eq!(cat.category, RiskCategory::Safe);
//!
//! let cat = categorize("Bash", "cat");
//! assert_eq!(cat.category, RiskCategory::Review);
//! assert_eq!(cat.bypass, BypassRisk::Read);
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{Level, instrument};

use crate::permission::matches_pattern;
use crate::shell::command_name;

/// How risky it is to allow a pattern without confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    /// Read-only or routine; a candidate for the allow list.
    Safe,
    /// Needs a human look before it is allowed.
    Review,
    /// Should stay behind a confirmation prompt.
    Ask,
    /// Should be on the deny list.
    Deny,
}

impl RiskCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskCategory::Safe => "safe",
            RiskCategory::Review => "review",
            RiskCategory::Ask => "ask",
            RiskCategory::Deny => "deny",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an allowed shell pattern can sidestep file-tool deny rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BypassRisk {
    #[default]
    None,
    /// Can read files a `Read(...)` deny protects.
    Read,
    /// Can write files a `Write(...)` deny protects.
    Write,
    /// Both of the above.
    Both,
}

impl BypassRisk {
    pub fn as_str(self) -> &'static str {
        match self {
            BypassRisk::None => "none",
            BypassRisk::Read => "read",
            BypassRisk::Write => "write",
            BypassRisk::Both => "both",
        }
    }

    /// Returns true if this risk undermines a deny entry for `deny_tool`.
    pub fn bypasses(self, deny_tool: &str) -> bool {
        match self {
            BypassRisk::None => false,
            BypassRisk::Read => deny_tool == "Read",
            BypassRisk::Write => deny_tool == "Write",
            BypassRisk::Both => deny_tool == "Read" || deny_tool == "Write",
        }
    }
}

impl fmt::Display for BypassRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one `(tool, pattern)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Categorization {
    pub category: RiskCategory,
    pub reason: &'static str,
    pub bypass: BypassRisk,
}

impl Categorization {
    /// Returns true if allowing the pattern can bypass a file deny rule.
    pub fn deny_bypass_risk(&self) -> bool {
        self.bypass != BypassRisk::None
    }
}

/// Predicate half of a rule.
#[derive(Debug, Clone, Copy)]
enum When {
    Always,
    /// The pattern is empty (bare tool use).
    Empty,
    /// The pattern is one of these commands, or one of their subcommands.
    Commands(&'static [&'static str]),
    /// The pattern matches a regex.
    Matches(&'static LazyLock<Regex>),
    /// The path lies under one of these roots.
    Under(&'static [&'static str]),
    /// Absolute or home-relative path.
    OutsideProject,
    /// The bypass table reported a risk; the bypass rule supplies the reason.
    Bypass,
}

impl When {
    fn holds(self, pattern: &str) -> bool {
        match self {
            When::Always => true,
            When::Empty => pattern.is_empty(),
            When::Commands(cmds) => cmds.iter().any(|c| matches_pattern(pattern, c)),
            When::Matches(re) => re.is_match(pattern),
            When::Under(roots) => roots.iter().any(|r| matches_pattern(pattern, r)),
            When::OutsideProject => pattern.starts_with('/') || pattern.starts_with('~'),
            When::Bypass => false,
        }
    }
}

#[derive(Debug)]
struct Rule {
    when: When,
    category: RiskCategory,
    reason: &'static str,
}

#[derive(Debug)]
struct BypassRule {
    when: When,
    bypass: BypassRisk,
    reason: &'static str,
}

const fn rule(when: When, category: RiskCategory, reason: &'static str) -> Rule {
    Rule {
        when,
        category,
        reason,
    }
}

const fn bypass(when: When, bypass: BypassRisk, reason: &'static str) -> BypassRule {
    BypassRule {
        when,
        bypass,
        reason,
    }
}

static HELP_OR_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\S+(?: \S+)? (?:--version|-V|--help|-h|help|version)$")
        .expect("help/version regex is valid")
});

static SECRET_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?:^|/)\.(?:ssh|aws|gnupg|kube|docker|azure|config/gcloud)(?:/|$)",
        r"|(?:^|/)(?:\.env(?:\.[\w.-]+)?|\.netrc|\.npmrc|\.pypirc)$",
        r"|(?:^|/)(?:\.git-credentials|credentials(?:\.json)?)$",
        r"|(?:^|/)id_(?:rsa|dsa|ecdsa|ed25519)$",
        r"|\.(?:pem|key|p12|pfx|keystore)$",
    ))
    .expect("secret path regex is valid")
});

/// Ordered bypass table for `Bash` patterns; first match wins.
static BASH_BYPASS: &[BypassRule] = &[
    bypass(
        When::Empty,
        BypassRisk::Both,
        "unrestricted shell access can read and write any file",
    ),
    bypass(
        When::Matches(&HELP_OR_VERSION),
        BypassRisk::None,
        "help or version query",
    ),
    bypass(
        When::Commands(&[
            "bash", "sh", "zsh", "fish", "dash", "ksh", "eval", "exec", "env", "xargs", "nohup",
            "python", "python3", "node", "deno", "bun", "ruby", "perl", "php", "lua", "osascript",
        ]),
        BypassRisk::Both,
        "runs arbitrary code that can read and write any file",
    ),
    bypass(
        When::Commands(&["find"]),
        BypassRisk::Both,
        "find -exec and -delete can read or modify any file",
    ),
    bypass(
        When::Commands(&[
            "cp", "mv", "rsync", "scp", "install", "ln", "dd", "sed", "awk", "gawk", "tar", "zip",
            "unzip",
        ]),
        BypassRisk::Both,
        "copies or rewrites files, bypassing Read and Write deny rules",
    ),
    bypass(
        When::Commands(&["curl", "wget", "nc", "ncat", "socat"]),
        BypassRisk::Both,
        "network transfer can upload protected files or overwrite them",
    ),
    bypass(
        When::Commands(&[
            "cat", "head", "tail", "less", "more", "bat", "grep", "egrep", "rg", "ag", "strings",
            "od", "xxd", "hexdump", "base64", "diff", "cmp", "nl", "sort", "uniq", "cut", "jq",
            "yq", "open",
        ]),
        BypassRisk::Read,
        "prints file contents, bypassing Read deny rules",
    ),
    bypass(
        When::Commands(&["echo", "printf", "tee", "touch", "truncate"]),
        BypassRisk::Write,
        "writes files through redirection, bypassing Write deny rules",
    ),
];

static BASH_RULES: &[Rule] = &[
    rule(
        When::Commands(&[
            "sudo", "su", "doas", "dd", "mkfs", "fdisk", "diskutil", "shutdown", "reboot", "halt",
            "launchctl", "systemctl",
        ]),
        RiskCategory::Deny,
        "privileged or destructive system command",
    ),
    rule(
        When::Matches(&HELP_OR_VERSION),
        RiskCategory::Safe,
        "help or version query",
    ),
    rule(When::Bypass, RiskCategory::Review, ""),
    rule(
        When::Commands(&[
            "git push", "git reset", "git rebase", "git commit", "git checkout", "git switch",
            "git merge", "git clean", "git stash", "git tag", "git cherry-pick", "git revert",
        ]),
        RiskCategory::Ask,
        "changes repository history or working tree",
    ),
    rule(
        When::Commands(&["rm", "rmdir", "chmod", "chown", "kill", "pkill", "killall"]),
        RiskCategory::Ask,
        "deletes files or changes permissions and processes",
    ),
    rule(
        When::Commands(&[
            "gh", "docker", "podman", "kubectl", "helm", "terraform", "aws", "gcloud", "az", "ssh",
            "npm publish", "cargo publish", "npm install", "pnpm add", "yarn add", "pip install",
            "uv pip", "brew install", "go install", "cargo install",
        ]),
        RiskCategory::Ask,
        "acts on remote services or installs software",
    ),
    rule(
        When::Commands(&[
            "git status", "git diff", "git log", "git show", "git branch", "git blame",
            "git rev-parse", "git remote", "git fetch", "git ls-files", "git grep", "git worktree",
        ]),
        RiskCategory::Safe,
        "read-only git inspection",
    ),
    rule(
        When::Commands(&[
            "ls", "pwd", "which", "whoami", "date", "wc", "file", "stat", "du", "tree", "realpath",
            "dirname", "basename", "mkdir", "true", "false", "test", "sleep",
        ]),
        RiskCategory::Safe,
        "read-only inspection",
    ),
    rule(
        When::Commands(&[
            "go build", "go test", "go vet", "go fmt", "go mod", "go run", "go generate",
            "cargo build", "cargo test", "cargo check", "cargo clippy", "cargo fmt", "cargo doc",
            "cargo tree", "cargo run", "npm test", "npm run", "pnpm test", "pnpm run", "yarn test",
            "yarn run", "pytest", "ruff", "mypy", "eslint", "prettier", "tsc", "gofmt",
            "golangci-lint", "rustfmt", "shellcheck",
        ]),
        RiskCategory::Safe,
        "build, test or lint toolchain",
    ),
    rule(
        When::Commands(&["make", "task", "just", "mise run"]),
        RiskCategory::Safe,
        "task runner",
    ),
    rule(When::Always, RiskCategory::Review, "unrecognized command"),
];

/// Locations that are routine to touch even though they are outside the project.
const SAFE_ROOTS: &[&str] = &["/tmp", "~/.claude", "~/src", "~/workspace", "~/tmp"];

static READ_RULES: &[Rule] = &[
    rule(
        When::Matches(&SECRET_PATH),
        RiskCategory::Deny,
        "path may contain secrets or credentials",
    ),
    rule(When::Empty, RiskCategory::Safe, "searches the working directory"),
    rule(When::Under(SAFE_ROOTS), RiskCategory::Safe, "known working location"),
    rule(When::OutsideProject, RiskCategory::Ask, "reads outside the project"),
    rule(When::Always, RiskCategory::Safe, "reads project files"),
];

static WRITE_RULES: &[Rule] = &[
    rule(
        When::Matches(&SECRET_PATH),
        RiskCategory::Deny,
        "path may contain secrets or credentials",
    ),
    rule(
        When::Empty,
        RiskCategory::Review,
        "unrestricted file modification",
    ),
    rule(
        When::Under(SAFE_ROOTS),
        RiskCategory::Review,
        "modifies files in a known working location",
    ),
    rule(When::OutsideProject, RiskCategory::Ask, "modifies files outside the project"),
    rule(When::Always, RiskCategory::Review, "modifies project files"),
];

static WEB_RULES: &[Rule] = &[rule(When::Always, RiskCategory::Review, "network access")];

static MCP_RULES: &[Rule] = &[rule(When::Always, RiskCategory::Review, "third-party MCP tool")];

static INTERNAL_RULES: &[Rule] = &[rule(When::Always, RiskCategory::Safe, "agent-internal tool")];

static FALLBACK_RULES: &[Rule] = &[rule(When::Always, RiskCategory::Review, "unrecognized tool")];

fn rules_for(tool: &str) -> &'static [Rule] {
    match tool {
        "Bash" => BASH_RULES,
        "Read" | "Glob" | "Grep" | "LS" => READ_RULES,
        "Edit" | "MultiEdit" | "Write" | "NotebookEdit" => WRITE_RULES,
        "WebFetch" | "WebSearch" => WEB_RULES,
        "Task" | "TodoWrite" | "ExitPlanMode" | "BashOutput" | "KillShell" | "SlashCommand" => {
            INTERNAL_RULES
        }
        t if t.starts_with("mcp__") => MCP_RULES,
        _ => FALLBACK_RULES,
    }
}

/// Rewrites a leading `/usr/bin/cat` style command word to `cat`.
fn normalize_command(pattern: &str) -> String {
    let pattern = pattern.trim();
    match pattern.split_once(' ') {
        Some((first, rest)) => format!("{} {}", command_name(first), rest),
        None => command_name(pattern).to_string(),
    }
}

fn bash_bypass_rule(pattern: &str) -> Option<&'static BypassRule> {
    let pattern = normalize_command(pattern);
    BASH_BYPASS.iter().find(|r| r.when.holds(&pattern))
}

/// Returns the bypass risk of a `Bash` pattern.
pub fn bash_bypass(pattern: &str) -> BypassRisk {
    bash_bypass_rule(pattern).map_or(BypassRisk::None, |r| r.bypass)
}

/// Classifies a `(tool, pattern)` pair.
#[instrument(level = Level::TRACE)]
pub fn categorize(tool: &str, pattern: &str) -> Categorization {
    let (pattern, bypass_rule) = if tool == "Bash" {
        (normalize_command(pattern), bash_bypass_rule(pattern))
    } else {
        (pattern.to_string(), None)
    };
    let bypass = bypass_rule.map_or(BypassRisk::None, |r| r.bypass);

    for rule in rules_for(tool) {
        if let When::Bypass = rule.when {
            if let Some(b) = bypass_rule
                && b.bypass != BypassRisk::None
            {
                return Categorization {
                    category: rule.category,
                    reason: b.reason,
                    bypass,
                };
            }
            continue;
        }
        if rule.when.holds(&pattern) {
            return Categorization {
                category: rule.category,
                reason: rule.reason,
                bypass,
            };
        }
    }

    // Every table ends in `When::Always`.
    Categorization {
        category: RiskCategory::Review,
        reason: "unrecognized tool",
        bypass,
    }
}
