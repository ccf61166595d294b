//! Session transcript scanning.
//!
//! Claude Code writes one JSONL transcript per session under
//! `~/.claude/projects/<project>/`. Each assistant line carries
//! `message.content[]`, and the `tool_use` items in it are the tool calls
//! the agent made. Each call becomes a [`ToolSample`] whose pattern is
//! shaped like a permission pattern, so it can be matched against the
//! allow/ask/deny lists.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Deserialize;
use serde_json::Value;
use tracing::{Level, debug, instrument, warn};
use walkdir::WalkDir;

use crate::error::{PolicyError, Result};
use crate::shell::{command_name, split_commands, tokenize};

/// Commands whose first non-option argument is part of the pattern.
const MULTI_LEVEL_COMMANDS: &[&str] = &[
    "git", "go", "cargo", "npm", "pnpm", "yarn", "gh", "docker", "kubectl", "task", "make", "uv",
    "pip", "brew",
];

/// One tool call observed in a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSample {
    pub tool: String,
    pub pattern: String,
    /// Transcript the call was read from.
    pub file: PathBuf,
}

#[derive(Debug, Deserialize)]
struct TranscriptLine {
    #[serde(default)]
    cwd: String,
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Content {
    Items(Vec<ContentItem>),
    /// Plain-text messages carry no tool calls.
    Text(serde::de::IgnoredAny),
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    input: Value,
}

/// Derives the permission-shaped pattern for one tool call.
///
/// `cwd` is the session's working directory; file paths below it become
/// relative, and paths below `home` are written as `~/...`.
pub fn sample_pattern(tool: &str, input: &Value, cwd: &str, home: &str) -> String {
    let field = |key: &str| input.get(key).and_then(Value::as_str).unwrap_or("");

    match tool {
        "Bash" => bash_pattern(field("command")),
        "Read" | "Edit" | "Write" | "MultiEdit" => display_path(field("file_path"), cwd, home),
        "NotebookEdit" => display_path(field("notebook_path"), cwd, home),
        "Glob" | "Grep" => display_path(field("path"), cwd, home),
        "WebFetch" => url_host(field("url"))
            .map(|host| format!("domain:{host}"))
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// `git status --short` -> `git status`, `FOO=1 /usr/bin/make test` -> `make test`.
fn bash_pattern(command: &str) -> String {
    let Some(first) = split_commands(command).into_iter().next() else {
        return String::new();
    };
    let tokens = tokenize(first.trim());
    let mut words = tokens.iter().skip_while(|t| is_assignment(t));

    let Some(cmd) = words.next() else {
        return String::new();
    };
    let name = command_name(cmd);

    if MULTI_LEVEL_COMMANDS.contains(&name)
        && let Some(sub) = words.find(|t| !t.starts_with('-'))
    {
        return format!("{name} {sub}");
    }
    name.to_string()
}

/// `NAME=value` with a shell identifier before the `=`.
fn is_assignment(token: &str) -> bool {
    match token.split_once('=') {
        Some((name, _)) => {
            !name.is_empty()
                && !name.starts_with(|c: char| c.is_ascii_digit())
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

fn display_path(path: &str, cwd: &str, home: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    if !cwd.is_empty() {
        if path == cwd {
            return ".".to_string();
        }
        if let Some(rest) = path.strip_prefix(cwd)
            && let Some(rest) = rest.strip_prefix('/')
        {
            return rest.to_string();
        }
    }
    if !home.is_empty()
        && let Some(rest) = path.strip_prefix(home)
        && let Some(rest) = rest.strip_prefix('/')
    {
        return format!("~/{rest}");
    }
    path.to_string()
}

/// Host of an `http(s)://` URL, without userinfo or port.
fn url_host(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host = authority.rsplit('@').next()?;
    let host = host.split(':').next()?;
    (!host.is_empty()).then_some(host)
}

/// Extracts every tool call from one transcript line.
fn samples_from_line(line: &str, file: &Path, home: &str) -> Option<Vec<ToolSample>> {
    let parsed: TranscriptLine = serde_json::from_str(line).ok()?;
    let Some(Content::Items(items)) = parsed.message.and_then(|m| m.content) else {
        return Some(Vec::new());
    };

    Some(
        items
            .into_iter()
            .filter(|item| item.kind == "tool_use" && !item.name.is_empty())
            .map(|item| ToolSample {
                pattern: sample_pattern(&item.name, &item.input, &parsed.cwd, home),
                tool: item.name,
                file: file.to_path_buf(),
            })
            .collect(),
    )
}

fn scan_file(path: &Path, home: &str, samples: &mut Vec<ToolSample>) {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping unreadable transcript");
            return;
        }
    };

    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "stopped reading transcript");
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match samples_from_line(&line, path, home) {
            Some(found) => samples.extend(found),
            None => debug!(path = %path.display(), line = lineno + 1, "skipping malformed line"),
        }
    }
}

/// Collects tool calls from `*.jsonl` transcripts modified in the last `days` days.
#[instrument(level = Level::TRACE)]
pub fn scan_transcripts(projects_dir: &Path, days: u32, home: &str) -> Result<Vec<ToolSample>> {
    if let Err(e) = projects_dir.metadata() {
        return Err(PolicyError::TranscriptDir {
            path: projects_dir.to_path_buf(),
            source: e,
        });
    }

    let window = Duration::from_secs(u64::from(days) * 24 * 60 * 60);
    let cutoff = SystemTime::now()
        .checked_sub(window)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut samples = Vec::new();
    let mut files = 0usize;

    for entry in WalkDir::new(projects_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
    {
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "jsonl") {
            continue;
        }
        let recent = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .is_some_and(|modified| modified >= cutoff);
        if !recent {
            continue;
        }
        files += 1;
        scan_file(path, home, &mut samples);
    }

    debug!(
        path = %projects_dir.display(),
        files,
        samples = samples.len(),
        "scanned transcripts"
    );
    Ok(samples)
}

/// Number of distinct transcripts that contributed samples.
pub fn count_unique_files(samples: &[ToolSample]) -> usize {
    samples
        .iter()
        .map(|s| s.file.as_path())
        .collect::<HashSet<_>>()
        .len()
}
