//! End-to-end runs of the `guard-home-dir` hook against a real directory tree.

use std::fs;
use std::path::{Path, PathBuf};

use claude_policy::GuardConfig;
use permguard::guard_hook;
use serde_json::json;
use tempfile::TempDir;

struct Fixture {
    _temp: TempDir,
    home: PathBuf,
    project: PathBuf,
}

fn fixture() -> Fixture {
    let temp = TempDir::new().unwrap();
    let home = temp.path().canonicalize().unwrap().join("home");
    let project = home.join("work/app");
    fs::create_dir_all(&project).unwrap();
    fs::create_dir_all(home.join("Documents")).unwrap();
    fs::create_dir_all(home.join("src/lib")).unwrap();
    fs::write(home.join("Documents/tax.pdf"), "x").unwrap();
    Fixture {
        _temp: temp,
        home,
        project,
    }
}

fn hook(fx: &Fixture, tool: &str, tool_input: serde_json::Value) -> Option<serde_json::Value> {
    hook_in(fx, &fx.project, tool, tool_input)
}

fn hook_in(
    fx: &Fixture,
    cwd: &Path,
    tool: &str,
    tool_input: serde_json::Value,
) -> Option<serde_json::Value> {
    let payload = json!({
        "session_id": "s1",
        "hook_event_name": "PreToolUse",
        "cwd": cwd,
        "tool_name": tool,
        "tool_input": tool_input,
    })
    .to_string();
    let mut out = Vec::new();
    let decision =
        guard_hook::run(payload.as_bytes(), &mut out, &fx.home, &GuardConfig::default()).unwrap();
    assert_eq!(decision.is_some(), !out.is_empty());
    decision.map(|_| serde_json::from_slice(&out).unwrap())
}

#[test]
fn test_project_files_pass() {
    let fx = fixture();
    assert!(hook(&fx, "Read", json!({"file_path": "main.rs"})).is_none());
    assert!(hook(&fx, "Write", json!({"file_path": fx.project.join("new/file.rs")})).is_none());
    assert!(hook(&fx, "Bash", json!({"command": "find . -name '*.rs'"})).is_none());
}

#[test]
fn test_allowed_subdirs_pass() {
    let fx = fixture();
    assert!(hook(&fx, "Read", json!({"file_path": fx.home.join("src/lib/x.rs")})).is_none());
    assert!(hook(&fx, "Bash", json!({"command": "grep -r TODO ~/src"})).is_none());
}

#[test]
fn test_home_scan_is_denied() {
    let fx = fixture();
    let out = hook(&fx, "Bash", json!({"command": "cd /tmp && find ~ -name '*.key'"})).unwrap();
    assert_eq!(out["continue"], true);
    assert_eq!(out["hookSpecificOutput"]["hookEventName"], "PreToolUse");
    assert_eq!(out["hookSpecificOutput"]["permissionDecision"], "deny");
}

#[test]
fn test_escape_through_parent_dirs_is_denied() {
    let fx = fixture();
    let out = hook(&fx, "Read", json!({"file_path": "../../Documents/tax.pdf"})).unwrap();
    let reason = out["hookSpecificOutput"]["permissionDecisionReason"]
        .as_str()
        .unwrap();
    assert!(reason.contains(&*fx.home.join("Documents/tax.pdf").to_string_lossy()));
}

#[cfg(unix)]
#[test]
fn test_symlink_out_of_project_is_denied() {
    let fx = fixture();
    std::os::unix::fs::symlink(fx.home.join("Documents"), fx.project.join("docs")).unwrap();
    assert!(hook(&fx, "Read", json!({"file_path": "docs/tax.pdf"})).is_some());
    assert!(hook(&fx, "Bash", json!({"command": "ls -R docs"})).is_some());
}

#[cfg(unix)]
#[test]
fn test_parent_dir_through_symlink_is_denied() {
    let fx = fixture();
    fs::create_dir_all(fx.home.join("Documents/sub")).unwrap();
    std::os::unix::fs::symlink(fx.home.join("Documents/sub"), fx.project.join("docs")).unwrap();

    let out = hook(&fx, "Write", json!({"file_path": "docs/../stolen.txt"})).unwrap();
    let reason = out["hookSpecificOutput"]["permissionDecisionReason"]
        .as_str()
        .unwrap();
    assert!(reason.contains(&*fx.home.join("Documents/stolen.txt").to_string_lossy()));
}

#[test]
fn test_root_cwd_does_not_open_home() {
    let fx = fixture();
    let root = Path::new("/");
    let secret = fx.home.join("Documents/tax.pdf");
    let out = hook_in(&fx, root, "Read", json!({"file_path": secret}));
    assert!(out.is_some());
    assert!(hook_in(&fx, root, "Read", json!({"file_path": "/etc/hosts"})).is_none());
}

#[test]
fn test_without_cwd_home_is_still_guarded() {
    let fx = fixture();
    let no_cwd = Path::new("");
    let out = hook_in(&fx, no_cwd, "Grep", json!({"pattern": "password", "path": fx.home}));
    assert!(out.is_some());
    assert!(hook_in(&fx, no_cwd, "Read", json!({"file_path": "/etc/hosts"})).is_none());
}
