//! Filesystem-scan detection for shell commands.
//!
//! Recognizes the commands that walk directory trees (`find`, `du`, `tree`
//! and `ls -R`) and pulls out the paths they would walk. Everything else is
//! not a scan, which is reported as `None` rather than an empty list so
//! callers can tell "nothing to check" from "a scan with no usable paths".

use tracing::{Level, instrument, trace};

use crate::shell::{command_name, expand_home, segments, tokenize};

/// Commands longer than this are not parsed at all.
pub const MAX_COMMAND_LEN: usize = 64 * 1024;

/// Returns true if `command` is too long to be audited.
pub fn exceeds_command_limit(command: &str, limit: usize) -> bool {
    command.len() > limit
}

/// Extracts the paths that filesystem-scanning commands in `command` target.
///
/// Returns `None` when no segment is a recognized scanning command, or when
/// the scanning commands present yielded no path operands.
#[instrument(level = Level::TRACE)]
pub fn extract_scan_targets(command: &str, home: &str) -> Option<Vec<String>> {
    let mut targets = Vec::new();

    for segment in segments(command) {
        let tokens = tokenize(segment.text.trim());
        let Some(first) = tokens.first() else {
            continue;
        };

        let found = match command_name(first) {
            "find" => find_paths(&tokens, home),
            "du" | "tree" => operand_paths(&tokens, home),
            "ls" if has_recursive_flag(&tokens) => operand_paths(&tokens, home),
            _ => Vec::new(),
        };

        if !found.is_empty() {
            trace!(command = %first, paths = ?found, "scan targets");
        }
        targets.extend(found);
    }

    if targets.is_empty() {
        None
    } else {
        Some(targets)
    }
}

/// `find [path...] [expression]`: the leading operands before the expression.
fn find_paths(tokens: &[String], home: &str) -> Vec<String> {
    let mut paths = Vec::new();
    for tok in tokens.iter().skip(1) {
        if is_redirect(tok) {
            continue;
        }
        if tok.starts_with('-') || tok == "(" || tok == "!" || tok == "\\(" {
            break;
        }
        paths.push(expand_home(tok, home));
    }
    paths
}

/// Every non-option, non-redirect operand (`du`, `tree`, `ls -R`).
fn operand_paths(tokens: &[String], home: &str) -> Vec<String> {
    tokens
        .iter()
        .skip(1)
        .filter(|tok| !is_redirect(tok) && !tok.starts_with('-'))
        .map(|tok| expand_home(tok, home))
        .collect()
}

/// `--recursive`, or a short option cluster containing `R` (`-R`, `-laR`).
fn has_recursive_flag(tokens: &[String]) -> bool {
    tokens.iter().skip(1).any(|tok| {
        tok == "--recursive"
            || (tok.starts_with('-') && !tok.starts_with("--") && tok.contains('R'))
    })
}

/// Redirections such as `2>/dev/null`, `>/tmp/out` or `2>&1`.
fn is_redirect(tok: &str) -> bool {
    tok.contains(">/") || tok.contains(">&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HOME: &str = "/home/u";

    fn targets(cmd: &str) -> Option<Vec<String>> {
        extract_scan_targets(cmd, HOME)
    }

    fn v(paths: &[&str]) -> Option<Vec<String>> {
        Some(paths.iter().map(|p| p.to_string()).collect())
    }

    #[test]
    fn test_find_single_path() {
        assert_eq!(targets("find ~ -name '*.pem'"), v(&["/home/u"]));
    }

    #[test]
    fn test_find_multiple_paths_stop_at_expression() {
        assert_eq!(
            targets("find /tmp $HOME/docs ( -name a -o -name b )"),
            v(&["/tmp", "/home/u/docs"])
        );
        assert_eq!(targets("find . ! -name x"), v(&["."]));
        assert_eq!(targets(r"find src \( -name x \)"), v(&["src"]));
    }

    #[test]
    fn test_find_skips_redirects() {
        assert_eq!(targets("find 2>/dev/null ~/x -type f"), v(&["/home/u/x"]));
    }

    #[test]
    fn test_find_without_paths_is_not_a_scan() {
        assert_eq!(targets("find -name foo"), None);
        assert_eq!(targets("find"), None);
    }

    #[test]
    fn test_du_and_tree() {
        assert_eq!(targets("du -sh ~/Downloads ~/src"), v(&["/home/u/Downloads", "/home/u/src"]));
        assert_eq!(targets("tree -L 2 ~ 2>&1"), v(&["2", "/home/u"]));
    }

    #[test]
    fn test_ls_requires_recursive_flag() {
        assert_eq!(targets("ls -la ~"), None);
        assert_eq!(targets("ls -laR ~"), v(&["/home/u"]));
        assert_eq!(targets("ls --recursive /etc"), v(&["/etc"]));
        assert_eq!(targets("ls --Recurse /etc"), None);
    }

    #[test]
    fn test_command_with_path_prefix() {
        assert_eq!(targets("/usr/bin/find ~/.ssh"), v(&["/home/u/.ssh"]));
    }

    #[test]
    fn test_collects_across_segments() {
        assert_eq!(
            targets("cd /tmp && find ~ -type f | head; du -s /var"),
            v(&["/home/u", "/var"])
        );
    }

    #[test]
    fn test_quoted_paths() {
        assert_eq!(targets(r#"find "$HOME/My Docs" -type f"#), v(&["/home/u/My Docs"]));
    }

    #[test]
    fn test_non_scan_commands() {
        assert_eq!(targets("cat ~/.ssh/id_rsa"), None);
        assert_eq!(targets("echo find ~"), None);
        assert_eq!(targets(""), None);
        assert_eq!(targets("   ;  && "), None);
    }

    #[test]
    fn test_none_is_distinct_from_empty() {
        let result = targets("git status");
        assert!(result.is_none());
        assert_ne!(result, Some(Vec::new()));
    }

    #[test]
    fn test_command_limit() {
        assert!(!exceeds_command_limit("ls", MAX_COMMAND_LEN));
        assert!(exceeds_command_limit(&"a".repeat(MAX_COMMAND_LEN + 1), MAX_COMMAND_LEN));
    }

    proptest! {
        #[test]
        fn non_scanning_commands_yield_none(
            cmd in "(cat|echo|git|grep|ls -la|rm) [a-z~/ ]{0,20}",
        ) {
            prop_assert_eq!(targets(&cmd), None);
        }

        #[test]
        fn scanning_commands_with_operand_yield_some(
            cmd in "(find|du|tree|ls -R) [a-z~/]{1,12}",
        ) {
            let result = targets(&cmd);
            prop_assert!(result.is_some());
            prop_assert!(!result.unwrap().is_empty());
        }
    }
}
