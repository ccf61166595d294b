//! Home-directory containment checks.
//!
//! Only excursions into the home directory are policed: a path outside
//! `home` always passes. Inside `home`, a path must sit under one of the
//! allowed subdirectories or under the session's working directory.
//!
//! ```rust
//! use claude_policy::guard::{DEFAULT_ALLOWED_SUBDIRS, check_paths};
//!
//! let denied = check_paths(
//!     &["/home/me/src/app", "/home/me/Downloads/x"],
//!     "/home/me",
//!     "/home/me/src/app",
//!     DEFAULT_ALLOWED_SUBDIRS,
//! );
//! assert_eq!(denied.as_deref(), Some("/home/me/Downloads/x"));
//! ```

use tracing::{Level, debug, instrument};

/// Subdirectories of the home directory that may always be scanned.
pub const DEFAULT_ALLOWED_SUBDIRS: &[&str] = &[".claude", "obsidian", "src", "tmp", "workspace"];

/// Returns true if `path` is `base` or lies below it.
///
/// Containment is `base + "/"` prefixing, so `/` contains only itself.
pub fn is_within(path: &str, base: &str) -> bool {
    path == base
        || path
            .strip_prefix(base)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Joins a home directory and a subdirectory name with exactly one `/`.
fn join_home(home: &str, sub: &str) -> String {
    format!("{}/{}", home.trim_end_matches('/'), sub)
}

/// Checks resolved absolute `paths` against the home-directory policy.
///
/// Returns the first path that lies inside `home` but outside every allowed
/// location, or `None` if every path passes. `cwd` is ignored when empty.
#[instrument(level = Level::TRACE, skip(paths, allowed_subdirs))]
pub fn check_paths<S, A>(
    paths: &[S],
    home: &str,
    cwd: &str,
    allowed_subdirs: &[A],
) -> Option<String>
where
    S: AsRef<str>,
    A: AsRef<str>,
{
    let mut allowed: Vec<String> = allowed_subdirs
        .iter()
        .map(|sub| join_home(home, sub.as_ref()))
        .collect();
    if !cwd.is_empty() {
        allowed.push(cwd.to_string());
    }

    paths
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| is_within(p, home))
        .find(|p| !allowed.iter().any(|a| is_within(p, a)))
        .map(|p| {
            debug!(path = p, "path outside allowed home locations");
            p.to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: &str = "/home/u";

    fn check(paths: &[&str], cwd: &str) -> Option<String> {
        check_paths(paths, HOME, cwd, DEFAULT_ALLOWED_SUBDIRS)
    }

    #[test]
    fn test_allowed_subdir_passes() {
        assert_eq!(check(&["/home/u/.claude/x"], "/home/u/proj"), None);
        assert_eq!(check(&["/home/u/src"], ""), None);
        assert_eq!(check(&["/home/u/workspace/a/b"], ""), None);
    }

    #[test]
    fn test_violation_reported_verbatim() {
        assert_eq!(
            check(&["/home/u/Downloads/x"], "/home/u/proj"),
            Some("/home/u/Downloads/x".to_string())
        );
    }

    #[test]
    fn test_home_itself_is_denied() {
        assert_eq!(check(&["/home/u"], "/home/u/proj"), Some("/home/u".to_string()));
    }

    #[test]
    fn test_outside_home_passes() {
        assert_eq!(check(&["/etc", "/tmp/x", "/home/other"], ""), None);
        assert_eq!(check(&["/home/u2/secret"], ""), None);
    }

    #[test]
    fn test_sibling_prefix_is_not_allowed() {
        assert_eq!(check(&["/home/u/src2"], ""), Some("/home/u/src2".to_string()));
        assert_eq!(
            check(&["/home/u/proj-other"], "/home/u/proj"),
            Some("/home/u/proj-other".to_string())
        );
    }

    #[test]
    fn test_cwd_is_allowed() {
        assert_eq!(check(&["/home/u/proj", "/home/u/proj/sub"], "/home/u/proj"), None);
    }

    #[test]
    fn test_empty_cwd_not_added() {
        assert_eq!(check(&["/home/u/proj"], ""), Some("/home/u/proj".to_string()));
    }

    #[test]
    fn test_first_violation_wins() {
        assert_eq!(
            check(&["/home/u/src/ok", "/home/u/a", "/home/u/b"], ""),
            Some("/home/u/a".to_string())
        );
    }

    #[test]
    fn test_empty_paths() {
        let empty: [&str; 0] = [];
        assert_eq!(check(&empty, "/home/u/proj"), None);
    }

    #[test]
    fn test_custom_subdirs() {
        let subs = vec!["notes".to_string()];
        assert_eq!(check_paths(&["/home/u/notes/a"], HOME, "", &subs), None);
        assert_eq!(
            check_paths(&["/home/u/src/a"], HOME, "", &subs),
            Some("/home/u/src/a".to_string())
        );
    }

    #[test]
    fn test_is_within() {
        assert!(is_within("/a/b", "/a"));
        assert!(is_within("/a", "/a"));
        assert!(!is_within("/ab", "/a"));
        assert!(!is_within("/x", "/"));
    }

    #[test]
    fn test_root_cwd_does_not_open_home() {
        assert_eq!(
            check(&["/home/u/Downloads/x"], "/"),
            Some("/home/u/Downloads/x".to_string())
        );
        assert_eq!(check(&["/etc/hosts"], "/"), None);
    }
}
