//! URI pattern matching.
//!
//! Patterns follow servlet mapping rules:
//!
//! - exact paths: `/admin/users`
//! - path prefixes: `/admin/*` (matches `/admin`, `/admin/` and everything below)
//! - `/*` matches every path
//! - extensions: `*.jsp` (matches `/a/b.jsp`, not `/a/b.jsp.bak`)
//!
//! Comparisons are byte-wise and case-sensitive.

/// Check whether `path` matches `pattern`.
///
/// ```
/// use tokenguard_csrf::matcher::matches;
///
/// assert!(matches("/foo/*", "/foo/bar"));
/// assert!(!matches("/foo/*", "/foobar"));
/// assert!(matches("*.jsp", "/a/b.jsp"));
/// ```
pub fn matches(pattern: &str, path: &str) -> bool {
    let mut matched =
        matches_exact(pattern, path) || pattern == "/*" || matches_prefix(pattern, path);

    // An applicable extension pattern overrides the earlier cases.
    if let Some(extension) = pattern.strip_prefix("*.") {
        if let Some(result) = matches_extension(extension, path) {
            matched = result;
        }
    }

    matched
}

/// Check whether `path` is exactly `pattern`.
///
/// Exact entries take precedence over every other pattern kind.
pub fn matches_exact(pattern: &str, path: &str) -> bool {
    pattern == path
}

fn matches_prefix(pattern: &str, path: &str) -> bool {
    let Some(prefix) = pattern.strip_suffix("/*") else {
        return false;
    };
    let (prefix, path) = (prefix.as_bytes(), path.as_bytes());
    path.starts_with(prefix) && (path.len() == prefix.len() || path[prefix.len()] == b'/')
}

/// Compare the extension of the final path segment.
///
/// `None` when the final segment has no extension, or the path has no '/'.
fn matches_extension(extension: &str, path: &str) -> Option<bool> {
    let slash = path.rfind('/')?;
    let period = path.rfind('.')?;

    if period < slash || period == path.len() - 1 {
        return None;
    }

    Some(path.as_bytes()[period + 1..] == *extension.as_bytes())
}
