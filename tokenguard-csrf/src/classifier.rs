//! Protected/unprotected classification of requests.

use crate::matcher::{matches, matches_exact};
use http::Method;
use std::collections::{BTreeSet, HashSet};
use tracing::trace;

/// Which pages and methods require a valid token.
#[derive(Debug, Clone, Default)]
pub struct ProtectionPolicy {
    /// Global protection flag
    pub protect: bool,

    /// Patterns of pages requiring a token
    pub protected_pages: BTreeSet<String>,

    /// Patterns of pages exempt from token checks
    pub unprotected_pages: BTreeSet<String>,

    /// Methods requiring a token; empty means every method
    pub protected_methods: HashSet<Method>,
}

impl ProtectionPolicy {
    /// Decide whether `path` is protected.
    ///
    /// Exact entries win immediately, protected before unprotected. Pattern
    /// entries only set the default, and unprotected patterns are applied
    /// after protected ones, so overlapping patterns favor "unprotected".
    ///
    /// With no matching entry the result is `!protect`: turning protection off
    /// makes unlisted pages protected.
    pub fn is_protected_page(&self, path: &str) -> bool {
        let mut protected = !self.protect;

        for pattern in &self.protected_pages {
            if matches_exact(pattern, path) {
                trace!(path = %path, pattern = %pattern, "Exact protected match");
                return true;
            } else if matches(pattern, path) {
                protected = true;
            }
        }

        for pattern in &self.unprotected_pages {
            if matches_exact(pattern, path) {
                trace!(path = %path, pattern = %pattern, "Exact unprotected match");
                return false;
            } else if matches(pattern, path) {
                protected = false;
            }
        }

        protected
    }

    /// Decide whether `method` is protected.
    pub fn is_protected_method(&self, method: &Method) -> bool {
        self.protected_methods.is_empty() || self.protected_methods.contains(method)
    }

    /// Both the page and the method are protected.
    pub fn is_protected_page_and_method(&self, path: &str, method: &Method) -> bool {
        self.is_protected_page(path) && self.is_protected_method(method)
    }
}
