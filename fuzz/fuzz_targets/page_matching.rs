//! Fuzz target for page pattern matching.
//!
//! Tests protected/unprotected page classification with arbitrary
//! patterns and paths without panicking.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use tokenguard_csrf::ProtectionPolicy;
use tokenguard_csrf::matcher::matches;

/// Arbitrary classification scenario for fuzzing.
#[derive(Debug, Arbitrary)]
struct FuzzPolicy {
    protect: bool,
    /// Protected page patterns
    protected: Vec<String>,
    /// Unprotected page patterns
    unprotected: Vec<String>,
    /// Paths to classify
    paths: Vec<String>,
}

fuzz_target!(|data: FuzzPolicy| {
    // Limit pattern count to prevent OOM
    let max_patterns = 100;

    let mut policy = ProtectionPolicy {
        protect: data.protect,
        ..Default::default()
    };
    policy
        .protected_pages
        .extend(data.protected.into_iter().take(max_patterns));
    policy
        .unprotected_pages
        .extend(data.unprotected.into_iter().take(max_patterns));

    for path in &data.paths {
        // Skip extremely long paths
        if path.len() > 10000 {
            continue;
        }

        let protected = policy.is_protected_page(path);

        // An exact unprotected entry always wins
        if policy.unprotected_pages.contains(path) && !policy.protected_pages.contains(path) {
            assert!(!protected);
        }

        for pattern in policy.protected_pages.iter().chain(&policy.unprotected_pages) {
            let _ = matches(pattern, path);
        }
    }
});
