//! Integration tests for common tokenguard workflows.
//!
//! These tests drive the guard the way a host framework would: issue tokens
//! while rendering, validate on submission, and persist the session between
//! requests.

use http::{Method, StatusCode};
use std::sync::Arc;
use tokenguard::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn guard(config: CsrfGuardConfig) -> CsrfGuard {
    CsrfGuard::new(
        config
            .with_action(Arc::new(LogAction))
            .with_action(Arc::new(ErrorAction::default())),
    )
    .unwrap()
}

// =============================================================================
// Page Classification
// =============================================================================

#[test]
fn test_catch_all_protects_every_path() {
    let guard = guard(
        CsrfGuardConfig::new()
            .with_protect(true)
            .with_protected_page("/*"),
    );

    for path in ["/", "/a", "/a/b/c.jsp", "/ünïcode"] {
        assert!(guard.is_protected_page(path), "{} should be protected", path);
    }
}

#[test]
fn test_exact_unprotected_entry_wins() {
    let guard = guard(
        CsrfGuardConfig::new()
            .with_protect(true)
            .with_protected_page("/a/*")
            .with_unprotected_page("/a/b"),
    );

    assert!(!guard.is_protected_page("/a/b"));
    assert!(guard.is_protected_page("/a/c"));
    assert!(guard.is_protected_page("/a"));
}

#[test]
fn test_disabled_protection_defaults_to_protected() {
    let guard = guard(CsrfGuardConfig::new().with_protect(false));

    // Unmatched paths are protected when protection is disabled
    assert!(guard.is_protected_page("/anything"));

    let guard = self::guard(CsrfGuardConfig::new().with_protect(true));
    assert!(!guard.is_protected_page("/anything"));
}

#[test]
fn test_safe_methods_pass_without_token() {
    let guard = guard(
        CsrfGuardConfig::new()
            .with_protect(true)
            .with_protected_page("/*")
            .with_protected_method(Method::POST)
            .with_protected_method(Method::PUT)
            .with_protected_method(Method::DELETE),
    );
    let session = Arc::new(MemorySession::new("s1"));
    session.tokens().set_master_token("M1");

    let request = GuardRequest::new(Method::GET, "/orders").with_session(session.clone());
    let mut response = GuardResponse::new();
    assert_eq!(
        guard.validate(&request, &mut response).unwrap(),
        Verdict::Unprotected
    );

    let request = GuardRequest::new(Method::DELETE, "/orders/1").with_session(session);
    let mut response = GuardResponse::new();
    assert!(!guard.is_valid_request(&request, &mut response).unwrap());
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

// =============================================================================
// Issue and Validate
// =============================================================================

#[test]
fn test_login_form_roundtrip_across_requests() {
    init_tracing();

    let guard = guard(
        CsrfGuardConfig::new()
            .with_protect(true)
            .with_protected_page("/login")
            .with_protected_method(Method::POST),
    );
    let store = Arc::new(MemorySessionStore::new());

    // Render the login form
    let render = GuardRequest::new(Method::GET, "/login").with_session_store(Arc::clone(&store));
    let session_id = render.session(true).unwrap().id().to_string();
    guard.update_tokens(&render).unwrap();
    let token = guard.token_value(&render).unwrap().unwrap();

    // Submit it on a later request bound to the same session
    let session = store.require(&session_id).unwrap();
    let submit = GuardRequest::new(Method::POST, "/login")
        .with_form_body(format!("user=alice&CSRF_TOKEN={}", token).as_bytes())
        .with_session(session);
    let mut response = GuardResponse::new();

    assert!(guard.is_valid_request(&submit, &mut response).unwrap());
    assert_eq!(response.status, StatusCode::OK);
}

#[test]
fn test_forged_submission_is_denied() {
    init_tracing();

    let guard = guard(
        CsrfGuardConfig::new()
            .with_protect(true)
            .with_protected_page("/transfer"),
    );
    let session = Arc::new(MemorySession::new("victim"));
    guard.update_token(session.as_ref()).unwrap();

    let forged = GuardRequest::new(Method::POST, "/transfer?amount=1000&to=mallory")
        .with_session(session);
    let mut response = GuardResponse::new();

    let verdict = guard.validate(&forged, &mut response).unwrap();
    assert_eq!(verdict, Verdict::Invalid(ValidationError::MissingToken));
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[test]
fn test_precreated_page_tokens_for_links() {
    let guard = guard(
        CsrfGuardConfig::new()
            .with_protect(true)
            .with_protected_page("/admin/*")
            .with_token_per_page(true)
            .with_token_per_page_precreate(true),
    );
    let session = Arc::new(MemorySession::new("s1"));

    // Rendering the dashboard embeds tokens for the pages it links to
    let dashboard = GuardRequest::new(Method::GET, "/admin/dashboard").with_session(session.clone());
    guard.update_tokens(&dashboard).unwrap();
    let delete_token = guard
        .token_value_for(&dashboard, "/admin/delete")
        .unwrap()
        .unwrap();

    let delete = GuardRequest::new(Method::POST, "/admin/delete")
        .with_parameter("CSRF_TOKEN", delete_token)
        .with_session(session.clone());
    assert!(guard.is_valid_request(&delete, &mut GuardResponse::new()).unwrap());

    // The master token does not open a page that has its own token
    let master = session.tokens().master_token().unwrap().to_string();
    let delete = GuardRequest::new(Method::POST, "/admin/delete")
        .with_parameter("CSRF_TOKEN", master)
        .with_session(session);
    assert!(!guard.is_valid_request(&delete, &mut GuardResponse::new()).unwrap());
}

#[test]
fn test_rotate_action_on_failure() {
    let guard = CsrfGuard::new(
        CsrfGuardConfig::new()
            .with_protect(true)
            .with_protected_page("/*")
            .with_action(Arc::new(RotateAction)),
    )
    .unwrap();
    let session = Arc::new(MemorySession::new("s1"));
    let before = guard.update_token(session.as_ref()).unwrap();

    let request = GuardRequest::new(Method::POST, "/x")
        .with_parameter("CSRF_TOKEN", "guess")
        .with_session(session.clone());
    assert!(!guard.is_valid_request(&request, &mut GuardResponse::new()).unwrap());

    assert_ne!(session.tokens().master_token(), Some(before.as_str()));
}

// =============================================================================
// Session Persistence
// =============================================================================

#[test]
fn test_tokens_survive_attribute_roundtrip() {
    let guard = guard(
        CsrfGuardConfig::new()
            .with_protect(true)
            .with_protected_page("/admin/*")
            .with_token_per_page(true)
            .with_session_key("app.csrf"),
    );
    let session = Arc::new(MemorySession::new("s1"));
    let render = GuardRequest::new(Method::GET, "/admin/users").with_session(session.clone());
    guard.update_tokens(&render).unwrap();
    let token = guard.token_value(&render).unwrap().unwrap();

    let attributes = guard.session_attributes(&session).unwrap();
    assert!(attributes.contains_key("app.csrf"));

    let restored = Arc::new(guard.restore_session("s1", attributes).unwrap());
    let submit = GuardRequest::new(Method::POST, "/admin/users")
        .with_parameter("CSRF_TOKEN", token)
        .with_session(restored);
    assert!(guard.is_valid_request(&submit, &mut GuardResponse::new()).unwrap());
}

#[test]
fn test_configuration_summary() {
    let guard = guard(
        CsrfGuardConfig::new()
            .with_rotate(true)
            .with_token_per_page(true),
    );

    let summary = guard.to_string();
    assert!(summary.contains("* TokenName: CSRF_TOKEN"));
    assert!(summary.contains("* TokenPerPage: true"));
    assert!(summary.contains("* Action: Log"));
    assert!(summary.contains("* Action: Error"));
}
