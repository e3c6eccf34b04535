//! Fuzz target for request validation.
//!
//! Feeds arbitrary paths, query strings, form bodies and headers through
//! the guard. Validation must return a verdict and never panic.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use http::Method;
use std::sync::Arc;
use tokenguard_csrf::*;
use tokenguard_session::{CsrfSession, MemorySession};

#[derive(Debug, Arbitrary)]
struct FuzzRequest {
    method: FuzzMethod,
    uri: String,
    body: Vec<u8>,
    headers: Vec<(String, String)>,
    token_per_page: bool,
    ajax: bool,
    rotate: bool,
}

#[derive(Debug, Arbitrary, Clone)]
enum FuzzMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl FuzzMethod {
    fn to_http_method(&self) -> Method {
        match self {
            FuzzMethod::Get => Method::GET,
            FuzzMethod::Post => Method::POST,
            FuzzMethod::Put => Method::PUT,
            FuzzMethod::Delete => Method::DELETE,
            FuzzMethod::Patch => Method::PATCH,
        }
    }
}

fuzz_target!(|data: FuzzRequest| {
    if data.uri.len() > 10000 || data.body.len() > 65536 {
        return;
    }

    let config = CsrfGuardConfig::new()
        .with_protect(true)
        .with_protected_page("/*")
        .with_unprotected_page("*.css")
        .with_token_per_page(data.token_per_page)
        .with_ajax(data.ajax)
        .with_rotate(data.rotate)
        .with_token_length(16);
    let Ok(guard) = CsrfGuard::new(config) else {
        return;
    };

    let session = Arc::new(MemorySession::new("fuzz"));
    session.tokens().set_master_token("M1");

    let mut request = GuardRequest::new(data.method.to_http_method(), &data.uri)
        .with_form_body(&data.body)
        .with_session(session.clone());
    for (name, value) in data.headers.iter().take(32) {
        request = request.with_header(name, value);
    }

    let mut response = GuardResponse::new();
    let verdict = guard.validate(&request, &mut response);
    assert!(verdict.is_ok());

    // Issuance must always succeed with a working random source
    assert!(guard.update_tokens(&request).is_ok());
    assert!(session.tokens().master_token().is_some());
});
