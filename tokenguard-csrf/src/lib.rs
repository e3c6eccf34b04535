//! # Tokenguard CSRF Protection
//!
//! Session-bound Cross-Site Request Forgery (CSRF) protection using the
//! synchronizer token pattern.
//!
//! ## Features
//!
//! - ✅ **Master Token** - One random token per session
//! - ✅ **Per-page Tokens** - Optional distinct token per protected page
//! - ✅ **Rotation** - Optional token replacement after each checked request
//! - ✅ **Ajax Validation** - Token read from a header for ajax requests
//! - ✅ **Page Patterns** - Exact, `/prefix/*`, `*.ext` and `/*` patterns
//! - ✅ **Failure Actions** - Log, set a status, redirect, rotate
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use http::Method;
//! use tokenguard_csrf::*;
//! use tokenguard_session::MemorySession;
//!
//! let config = CsrfGuardConfig::new()
//!     .with_protect(true)
//!     .with_protected_page("/admin/*")
//!     .with_protected_method(Method::POST)
//!     .with_action(Arc::new(LogAction))
//!     .with_action(Arc::new(ErrorAction::default()));
//! let guard = CsrfGuard::new(config).unwrap();
//!
//! // Issue the session's token when rendering the form
//! let session = Arc::new(MemorySession::new("session-1"));
//! let form = GuardRequest::new(Method::GET, "/admin/users").with_session(session.clone());
//! guard.update_tokens(&form).unwrap();
//! let token = guard.token_value(&form).unwrap().unwrap();
//!
//! // The submission carries it back
//! let submit = GuardRequest::new(Method::POST, "/admin/users")
//!     .with_parameter("CSRF_TOKEN", token)
//!     .with_session(session.clone());
//! let mut response = GuardResponse::new();
//! assert!(guard.is_valid_request(&submit, &mut response).unwrap());
//!
//! // A forged submission is rejected and the error action sets 403
//! let forged = GuardRequest::new(Method::POST, "/admin/users")
//!     .with_parameter("CSRF_TOKEN", "forged")
//!     .with_session(session);
//! let mut response = GuardResponse::new();
//! assert!(!guard.is_valid_request(&forged, &mut response).unwrap());
//! assert_eq!(response.status, http::StatusCode::FORBIDDEN);
//! ```
//!
//! ## Page Patterns
//!
//! ```rust
//! use tokenguard_csrf::matcher::matches;
//!
//! assert!(matches("/admin/*", "/admin/users"));
//! assert!(matches("*.jsp", "/app/page.jsp"));
//! assert!(!matches("/admin/*", "/administrator"));
//! ```

pub mod action;
pub mod classifier;
pub mod config;
pub mod error;
pub mod guard;
pub mod matcher;
pub mod request;
pub mod store;
pub mod token;

pub use action::{CsrfAction, ErrorAction, LogAction, RedirectAction, RotateAction};
pub use classifier::ProtectionPolicy;
pub use config::CsrfGuardConfig;
pub use error::{ActionError, GuardError, Result, TokenGenerationError, ValidationError};
pub use guard::{CsrfGuard, Verdict};
pub use request::{CsrfRequest, CsrfResponse, GuardRequest, GuardResponse};
pub use store::TokenStore;
pub use token::{ChaChaRandom, OsRandom, RandomSource, TokenGenerator, random_source};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action::{CsrfAction, ErrorAction, LogAction, RedirectAction, RotateAction};
    pub use crate::config::CsrfGuardConfig;
    pub use crate::error::{GuardError, Result, ValidationError};
    pub use crate::guard::{CsrfGuard, Verdict};
    pub use crate::request::{CsrfRequest, CsrfResponse, GuardRequest, GuardResponse};
}
