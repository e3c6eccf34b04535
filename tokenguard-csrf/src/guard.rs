//! Request validation.
//!
//! [`CsrfGuard`] has two entry points:
//!
//! - [`CsrfGuard::update_tokens`] runs after a handler decides the current
//!   session should be protectable, and issues the master token (and page
//!   token) that later requests must present.
//! - [`CsrfGuard::validate`] runs once per incoming request, checks the
//!   presented token, dispatches failure actions and rotates tokens.

use crate::action::dispatch;
use crate::config::CsrfGuardConfig;
use crate::error::{GuardError, Result, ValidationError};
use crate::request::{CsrfRequest, CsrfResponse};
use crate::store::TokenStore;
use crate::token::{TokenGenerator, tokens_match};
use http::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokenguard_session::{CsrfSession, MemorySession};
use tracing::{debug, error, warn};

/// Outcome of validating one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The page or method is not protected; nothing was checked.
    Unprotected,
    /// A protected request presented a matching token.
    Valid,
    /// A protected request was rejected.
    Invalid(ValidationError),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        !matches!(self, Verdict::Invalid(_))
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            Verdict::Invalid(e) => Some(e),
            _ => None,
        }
    }
}

/// CSRF guard
#[derive(Clone)]
pub struct CsrfGuard {
    config: Arc<CsrfGuardConfig>,
    store: TokenStore,
}

impl CsrfGuard {
    /// Create a guard from a validated configuration.
    pub fn new(config: CsrfGuardConfig) -> Result<Self> {
        config.validate()?;

        let generator = TokenGenerator::new(Arc::clone(&config.prng), config.token_length);
        let store = TokenStore::new(generator, config.token_per_page);

        debug!(
            prng = config.prng.algorithm(),
            token_length = config.token_length,
            rotate = config.rotate,
            token_per_page = config.token_per_page,
            ajax = config.ajax,
            actions = config.actions.len(),
            "Creating CSRF guard"
        );

        Ok(Self {
            config: Arc::new(config),
            store,
        })
    }

    pub fn config(&self) -> &CsrfGuardConfig {
        &self.config
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn token_name(&self) -> &str {
        &self.config.token_name
    }

    pub fn is_protected_page(&self, path: &str) -> bool {
        self.config.policy.is_protected_page(path)
    }

    pub fn is_protected_method(&self, method: &Method) -> bool {
        self.config.policy.is_protected_method(method)
    }

    pub fn is_protected_page_and_method(&self, path: &str, method: &Method) -> bool {
        self.config.policy.is_protected_page_and_method(path, method)
    }

    /// Whether the request carries the ajax marker header.
    pub fn is_ajax_request(&self, request: &dyn CsrfRequest) -> bool {
        request.header(&self.config.ajax_header).is_some()
    }

    /// Validate a request.
    ///
    /// Returns `Ok(true)` for unprotected requests and for protected requests
    /// with a matching token, `Ok(false)` when the request must be denied.
    pub fn is_valid_request(
        &self,
        request: &dyn CsrfRequest,
        response: &mut dyn CsrfResponse,
    ) -> Result<bool> {
        Ok(self.validate(request, response)?.is_valid())
    }

    /// Validate a request and report how the decision was reached.
    ///
    /// On a rejected request every configured action runs with the
    /// triggering error. With rotation enabled, a protected non-ajax request
    /// rotates its tokens whether or not it passed.
    ///
    /// # Errors
    ///
    /// [`GuardError::IntegrityViolation`] when the session holds no master
    /// token, which means token issuance did not run before validation.
    /// [`GuardError::TokenGeneration`] when rotation cannot draw randomness.
    pub fn validate(
        &self,
        request: &dyn CsrfRequest,
        response: &mut dyn CsrfResponse,
    ) -> Result<Verdict> {
        let protected = self.is_protected_page_and_method(request.path(), request.method());

        let session = request.session(true).ok_or_else(|| {
            GuardError::IntegrityViolation("request could not provide a session".to_string())
        })?;

        let Some(token_from_session) = self.store.master_token(session.as_ref()) else {
            error!(
                path = %request.path(),
                session_id = %session.id(),
                "No CSRF token in session; tokens must be issued before validation"
            );
            return Err(GuardError::IntegrityViolation(
                "expected the master token to exist in session".to_string(),
            ));
        };

        if !protected {
            return Ok(Verdict::Unprotected);
        }

        let ajax = self.is_ajax_request(request);
        let outcome = if self.config.ajax && ajax {
            debug!(path = %request.path(), "Verifying ajax header token");
            self.verify_ajax_token(request, &token_from_session)
        } else if self.config.token_per_page {
            debug!(path = %request.path(), "Verifying page token");
            self.verify_page_token(request, session.as_ref(), &token_from_session)
        } else {
            debug!(path = %request.path(), "Verifying session token");
            self.verify_session_token(request, &token_from_session)
        };

        let verdict = match outcome {
            Ok(()) => Verdict::Valid,
            Err(e) => {
                warn!(
                    path = %request.path(),
                    method = %request.method(),
                    reason = %e,
                    "CSRF validation failed"
                );
                dispatch(&self.config.actions, request, response, &e, self);
                Verdict::Invalid(e)
            }
        };

        if !ajax && self.config.rotate {
            self.store.rotate(session.as_ref(), request.path())?;
        }

        Ok(verdict)
    }

    /// Issue tokens for the request's session.
    ///
    /// Does nothing without a session. Ensures the master token exists and,
    /// with per-page tokens enabled, ensures the page map exists and holds a
    /// token for the current page if that page and method are protected.
    pub fn update_tokens(&self, request: &dyn CsrfRequest) -> Result<()> {
        let Some(session) = request.session(false) else {
            return Ok(());
        };

        self.update_token(session.as_ref())?;

        if self.config.token_per_page {
            self.store.ensure_page_tokens(session.as_ref());

            if self.is_protected_page_and_method(request.path(), request.method()) {
                self.store
                    .ensure_page_token(session.as_ref(), request.path())?;
            }
        }

        Ok(())
    }

    /// Ensure the session holds a master token, and return it.
    pub fn update_token(&self, session: &dyn CsrfSession) -> Result<String> {
        Ok(self.store.ensure_master_token(session)?)
    }

    /// Token a response should embed for the current page.
    pub fn token_value(&self, request: &dyn CsrfRequest) -> Result<Option<String>> {
        self.token_value_for(request, request.path())
    }

    /// Token a response should embed for links or forms targeting `uri`.
    ///
    /// Prefers the page token of `uri` when per-page tokens are enabled,
    /// creating it first if pre-creation is enabled, and otherwise falls back
    /// to the master token. Returns `None` without a session.
    pub fn token_value_for(&self, request: &dyn CsrfRequest, uri: &str) -> Result<Option<String>> {
        let Some(session) = request.session(false) else {
            return Ok(None);
        };
        let session = session.as_ref();

        if self.config.token_per_page && self.store.has_page_tokens(session) {
            if self.config.token_per_page_precreate {
                return Ok(Some(self.store.ensure_page_token(session, uri)?));
            }
            if let Some(token) = self.store.page_token(session, uri) {
                return Ok(Some(token));
            }
        }

        Ok(self.store.master_token(session))
    }

    /// Rotate the master token and the current page's token.
    pub fn rotate_tokens(&self, request: &dyn CsrfRequest) -> Result<()> {
        let session = request.session(true).ok_or_else(|| {
            GuardError::IntegrityViolation("request could not provide a session".to_string())
        })?;
        self.store.rotate(session.as_ref(), request.path())?;
        Ok(())
    }

    /// Export a session as an attribute map, with the master token stored
    /// under the configured session key.
    pub fn session_attributes(&self, session: &MemorySession) -> Result<HashMap<String, Value>> {
        Ok(session.to_attributes(&self.config.session_key)?)
    }

    /// Restore a session exported by [`CsrfGuard::session_attributes`].
    pub fn restore_session(
        &self,
        id: impl Into<String>,
        attributes: HashMap<String, Value>,
    ) -> Result<MemorySession> {
        Ok(MemorySession::from_attributes(
            id,
            &self.config.session_key,
            attributes,
        )?)
    }

    fn verify_ajax_token(
        &self,
        request: &dyn CsrfRequest,
        token_from_session: &str,
    ) -> std::result::Result<(), ValidationError> {
        let token_from_request = request
            .header(&self.config.token_name)
            .filter(|t| !t.is_empty())
            .ok_or(ValidationError::MissingToken)?;

        if !tokens_match(token_from_session, token_from_request) {
            return Err(ValidationError::HeaderTokenMismatch);
        }
        Ok(())
    }

    fn verify_page_token(
        &self,
        request: &dyn CsrfRequest,
        session: &dyn CsrfSession,
        token_from_session: &str,
    ) -> std::result::Result<(), ValidationError> {
        let token_from_request = self.token_parameter(request)?;

        match self.store.page_token(session, request.path()) {
            Some(token_from_page) if !tokens_match(&token_from_page, token_from_request) => {
                Err(ValidationError::PageTokenMismatch)
            }
            Some(_) => Ok(()),
            None if !tokens_match(token_from_session, token_from_request) => {
                Err(ValidationError::SessionTokenMismatch)
            }
            None => Ok(()),
        }
    }

    fn verify_session_token(
        &self,
        request: &dyn CsrfRequest,
        token_from_session: &str,
    ) -> std::result::Result<(), ValidationError> {
        let token_from_request = self.token_parameter(request)?;

        if !tokens_match(token_from_session, token_from_request) {
            return Err(ValidationError::SessionTokenMismatch);
        }
        Ok(())
    }

    fn token_parameter<'r>(
        &self,
        request: &'r dyn CsrfRequest,
    ) -> std::result::Result<&'r str, ValidationError> {
        request
            .parameter(&self.config.token_name)
            .filter(|t| !t.is_empty())
            .ok_or(ValidationError::MissingToken)
    }
}

impl fmt::Debug for CsrfGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsrfGuard")
            .field("config", &self.config)
            .finish()
    }
}

impl fmt::Display for CsrfGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.config, f)
    }
}
