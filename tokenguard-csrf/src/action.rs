//! Failure actions.
//!
//! Actions run in configuration order whenever a protected request fails
//! validation. A failing action is logged and skipped; it never stops the
//! remaining actions or the validator.

use crate::error::{ActionError, ValidationError};
use crate::guard::CsrfGuard;
use crate::request::{CsrfRequest, CsrfResponse};
use http::{HeaderValue, StatusCode, header};
use std::sync::Arc;
use tracing::{error, warn};

/// An action executed when validation fails.
pub trait CsrfAction: Send + Sync {
    /// Action name, reported in the configuration summary.
    fn name(&self) -> &str;

    /// Action parameters, reported in the configuration summary.
    fn parameters(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn execute(
        &self,
        request: &dyn CsrfRequest,
        response: &mut dyn CsrfResponse,
        error: &ValidationError,
        guard: &CsrfGuard,
    ) -> Result<(), ActionError>;
}

/// Run every action with the triggering error.
pub(crate) fn dispatch(
    actions: &[Arc<dyn CsrfAction>],
    request: &dyn CsrfRequest,
    response: &mut dyn CsrfResponse,
    failure: &ValidationError,
    guard: &CsrfGuard,
) {
    for action in actions {
        if let Err(e) = action.execute(request, response, failure, guard) {
            error!(action = action.name(), error = %e, "CSRF failure action failed");
        }
    }
}

/// Logs the failure with its request context.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAction;

impl CsrfAction for LogAction {
    fn name(&self) -> &str {
        "Log"
    }

    fn execute(
        &self,
        request: &dyn CsrfRequest,
        _response: &mut dyn CsrfResponse,
        error: &ValidationError,
        _guard: &CsrfGuard,
    ) -> Result<(), ActionError> {
        let session_id = request
            .session(false)
            .map(|s| s.id().to_string())
            .unwrap_or_default();

        warn!(
            path = %request.path(),
            method = %request.method(),
            session_id = %session_id,
            reason = %error,
            "Potential cross-site request forgery attack"
        );
        Ok(())
    }
}

/// Sets the response status, `403 Forbidden` by default.
#[derive(Debug, Clone, Copy)]
pub struct ErrorAction {
    status: StatusCode,
}

impl ErrorAction {
    pub fn new(status: StatusCode) -> Self {
        Self { status }
    }
}

impl Default for ErrorAction {
    fn default() -> Self {
        Self::new(StatusCode::FORBIDDEN)
    }
}

impl CsrfAction for ErrorAction {
    fn name(&self) -> &str {
        "Error"
    }

    fn parameters(&self) -> Vec<(String, String)> {
        vec![("Code".to_string(), self.status.as_u16().to_string())]
    }

    fn execute(
        &self,
        _request: &dyn CsrfRequest,
        response: &mut dyn CsrfResponse,
        _error: &ValidationError,
        _guard: &CsrfGuard,
    ) -> Result<(), ActionError> {
        response.set_status(self.status);
        Ok(())
    }
}

/// Redirects to an error page.
#[derive(Debug, Clone)]
pub struct RedirectAction {
    page: String,
}

impl RedirectAction {
    pub fn new(page: impl Into<String>) -> Self {
        Self { page: page.into() }
    }
}

impl CsrfAction for RedirectAction {
    fn name(&self) -> &str {
        "Redirect"
    }

    fn parameters(&self) -> Vec<(String, String)> {
        vec![("Page".to_string(), self.page.clone())]
    }

    fn execute(
        &self,
        _request: &dyn CsrfRequest,
        response: &mut dyn CsrfResponse,
        _error: &ValidationError,
        _guard: &CsrfGuard,
    ) -> Result<(), ActionError> {
        if self.page.is_empty() {
            return Err(ActionError::new(self.name(), "no redirect page configured"));
        }

        let location = HeaderValue::from_str(&self.page)
            .map_err(|e| ActionError::new(self.name(), e.to_string()))?;
        response.set_status(StatusCode::FOUND);
        response.set_header(header::LOCATION, location);
        Ok(())
    }
}

/// Rotates the session's tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct RotateAction;

impl CsrfAction for RotateAction {
    fn name(&self) -> &str {
        "Rotate"
    }

    fn execute(
        &self,
        request: &dyn CsrfRequest,
        _response: &mut dyn CsrfResponse,
        _error: &ValidationError,
        guard: &CsrfGuard,
    ) -> Result<(), ActionError> {
        guard
            .rotate_tokens(request)
            .map_err(|e| ActionError::new(self.name(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CsrfGuardConfig;
    use crate::request::{GuardRequest, GuardResponse};
    use http::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokenguard_session::{CsrfSession, MemorySession};

    struct FailingAction;

    impl CsrfAction for FailingAction {
        fn name(&self) -> &str {
            "Failing"
        }

        fn execute(
            &self,
            _request: &dyn CsrfRequest,
            _response: &mut dyn CsrfResponse,
            _error: &ValidationError,
            _guard: &CsrfGuard,
        ) -> Result<(), ActionError> {
            Err(ActionError::new(self.name(), "boom"))
        }
    }

    #[derive(Default)]
    struct CountingAction {
        calls: AtomicUsize,
    }

    impl CsrfAction for CountingAction {
        fn name(&self) -> &str {
            "Counting"
        }

        fn execute(
            &self,
            _request: &dyn CsrfRequest,
            _response: &mut dyn CsrfResponse,
            _error: &ValidationError,
            _guard: &CsrfGuard,
        ) -> Result<(), ActionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn guard() -> CsrfGuard {
        CsrfGuard::new(CsrfGuardConfig::new()).unwrap()
    }

    #[test]
    fn test_failing_action_does_not_stop_dispatch() {
        let counting = Arc::new(CountingAction::default());
        let failing: Arc<dyn CsrfAction> = Arc::new(FailingAction);
        let counted: Arc<dyn CsrfAction> = counting.clone();
        let actions = vec![failing.clone(), counted.clone(), failing, counted];

        let request = GuardRequest::new(Method::POST, "/x");
        let mut response = GuardResponse::new();
        dispatch(
            &actions,
            &request,
            &mut response,
            &ValidationError::MissingToken,
            &guard(),
        );

        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_error_action_sets_status() {
        let request = GuardRequest::new(Method::POST, "/x");
        let mut response = GuardResponse::new();

        ErrorAction::default()
            .execute(&request, &mut response, &ValidationError::MissingToken, &guard())
            .unwrap();
        assert_eq!(response.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_redirect_action() {
        let request = GuardRequest::new(Method::POST, "/x");
        let mut response = GuardResponse::new();

        RedirectAction::new("/error.html")
            .execute(
                &request,
                &mut response,
                &ValidationError::SessionTokenMismatch,
                &guard(),
            )
            .unwrap();
        assert_eq!(response.status, StatusCode::FOUND);
        assert_eq!(response.headers.get(header::LOCATION).unwrap(), "/error.html");
    }

    #[test]
    fn test_redirect_action_without_page_fails() {
        let request = GuardRequest::new(Method::POST, "/x");
        let mut response = GuardResponse::new();

        let result = RedirectAction::new("").execute(
            &request,
            &mut response,
            &ValidationError::MissingToken,
            &guard(),
        );
        assert!(result.is_err());
        assert_eq!(response.status, StatusCode::OK);
    }

    #[test]
    fn test_rotate_action_replaces_master_token() {
        let session = Arc::new(MemorySession::new("s1"));
        session.tokens().set_master_token("M1");
        let request = GuardRequest::new(Method::POST, "/x").with_session(session.clone());
        let mut response = GuardResponse::new();

        RotateAction
            .execute(&request, &mut response, &ValidationError::MissingToken, &guard())
            .unwrap();

        let master = session.tokens().master_token().map(str::to_string).unwrap();
        assert_ne!(master, "M1");
    }

    #[test]
    fn test_log_action_succeeds() {
        let request = GuardRequest::new(Method::POST, "/x");
        let mut response = GuardResponse::new();
        assert!(
            LogAction
                .execute(&request, &mut response, &ValidationError::MissingToken, &guard())
                .is_ok()
        );
    }
}
