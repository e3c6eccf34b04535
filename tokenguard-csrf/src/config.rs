use crate::action::CsrfAction;
use crate::classifier::ProtectionPolicy;
use crate::error::{GuardError, Result};
use crate::token::{OsRandom, RandomSource};
use http::Method;
use std::fmt;
use std::sync::Arc;

/// CSRF guard configuration.
///
/// Built explicitly and handed to [`CsrfGuard::new`](crate::CsrfGuard::new);
/// read-only afterwards.
#[derive(Clone)]
pub struct CsrfGuardConfig {
    /// Request parameter (and ajax header) carrying the token
    pub token_name: String,

    /// Number of random bytes per token
    pub token_length: usize,

    /// Rotate tokens after every checked non-ajax request
    pub rotate: bool,

    /// Issue a distinct token per protected page
    pub token_per_page: bool,

    /// Create page tokens on lookup, before the page is first requested
    pub token_per_page_precreate: bool,

    /// Validate ajax requests against the token header
    pub ajax: bool,

    /// Header marking a request as ajax
    pub ajax_header: String,

    /// Session attribute key of the master token, used when a session is
    /// exported to or restored from an attribute map
    pub session_key: String,

    /// Page and method classification
    pub policy: ProtectionPolicy,

    /// Random source for token generation
    pub prng: Arc<dyn RandomSource>,

    /// Actions run, in order, when validation fails
    pub actions: Vec<Arc<dyn CsrfAction>>,
}

impl CsrfGuardConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            token_name: "CSRF_TOKEN".to_string(),
            token_length: 32,
            rotate: false,
            token_per_page: false,
            token_per_page_precreate: false,
            ajax: false,
            ajax_header: "X-Requested-With".to_string(),
            session_key: "CSRF_TOKEN".to_string(),
            policy: ProtectionPolicy::default(),
            prng: Arc::new(OsRandom),
            actions: Vec::new(),
        }
    }

    /// Check the settings the guard cannot work without.
    pub fn validate(&self) -> Result<()> {
        if self.token_name.is_empty() {
            return Err(GuardError::config("token name must not be empty"));
        }
        if self.session_key.is_empty() {
            return Err(GuardError::config("session key must not be empty"));
        }
        if self.token_length == 0 {
            return Err(GuardError::config("token length must be at least 1 byte"));
        }
        if self.ajax_header.is_empty() {
            return Err(GuardError::config("ajax header must not be empty"));
        }
        Ok(())
    }

    /// Set token name
    pub fn with_token_name(mut self, name: impl Into<String>) -> Self {
        self.token_name = name.into();
        self
    }

    /// Set token length in bytes
    pub fn with_token_length(mut self, length: usize) -> Self {
        self.token_length = length;
        self
    }

    /// Enable or disable token rotation
    pub fn with_rotate(mut self, rotate: bool) -> Self {
        self.rotate = rotate;
        self
    }

    /// Enable or disable per-page tokens
    pub fn with_token_per_page(mut self, enabled: bool) -> Self {
        self.token_per_page = enabled;
        self
    }

    /// Enable or disable page token pre-creation
    pub fn with_token_per_page_precreate(mut self, enabled: bool) -> Self {
        self.token_per_page_precreate = enabled;
        self
    }

    /// Enable or disable ajax header validation
    pub fn with_ajax(mut self, enabled: bool) -> Self {
        self.ajax = enabled;
        self
    }

    /// Set the header marking ajax requests
    pub fn with_ajax_header(mut self, header: impl Into<String>) -> Self {
        self.ajax_header = header.into();
        self
    }

    /// Enable or disable protection
    pub fn with_protect(mut self, protect: bool) -> Self {
        self.policy.protect = protect;
        self
    }

    /// Set session key
    pub fn with_session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = key.into();
        self
    }

    /// Add a protected page pattern
    pub fn with_protected_page(mut self, pattern: impl Into<String>) -> Self {
        self.policy.protected_pages.insert(pattern.into());
        self
    }

    /// Add an unprotected page pattern
    pub fn with_unprotected_page(mut self, pattern: impl Into<String>) -> Self {
        self.policy.unprotected_pages.insert(pattern.into());
        self
    }

    /// Add a protected method
    pub fn with_protected_method(mut self, method: Method) -> Self {
        self.policy.protected_methods.insert(method);
        self
    }

    /// Set random source
    pub fn with_prng(mut self, prng: Arc<dyn RandomSource>) -> Self {
        self.prng = prng;
        self
    }

    /// Append a failure action
    pub fn with_action(mut self, action: Arc<dyn CsrfAction>) -> Self {
        self.actions.push(action);
        self
    }
}

impl Default for CsrfGuardConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CsrfGuardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsrfGuardConfig")
            .field("token_name", &self.token_name)
            .field("token_length", &self.token_length)
            .field("rotate", &self.rotate)
            .field("token_per_page", &self.token_per_page)
            .field("token_per_page_precreate", &self.token_per_page_precreate)
            .field("ajax", &self.ajax)
            .field("ajax_header", &self.ajax_header)
            .field("session_key", &self.session_key)
            .field("policy", &self.policy)
            .field("prng", &self.prng.algorithm())
            .field(
                "actions",
                &self.actions.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl fmt::Display for CsrfGuardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "*****************************************************")?;
        writeln!(f, "* CsrfGuard Properties")?;
        writeln!(f, "*")?;
        writeln!(f, "* PRNG: {}", self.prng.algorithm())?;
        writeln!(f, "* SessionKey: {}", self.session_key)?;
        writeln!(f, "* TokenLength: {}", self.token_length)?;
        writeln!(f, "* TokenName: {}", self.token_name)?;
        writeln!(f, "* Ajax: {}", self.ajax)?;
        writeln!(f, "* Rotate: {}", self.rotate)?;
        writeln!(f, "* TokenPerPage: {}", self.token_per_page)?;

        for action in &self.actions {
            writeln!(f, "* Action: {}", action.name())?;
            for (name, value) in action.parameters() {
                writeln!(f, "*\tParameter: {} = {}", name, value)?;
            }
        }

        writeln!(f, "*****************************************************")
    }
}
