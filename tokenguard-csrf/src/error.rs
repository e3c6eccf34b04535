//! Error types for CSRF validation.
//!
//! Validation failures ([`ValidationError`]) are expected outcomes: they mark
//! a request invalid and feed the failure actions. Everything in
//! [`GuardError`] means the guard itself is miswired or broken and must not
//! be swallowed.

use thiserror::Error;
use tokenguard_session::SessionError;

/// Result type for guard operations that can fail fatally.
pub type Result<T> = std::result::Result<T, GuardError>;

/// Why a protected request was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required token is missing from the request")]
    MissingToken,

    #[error("request token does not match session token")]
    SessionTokenMismatch,

    #[error("request token does not match page token")]
    PageTokenMismatch,

    #[error("request header token does not match session token")]
    HeaderTokenMismatch,
}

impl ValidationError {
    /// The request carried no token at all.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::MissingToken)
    }

    /// The request carried a token that did not match.
    pub fn is_mismatch(&self) -> bool {
        !self.is_missing()
    }
}

/// Failure of the random source behind token generation.
#[derive(Error, Debug)]
pub enum TokenGenerationError {
    #[error("unsupported PRNG algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid token length: {0} bytes")]
    InvalidLength(usize),

    #[error("random source failure: {0}")]
    Source(String),
}

impl From<rand::Error> for TokenGenerationError {
    fn from(err: rand::Error) -> Self {
        Self::Source(err.to_string())
    }
}

/// Error raised by a failure action.
#[derive(Error, Debug)]
#[error("action '{action}' failed: {message}")]
pub struct ActionError {
    pub action: String,
    pub message: String,
}

impl ActionError {
    pub fn new(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            message: message.into(),
        }
    }
}

/// Fatal guard errors.
#[derive(Error, Debug)]
pub enum GuardError {
    /// A protected request reached validation without a master token in
    /// session; token issuance was not wired in front of validation.
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("unable to generate the random token: {0}")]
    TokenGeneration(#[from] TokenGenerationError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("session attributes: {0}")]
    Session(#[from] SessionError),
}

impl GuardError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}
