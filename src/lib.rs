// Tokenguard - session-bound CSRF request validation
//
// This library decides whether an incoming request is protected and, if so,
// whether it carries the synchronizer token issued to its session.

// Re-export the validation core
pub use tokenguard_csrf::*;

// Re-export the session extension
pub use tokenguard_session as session;

// Prelude for common imports
pub mod prelude {
    pub use crate::session::{CsrfSession, MemorySession, MemorySessionStore, SessionTokens};
    pub use crate::{
        CsrfAction,
        CsrfGuard,
        CsrfGuardConfig,
        CsrfRequest,
        CsrfResponse,
        ErrorAction,
        GuardError,
        GuardRequest,
        GuardResponse,
        LogAction,
        RedirectAction,
        RotateAction,
        ValidationError,
        Verdict,
    };
}
