//! Session capability consumed by the CSRF core.

use crate::tokens::SessionTokens;
use parking_lot::MutexGuard;

/// A host session exposing its CSRF token attributes.
///
/// The host owns creation and destruction of sessions. This trait only
/// exposes the typed token attributes, behind a lock scoped to the session:
/// every read/modify/write of tokens happens while holding the guard
/// returned by [`CsrfSession::tokens`], so concurrent requests of the same
/// session never observe a torn page map. Unrelated sessions never contend.
///
/// # Examples
///
/// ```
/// use tokenguard_session::{CsrfSession, MemorySession};
///
/// let session = MemorySession::new("abc");
/// session.tokens().set_master_token("M1");
/// assert_eq!(session.tokens().master_token(), Some("M1"));
/// ```
pub trait CsrfSession: Send + Sync {
    /// Stable identifier of the session.
    fn id(&self) -> &str;

    /// Lock the session's token attributes.
    fn tokens(&self) -> MutexGuard<'_, SessionTokens>;
}

/// Generate a new unique session ID.
pub fn generate_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
