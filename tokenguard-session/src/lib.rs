//! Session extension for tokenguard CSRF protection.
//!
//! The CSRF core never creates or destroys sessions. It only needs a typed
//! place to keep two attributes per session: the master token and the page
//! token map. This crate defines that capability ([`CsrfSession`]), the typed
//! attribute set ([`SessionTokens`]), and an in-memory implementation used by
//! tests and single-instance deployments.
//!
//! # Examples
//!
//! ```
//! use tokenguard_session::*;
//!
//! let store = MemorySessionStore::new();
//! let session = store.create();
//!
//! session.tokens().set_master_token("M1");
//! session.tokens().page_tokens_mut().insert("/admin/users", "P1");
//!
//! // Persist as an untyped attribute map
//! let attributes = session.to_attributes("CSRF_TOKEN").unwrap();
//! assert!(attributes.contains_key(PAGE_TOKENS_KEY));
//! ```

pub mod error;
pub mod memory;
pub mod tokens;
pub mod traits;

pub use error::{SessionError, SessionResult};
pub use memory::{MemorySession, MemorySessionStore};
pub use tokens::{PAGE_TOKENS_KEY, PageTokens, SessionTokens};
pub use traits::{CsrfSession, generate_session_id};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{SessionError, SessionResult};
    pub use crate::memory::{MemorySession, MemorySessionStore};
    pub use crate::tokens::{PAGE_TOKENS_KEY, PageTokens, SessionTokens};
    pub use crate::traits::{CsrfSession, generate_session_id};
}
