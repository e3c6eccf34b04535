//! Session-scoped token storage.
//!
//! Every read/modify/write sequence runs under the session's token lock, so
//! concurrent requests of one session can never create two tokens for the
//! same page or interleave a rotation with a page-token insert.

use crate::error::TokenGenerationError;
use crate::token::TokenGenerator;
use tokenguard_session::CsrfSession;
use tracing::debug;

/// Accessor and mutator for the master token and page tokens of a session.
#[derive(Debug, Clone)]
pub struct TokenStore {
    generator: TokenGenerator,
    token_per_page: bool,
}

impl TokenStore {
    pub fn new(generator: TokenGenerator, token_per_page: bool) -> Self {
        Self {
            generator,
            token_per_page,
        }
    }

    pub fn generator(&self) -> &TokenGenerator {
        &self.generator
    }

    /// Get the master token.
    pub fn master_token(&self, session: &dyn CsrfSession) -> Option<String> {
        session.tokens().master_token().map(str::to_string)
    }

    /// Create the master token if absent, and return it.
    pub fn ensure_master_token(
        &self,
        session: &dyn CsrfSession,
    ) -> Result<String, TokenGenerationError> {
        let mut tokens = session.tokens();
        if let Some(existing) = tokens.master_token() {
            return Ok(existing.to_string());
        }

        let token = self.generator.generate()?;
        debug!(session_id = %session.id(), "Created master token");
        tokens.set_master_token(token.clone());
        Ok(token)
    }

    /// Get the token for a page.
    pub fn page_token(&self, session: &dyn CsrfSession, path: &str) -> Option<String> {
        session.tokens().page_token(path).map(str::to_string)
    }

    /// Whether the session's page token map has been created.
    pub fn has_page_tokens(&self, session: &dyn CsrfSession) -> bool {
        session.tokens().page_tokens().is_some()
    }

    /// Create an empty page token map if absent.
    pub fn ensure_page_tokens(&self, session: &dyn CsrfSession) {
        session.tokens().page_tokens_mut();
    }

    /// Create the token for `path` if absent, and return it.
    ///
    /// Creates the page token map first when the session has none.
    pub fn ensure_page_token(
        &self,
        session: &dyn CsrfSession,
        path: &str,
    ) -> Result<String, TokenGenerationError> {
        let mut tokens = session.tokens();
        let pages = tokens.page_tokens_mut();
        if let Some(existing) = pages.get(path) {
            return Ok(existing.to_string());
        }

        let token = self.generator.generate()?;
        debug!(session_id = %session.id(), path = %path, "Created page token");
        pages.insert(path, token.clone());
        Ok(token)
    }

    /// Replace the master token and, with per-page tokens enabled, the token
    /// of `path`. Tokens of other pages are left untouched.
    pub fn rotate(&self, session: &dyn CsrfSession, path: &str) -> Result<(), TokenGenerationError> {
        let master = self.generator.generate()?;
        let page = if self.token_per_page {
            Some(self.generator.generate()?)
        } else {
            None
        };

        let mut tokens = session.tokens();
        tokens.set_master_token(master);
        if let Some(page) = page {
            tokens.page_tokens_mut().insert(path, page);
        }

        debug!(session_id = %session.id(), path = %path, "Rotated tokens");
        Ok(())
    }
}
