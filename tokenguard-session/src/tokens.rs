//! Typed token attributes stored in a session.
//!
//! A session carries exactly two CSRF attributes: the master token, stored
//! under a configurable key, and the page token map, stored under the fixed
//! [`PAGE_TOKENS_KEY`]. [`SessionTokens`] is the typed view of both; hosts that
//! persist sessions as untyped attribute maps can convert with
//! [`SessionTokens::to_attributes`] and [`SessionTokens::from_attributes`].

use crate::error::{SessionError, SessionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Session attribute key under which the page token map is stored.
pub const PAGE_TOKENS_KEY: &str = "tokenguard.page_tokens";

/// Mapping from request path to its page-specific token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageTokens {
    tokens: HashMap<String, String>,
}

impl PageTokens {
    /// Create an empty page token map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the token for a path.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.tokens.get(path).map(String::as_str)
    }

    /// Check if a token exists for a path.
    pub fn contains(&self, path: &str) -> bool {
        self.tokens.contains_key(path)
    }

    /// Insert or overwrite the token for a path.
    pub fn insert(&mut self, path: impl Into<String>, token: impl Into<String>) {
        self.tokens.insert(path.into(), token.into());
    }

    /// Number of paths holding a token.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no page token has been created yet.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Iterate over `(path, token)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tokens.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for PageTokens {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

/// The CSRF attributes of one session.
///
/// Values are replaced in place; the page map, once created, keeps its
/// identity for the lifetime of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    /// Session-wide master token
    pub master_token: Option<String>,
    /// Per-page tokens, present once per-page tokening has been initialized
    pub page_tokens: Option<PageTokens>,
}

impl SessionTokens {
    /// Create an empty token set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the master token.
    pub fn master_token(&self) -> Option<&str> {
        self.master_token.as_deref()
    }

    /// Replace the master token.
    pub fn set_master_token(&mut self, token: impl Into<String>) {
        self.master_token = Some(token.into());
    }

    /// Get the page token map, if initialized.
    pub fn page_tokens(&self) -> Option<&PageTokens> {
        self.page_tokens.as_ref()
    }

    /// Get the page token map, creating an empty one if absent.
    pub fn page_tokens_mut(&mut self) -> &mut PageTokens {
        self.page_tokens.get_or_insert_with(PageTokens::new)
    }

    /// Get the token for a specific page.
    pub fn page_token(&self, path: &str) -> Option<&str> {
        self.page_tokens.as_ref().and_then(|pages| pages.get(path))
    }

    /// Export to untyped session attributes.
    ///
    /// The master token is written under `master_key`, the page map under
    /// [`PAGE_TOKENS_KEY`]. Absent attributes are omitted.
    pub fn to_attributes(&self, master_key: &str) -> SessionResult<HashMap<String, Value>> {
        let mut attributes = HashMap::new();

        if let Some(ref master) = self.master_token {
            attributes.insert(master_key.to_string(), Value::String(master.clone()));
        }

        if let Some(ref pages) = self.page_tokens {
            let value = serde_json::to_value(pages)
                .map_err(|e| SessionError::Serialization(e.to_string()))?;
            attributes.insert(PAGE_TOKENS_KEY.to_string(), value);
        }

        Ok(attributes)
    }

    /// Import from untyped session attributes.
    ///
    /// Unrelated attributes are ignored. A master attribute that is not a
    /// string, or a page map that is not a string-to-string object, is an
    /// error.
    pub fn from_attributes(
        master_key: &str,
        attributes: &HashMap<String, Value>,
    ) -> SessionResult<Self> {
        let master_token = match attributes.get(master_key) {
            None | Some(Value::Null) => None,
            Some(Value::String(token)) => Some(token.clone()),
            Some(other) => {
                return Err(SessionError::Deserialization(format!(
                    "attribute '{}' is not a string: {}",
                    master_key, other
                )));
            }
        };

        let page_tokens = match attributes.get(PAGE_TOKENS_KEY) {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                serde_json::from_value::<PageTokens>(value.clone())
                    .map_err(|e| SessionError::Deserialization(e.to_string()))?,
            ),
        };

        Ok(Self {
            master_token,
            page_tokens,
        })
    }
}
