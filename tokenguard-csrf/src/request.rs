//! Request and response capabilities the guard consumes.
//!
//! Hosts adapt their own request types by implementing [`CsrfRequest`] and
//! [`CsrfResponse`]. [`GuardRequest`] and [`GuardResponse`] are standalone
//! implementations for tests and simple integrations.

use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use parking_lot::Mutex;
use std::sync::Arc;
use tokenguard_session::{CsrfSession, MemorySession, MemorySessionStore, generate_session_id};
use tracing::debug;

/// Read access to an incoming request.
pub trait CsrfRequest {
    /// Request path, without query string.
    fn path(&self) -> &str;

    fn method(&self) -> &Method;

    /// Header value by case-insensitive name.
    fn header(&self, name: &str) -> Option<&str>;

    /// Query or form parameter by name.
    fn parameter(&self, name: &str) -> Option<&str>;

    /// The session bound to this request.
    ///
    /// When `create` is true and no session exists, one is created.
    fn session(&self, create: bool) -> Option<Arc<dyn CsrfSession>>;
}

/// Write access to the outgoing response, used by failure actions.
pub trait CsrfResponse {
    fn set_status(&mut self, status: StatusCode);

    fn set_header(&mut self, name: HeaderName, value: HeaderValue);
}

/// Standalone request implementation.
pub struct GuardRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    parameters: Vec<(String, String)>,
    session: Mutex<Option<Arc<dyn CsrfSession>>>,
    store: Option<Arc<MemorySessionStore>>,
}

impl GuardRequest {
    /// Create a request for `uri`; a query string becomes parameters.
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, query),
            None => (uri, ""),
        };

        let parameters =
            serde_urlencoded::from_str::<Vec<(String, String)>>(query).unwrap_or_else(|e| {
                debug!(error = %e, "Ignoring malformed query string");
                Vec::new()
            });

        Self {
            method,
            path: path.to_string(),
            headers: HeaderMap::new(),
            parameters,
            session: Mutex::new(None),
            store: None,
        }
    }

    /// Add a header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => debug!(header = %name, "Ignoring invalid header"),
        }
        self
    }

    /// Add a parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    /// Add the parameters of an `application/x-www-form-urlencoded` body.
    pub fn with_form_body(mut self, body: &[u8]) -> Self {
        match serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
            Ok(fields) => self.parameters.extend(fields),
            Err(e) => debug!(error = %e, "Ignoring malformed form body"),
        }
        self
    }

    /// Bind an existing session.
    pub fn with_session(self, session: Arc<dyn CsrfSession>) -> Self {
        *self.session.lock() = Some(session);
        self
    }

    /// Register sessions created by this request in `store`.
    pub fn with_session_store(mut self, store: Arc<MemorySessionStore>) -> Self {
        self.store = Some(store);
        self
    }
}

impl CsrfRequest for GuardRequest {
    fn path(&self) -> &str {
        &self.path
    }

    fn method(&self) -> &Method {
        &self.method
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn session(&self, create: bool) -> Option<Arc<dyn CsrfSession>> {
        let mut slot = self.session.lock();
        if slot.is_none() && create {
            let session: Arc<dyn CsrfSession> = match self.store {
                Some(ref store) => store.create(),
                None => Arc::new(MemorySession::new(generate_session_id())),
            };
            *slot = Some(session);
        }
        slot.clone()
    }
}

/// Standalone response implementation.
#[derive(Debug, Clone)]
pub struct GuardResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl GuardResponse {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }
}

impl Default for GuardResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl CsrfResponse for GuardResponse {
    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }
}
