//! HTTP transport abstraction.
//!
//! The RPC client builds [`HttpRequest`]s and hands them to an
//! [`HttpClient`]. Implementations own the actual network stack, including
//! the authentication handshake described by [`AuthMode`].

use crate::config::{AuthMode, Credentials};
use parking_lot::Mutex;
use std::time::Duration;

/// A POST request to the daemon.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Full request URL.
    pub url: String,
    /// JSON request body.
    pub body: Vec<u8>,
    /// Login to use, if any.
    pub credentials: Option<Credentials>,
    /// When the login is sent.
    pub auth_mode: AuthMode,
    /// Request timeout.
    pub timeout: Duration,
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport. With
/// [`AuthMode::Challenge`] an implementation must first send the request
/// without credentials and retry with them only if the server answers with
/// an authentication challenge.
pub trait HttpClient: Send + Sync {
    /// Sends a POST request and returns the response body.
    fn post(&self, request: &HttpRequest) -> Result<Vec<u8>, String>;

    /// Checks if the client is connected/healthy.
    fn is_healthy(&self) -> bool {
        true
    }
}

type Handler = Box<dyn Fn(&HttpRequest) -> Result<Vec<u8>, String> + Send + Sync>;

/// An in-process HTTP client that answers from a handler function.
///
/// Every request is recorded so tests can inspect what was sent.
pub struct MockHttpClient {
    handler: Handler,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttpClient {
    /// Creates a client that answers every request with `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<Vec<u8>, String> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates a client that answers every request with the same body.
    pub fn fixed(body: impl Into<String>) -> Self {
        let body = body.into();
        Self::new(move |_| Ok(body.clone().into_bytes()))
    }

    /// Returns every request sent so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests sent so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl HttpClient for MockHttpClient {
    fn post(&self, request: &HttpRequest) -> Result<Vec<u8>, String> {
        self.requests.lock().push(request.clone());
        (self.handler)(request)
    }
}

impl<C: HttpClient + ?Sized> HttpClient for std::sync::Arc<C> {
    fn post(&self, request: &HttpRequest) -> Result<Vec<u8>, String> {
        (**self).post(request)
    }

    fn is_healthy(&self) -> bool {
        (**self).is_healthy()
    }
}
