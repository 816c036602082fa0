//! Blocking HTTP transport for the daemon client.

use chaincache_rpc::{AuthMode, HttpClient, HttpRequest};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use tracing::debug;

/// An [`HttpClient`] backed by `reqwest`.
///
/// With [`AuthMode::Challenge`] credentials are only sent after the daemon
/// answers `401 Unauthorized`; with [`AuthMode::Immediate`] they ride on
/// the first request. Only basic authentication is supported.
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    /// Creates a client with a fresh connection pool.
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().build()?,
        })
    }

    fn build(&self, request: &HttpRequest, authenticate: bool) -> RequestBuilder {
        let builder = self
            .client
            .post(&request.url)
            .header(CONTENT_TYPE, "application/json")
            .timeout(request.timeout)
            .body(request.body.clone());
        match (&request.credentials, authenticate) {
            (Some(credentials), true) => {
                builder.basic_auth(&credentials.username, Some(&credentials.password))
            }
            _ => builder,
        }
    }

    fn send(&self, request: &HttpRequest, authenticate: bool) -> Result<Response, String> {
        self.build(request, authenticate)
            .send()
            .map_err(|e| e.to_string())
    }
}

/// Whether a response with `status` to the unauthenticated first attempt
/// should be repeated with credentials.
fn retry_with_credentials(status: StatusCode, request: &HttpRequest) -> bool {
    status == StatusCode::UNAUTHORIZED
        && request.auth_mode == AuthMode::Challenge
        && request.credentials.is_some()
}

impl HttpClient for ReqwestClient {
    fn post(&self, request: &HttpRequest) -> Result<Vec<u8>, String> {
        let eager = request.auth_mode == AuthMode::Immediate;
        let mut response = self.send(request, eager)?;
        if retry_with_credentials(response.status(), request) {
            debug!(url = %request.url, "retrying with credentials");
            response = self.send(request, true)?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {status} from {}", request.url));
        }
        response
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|e| e.to_string())
    }
}
