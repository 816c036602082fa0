//! JSON-RPC and path-request client.

use crate::config::RpcConfig;
use crate::error::{RpcError, RpcResult};
use crate::http::{HttpClient, HttpRequest};
use crate::throttle::Throttle;
use chaincache_codec::{from_json, from_json_slice, to_json, Value};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// A throttled client for one daemon endpoint.
///
/// Two call styles are supported: JSON-RPC methods posted to `/json_rpc`
/// and plain path requests such as `/get_transactions`. All calls made
/// through one client share its rate limit.
pub struct RpcClient<C: HttpClient> {
    config: RpcConfig,
    endpoint: String,
    client: C,
    throttle: Throttle,
    connected: AtomicBool,
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> RpcClient<C> {
    /// Creates a client for the endpoint described by `config`.
    pub fn new(config: RpcConfig, client: C) -> Self {
        Self {
            endpoint: config.endpoint(),
            throttle: Throttle::per_second(config.max_requests_per_second),
            config,
            client,
            connected: AtomicBool::new(true),
            last_error: RwLock::new(None),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Returns the resolved base URI.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the HTTP client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the last transport error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// Returns true if the client is open and the transport is healthy.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && self.client.is_healthy()
    }

    /// Closes the client; later calls fail with [`RpcError::NotConnected`].
    pub fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Invokes a JSON-RPC method and returns its `result` member.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Fault`] if the response carries an `error`
    /// member, [`RpcError::Protocol`] if it has no `result`, or a transport
    /// or codec error.
    pub fn send_json_request(&self, method: &str, params: Value) -> RpcResult<Value> {
        let envelope = Value::map(vec![
            ("jsonrpc".to_string(), Value::from("2.0")),
            ("id".to_string(), Value::from("0")),
            ("method".to_string(), Value::from(method)),
            ("params".to_string(), params),
        ]);
        let response = self.post("json_rpc", &envelope)?;
        check_fault(&response)?;
        response
            .get("result")
            .cloned()
            .ok_or_else(|| RpcError::protocol(format!("{method} response has no result")))
    }

    /// Posts `params` to `<endpoint>/<path>` and returns the whole response.
    ///
    /// Some daemon paths answer with a JSON document encoded as a string;
    /// such responses are decoded a second time.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Fault`] if the response carries an `error`
    /// member, or a transport or codec error.
    pub fn send_path_request(&self, path: &str, params: Value) -> RpcResult<Value> {
        let mut response = self.post(path.trim_start_matches('/'), &params)?;
        if let Value::Text(text) = &response {
            response = from_json(text)?;
        }
        check_fault(&response)?;
        Ok(response)
    }

    fn post(&self, path: &str, body: &Value) -> RpcResult<Value> {
        if !self.is_connected() {
            return Err(RpcError::NotConnected);
        }

        let request = HttpRequest {
            url: format!("{}/{}", self.endpoint, path),
            body: to_json(body)?.into_bytes(),
            credentials: self.config.credentials.clone(),
            auth_mode: self.config.auth_mode,
            timeout: self.config.timeout,
        };

        self.throttle.acquire();
        debug!(url = %request.url, "sending request");
        let response = self.client.post(&request).map_err(|e| {
            warn!(url = %request.url, error = %e, "request failed");
            *self.last_error.write() = Some(e.clone());
            RpcError::transport_retryable(e)
        })?;
        *self.last_error.write() = None;

        Ok(from_json_slice(&response)?)
    }
}

/// Turns an `error` member into [`RpcError::Fault`].
fn check_fault(response: &Value) -> RpcResult<()> {
    let Some(error) = response.get("error").filter(|e| !e.is_null()) else {
        return Ok(());
    };
    let code = error
        .get("code")
        .and_then(Value::as_integer)
        .and_then(|c| i64::try_from(c).ok())
        .unwrap_or_default();
    let message = error
        .get("message")
        .and_then(Value::as_text)
        .unwrap_or_default()
        .to_string();
    warn!(code, %message, "daemon returned fault");
    Err(RpcError::Fault { code, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthMode, Credentials};
    use crate::http::MockHttpClient;
    use chaincache_codec::from_json_slice;

    fn config() -> RpcConfig {
        RpcConfig::new("http://daemon:18081/").with_max_requests_per_second(0)
    }

    #[test]
    fn json_request_uses_envelope_and_returns_result() {
        let client = RpcClient::new(
            config(),
            MockHttpClient::fixed(r#"{"id":"0","jsonrpc":"2.0","result":{"count":42,"status":"OK"}}"#),
        );
        let result = client
            .send_json_request("get_block_count", Value::empty_map())
            .unwrap();
        assert_eq!(result.get("count").and_then(Value::as_u64), Some(42));

        let sent = &client.client.requests()[0];
        assert_eq!(sent.url, "http://daemon:18081/json_rpc");
        let envelope = from_json_slice(&sent.body).unwrap();
        assert_eq!(envelope.get("jsonrpc"), Some(&Value::from("2.0")));
        assert_eq!(envelope.get("id"), Some(&Value::from("0")));
        assert_eq!(envelope.get("method"), Some(&Value::from("get_block_count")));
    }

    #[test]
    fn error_member_is_a_fault() {
        let client = RpcClient::new(
            config(),
            MockHttpClient::fixed(r#"{"error":{"code":-2,"message":"too big height"}}"#),
        );
        let err = client
            .send_json_request("get_block", Value::empty_map())
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, RpcError::Fault { code: -2, ref message } if message == "too big height"));
    }

    #[test]
    fn missing_result_is_a_protocol_error() {
        let client = RpcClient::new(config(), MockHttpClient::fixed(r#"{"id":"0"}"#));
        assert!(matches!(
            client.send_json_request("x", Value::empty_map()),
            Err(RpcError::Protocol(_))
        ));
    }

    #[test]
    fn path_request_reparses_string_bodies() {
        let client = RpcClient::new(
            config(),
            MockHttpClient::fixed(r#""{\"txs\":[],\"status\":\"OK\"}""#),
        );
        let response = client
            .send_path_request("/get_transactions", Value::empty_map())
            .unwrap();
        assert_eq!(response.get("status"), Some(&Value::from("OK")));
        assert_eq!(
            client.client.requests()[0].url,
            "http://daemon:18081/get_transactions"
        );
    }

    #[test]
    fn path_request_fault() {
        let client = RpcClient::new(
            config(),
            MockHttpClient::fixed(r#"{"error":{"code":-1,"message":"bad"}}"#),
        );
        assert!(matches!(
            client.send_path_request("get_transactions", Value::empty_map()),
            Err(RpcError::Fault { code: -1, .. })
        ));
    }

    #[test]
    fn transport_failure_is_retryable_and_recorded() {
        let client = RpcClient::new(config(), MockHttpClient::new(|_| Err("refused".into())));
        let err = client
            .send_json_request("get_block_count", Value::empty_map())
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(client.last_error().as_deref(), Some("refused"));
    }

    #[test]
    fn closed_client_refuses_requests() {
        let client = RpcClient::new(config(), MockHttpClient::fixed("{}"));
        client.close();
        assert!(!client.is_connected());
        assert!(matches!(
            client.send_path_request("get_height", Value::empty_map()),
            Err(RpcError::NotConnected)
        ));
        assert_eq!(client.client.request_count(), 0);
    }

    #[test]
    fn credentials_ride_on_every_request() {
        let config = config().with_credentials(Credentials::new("rpc", "secret"));
        let client = RpcClient::new(config, MockHttpClient::fixed(r#"{"result":{}}"#));
        client.send_json_request("a", Value::empty_map()).unwrap();
        client.send_path_request("b", Value::empty_map()).unwrap();
        for request in client.client.requests() {
            assert_eq!(request.credentials, Some(Credentials::new("rpc", "secret")));
            assert_eq!(request.auth_mode, AuthMode::Challenge);
        }
    }

    #[test]
    fn malformed_body_is_a_codec_error() {
        let client = RpcClient::new(config(), MockHttpClient::fixed("<html>"));
        assert!(matches!(
            client.send_json_request("a", Value::empty_map()),
            Err(RpcError::Codec(_))
        ));
    }
}
