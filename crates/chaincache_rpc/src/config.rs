//! Configuration for daemon RPC connections.

use std::fmt;
use std::time::Duration;

/// Default daemon port.
pub const DEFAULT_PORT: u16 = 18081;

/// Default request rate limit.
pub const DEFAULT_MAX_REQUESTS_PER_SECOND: u32 = 50;

/// Username and password for the daemon's RPC login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login user.
    pub username: String,
    /// Login password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// When credentials are sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    /// Send the request bare and authenticate only after the server
    /// answers with an authentication challenge.
    #[default]
    Challenge,
    /// Send credentials with every request.
    Immediate,
}

/// Configuration for an [`RpcClient`](crate::RpcClient).
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Full endpoint URI. Overrides protocol, host and port when set.
    pub uri: Option<String>,
    /// URI scheme.
    pub protocol: String,
    /// Daemon host.
    pub host: String,
    /// Daemon port.
    pub port: u16,
    /// Login, if the daemon requires one.
    pub credentials: Option<Credentials>,
    /// When credentials are sent.
    pub auth_mode: AuthMode,
    /// Rate limit shared by every caller of one client. Zero disables it.
    pub max_requests_per_second: u32,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl RpcConfig {
    /// Creates a configuration for the given endpoint URI.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            ..Self::default()
        }
    }

    /// Sets the URI scheme.
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Sets the host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the login.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets when credentials are sent.
    pub fn with_auth_mode(mut self, mode: AuthMode) -> Self {
        self.auth_mode = mode;
        self
    }

    /// Sets the rate limit.
    pub fn with_max_requests_per_second(mut self, max: u32) -> Self {
        self.max_requests_per_second = max;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URI of the daemon, without a trailing slash.
    pub fn endpoint(&self) -> String {
        match &self.uri {
            Some(uri) => uri.trim_end_matches('/').to_string(),
            None => format!("{}://{}:{}", self.protocol, self.host, self.port),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            uri: None,
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            credentials: None,
            auth_mode: AuthMode::Challenge,
            max_requests_per_second: DEFAULT_MAX_REQUESTS_PER_SECOND,
            timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_daemon() {
        let config = RpcConfig::default();
        assert_eq!(config.endpoint(), "http://localhost:18081");
        assert_eq!(config.max_requests_per_second, 50);
        assert_eq!(config.auth_mode, AuthMode::Challenge);
    }

    #[test]
    fn builder_overrides_parts() {
        let config = RpcConfig::default()
            .with_protocol("https")
            .with_host("node.example.com")
            .with_port(443)
            .with_max_requests_per_second(0)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.endpoint(), "https://node.example.com:443");
        assert_eq!(config.max_requests_per_second, 0);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn uri_wins_and_loses_trailing_slashes() {
        let config = RpcConfig::new("http://10.0.0.2:38081//").with_port(1);
        assert_eq!(config.endpoint(), "http://10.0.0.2:38081");
    }

    #[test]
    fn password_is_not_logged() {
        let creds = Credentials::new("alice", "hunter2");
        let text = format!("{creds:?}");
        assert!(text.contains("alice"));
        assert!(!text.contains("hunter2"));
    }
}
