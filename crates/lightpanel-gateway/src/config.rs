//! Gateway configuration types.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the web settings server.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    #[serde(default = "GatewayConfig::default_listen_addr")]
    pub listen_addr: String,

    /// Maximum request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    #[serde(default = "GatewayConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Delay before answering a failed login, in milliseconds.
    #[serde(default = "GatewayConfig::default_login_failure_delay")]
    pub login_failure_delay_ms: u64,

    /// Name of the session cookie.
    #[serde(default = "GatewayConfig::default_cookie_name")]
    pub cookie_name: String,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8080".to_string()
    }

    const fn default_max_body() -> usize {
        64 * 1024
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    const fn default_login_failure_delay() -> u64 {
        1000
    }

    fn default_cookie_name() -> String {
        "session".to_string()
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Get the failed-login delay as a `Duration`.
    #[must_use]
    pub fn login_failure_delay(&self) -> Duration {
        Duration::from_millis(self.login_failure_delay_ms)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
            login_failure_delay_ms: Self::default_login_failure_delay(),
            cookie_name: Self::default_cookie_name(),
        }
    }
}
