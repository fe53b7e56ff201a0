//! HTTP server configuration.

use serde::{Deserialize, Serialize};

fn default_listen_address() -> String {
    "[::]:8080".to_string()
}

const fn default_request_timeout() -> u64 {
    10
}

/// Settings for the HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Address to bind the server to.
    ///
    /// Common values:
    /// - `[::]:8080` (IPv6 any address, port 8080)
    /// - `0.0.0.0:8080` (IPv4 any address, port 8080)
    /// - `127.0.0.1:8080` (localhost only, port 8080)
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Upper bound on handling a single request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            request_timeout: default_request_timeout(),
        }
    }
}
