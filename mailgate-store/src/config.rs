//! Configuration for the backing database.

use serde::{Deserialize, Serialize};

const fn default_max_connections() -> u32 {
    5
}

const fn default_connect_timeout() -> u64 {
    10
}

/// Connection settings for the Postgres store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Postgres connection string.
    pub url: String,
    /// Size cap on the shared connection pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Upper bound on acquiring a connection, in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}
