//! Configuration schema definitions.
//!
//! The service has a single flat configuration record. It derives
//! `Serialize` so the effective configuration can be written to the startup
//! log. A zero timeout disables that timeout.

use std::net::SocketAddr;
use std::time::Duration;

use serde::Serialize;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 5667;

/// Default request read timeout in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 15;

/// Default response write timeout in seconds.
pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 15;

/// Default keep-alive idle timeout in seconds.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Root configuration for the server.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    /// TCP port to listen on (all interfaces).
    pub port: u16,

    /// Maximum time to read a request's headers (and, separately, its body), in seconds.
    pub read_timeout: u64,

    /// Maximum time from reading a request to writing its response, in seconds.
    pub write_timeout: u64,

    /// Idle keep-alive connection timeout, in seconds.
    pub idle_timeout: u64,

    /// Log level. Recorded and reported, but filtering is driven by `RUST_LOG`.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            read_timeout: DEFAULT_READ_TIMEOUT_SECS,
            write_timeout: DEFAULT_WRITE_TIMEOUT_SECS,
            idle_timeout: DEFAULT_IDLE_TIMEOUT_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ServerConfig {
    /// Address the listener binds to.
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout)
    }
}
