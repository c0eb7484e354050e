//! Configuration loading from the process environment.
//!
//! Every variable is optional. A value that is missing, empty or fails to
//! parse leaves the default in place; nothing here ever reports an error.

use std::str::FromStr;

use crate::config::schema::ServerConfig;

pub const ENV_PORT: &str = "PORT";
pub const ENV_READ_TIMEOUT: &str = "READ_TIMEOUT";
pub const ENV_WRITE_TIMEOUT: &str = "WRITE_TIMEOUT";
pub const ENV_IDLE_TIMEOUT: &str = "IDLE_TIMEOUT";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration using an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        override_parsed(&lookup, ENV_PORT, &mut config.port);
        override_parsed(&lookup, ENV_READ_TIMEOUT, &mut config.read_timeout);
        override_parsed(&lookup, ENV_WRITE_TIMEOUT, &mut config.write_timeout);
        override_parsed(&lookup, ENV_IDLE_TIMEOUT, &mut config.idle_timeout);

        if let Some(level) = non_empty(&lookup, ENV_LOG_LEVEL) {
            config.log_level = level;
        }

        config
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.is_empty())
}

/// Replace `slot` with the parsed value of `key`, if it parses.
fn override_parsed<F, T>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = non_empty(lookup, key) else {
        return;
    };

    match raw.parse() {
        Ok(value) => *slot = value,
        Err(_) => {
            tracing::debug!(key, value = %raw, "Ignoring unparsable configuration value");
        }
    }
}
