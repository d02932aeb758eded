use std::time::Duration;

use crate::feed::DEFAULT_FEED_LIMIT;
use crate::push::{PushConfig, DEFAULT_SOCKET_PATH};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings shared by the console and the one-shot commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub socket_path: String,
    pub feed_limit: usize,
    pub timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            socket_path: DEFAULT_SOCKET_PATH.to_string(),
            feed_limit: DEFAULT_FEED_LIMIT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Settings {
    /// Defaults overridden by `CHADDI_CONSOLE_BASE_URL`,
    /// `CHADDI_CONSOLE_SOCKET_PATH`, `CHADDI_CONSOLE_FEED_LIMIT` and
    /// `CHADDI_CONSOLE_TIMEOUT_MS`. Unparseable values fall back silently.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env_or("CHADDI_CONSOLE_BASE_URL", defaults.base_url),
            socket_path: env_or("CHADDI_CONSOLE_SOCKET_PATH", defaults.socket_path),
            feed_limit: env_or("CHADDI_CONSOLE_FEED_LIMIT", defaults.feed_limit).max(1),
            timeout: Duration::from_millis(env_or(
                "CHADDI_CONSOLE_TIMEOUT_MS",
                defaults.timeout.as_millis() as u64,
            )),
        }
    }

    pub fn push_config(&self) -> PushConfig {
        PushConfig::new(self.base_url.clone(), self.socket_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.base_url, "http://127.0.0.1:5000");
        assert_eq!(settings.socket_path, "/socket.io");
        assert_eq!(settings.feed_limit, 500);
        assert_eq!(settings.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_env_or_falls_back_when_unset() {
        assert_eq!(env_or("CHADDI_CONSOLE_TEST_UNSET_VARIABLE", 7usize), 7);
    }

    #[test]
    fn test_push_config_uses_socket_path() {
        let settings = Settings {
            socket_path: "/ws/socket.io".into(),
            ..Settings::default()
        };
        assert_eq!(settings.push_config().path, "/ws/socket.io");
        assert_eq!(settings.push_config().base_url, settings.base_url);
    }
}
