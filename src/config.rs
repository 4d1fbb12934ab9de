//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chat::history::CONTEXT_WINDOW_TURNS;

/// Environment variable overriding the backend base URL.
pub const BASE_URL_ENV: &str = "RAGDESK_BASE_URL";
/// Environment variable overriding the request timeout (seconds).
pub const TIMEOUT_ENV: &str = "RAGDESK_TIMEOUT_SECS";
/// Environment variable overriding the chat stream timeout (seconds).
pub const STREAM_TIMEOUT_ENV: &str = "RAGDESK_STREAM_TIMEOUT_SECS";

/// Default backend address.
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8002";

/// Configuration shared by the backend client and both controllers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL; endpoint paths are joined onto it.
    pub base_url: String,
    /// Timeout for request/response calls.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
    /// Timeout for a whole streamed chat answer.
    #[serde(with = "duration_serde")]
    pub stream_timeout: Duration,
    /// Number of recent turns sent as context.
    pub context_window_turns: usize,
    /// How long a status banner stays visible.
    #[serde(with = "duration_serde")]
    pub banner_timeout: Duration,
    /// How long the copy confirmation is shown.
    #[serde(with = "duration_serde")]
    pub copy_confirm: Duration,
    /// Maximum auto-grown input height in pixels.
    pub max_input_height: u32,
    /// Size of the pieces an upload body is streamed in (progress granularity).
    pub upload_chunk_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            stream_timeout: Duration::from_secs(300),
            context_window_turns: CONTEXT_WINDOW_TURNS,
            banner_timeout: Duration::from_secs(4),
            copy_confirm: Duration::from_secs(2),
            max_input_height: 120,
            upload_chunk_size: 64 * 1024, // 64 KiB
        }
    }
}

impl ClientConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by the `RAGDESK_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `RAGDESK_*` keys.
    ///
    /// Values that do not parse are ignored with a warning.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        if let Some(secs) = parse_secs(&lookup, TIMEOUT_ENV) {
            config.request_timeout = secs;
        }
        if let Some(secs) = parse_secs(&lookup, STREAM_TIMEOUT_ENV) {
            config.stream_timeout = secs;
        }

        config
    }

    /// Set the backend base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the number of context turns.
    #[must_use]
    pub const fn with_context_window(mut self, turns: usize) -> Self {
        self.context_window_turns = turns;
        self
    }

    /// Set the upload chunk size.
    #[must_use]
    pub const fn with_upload_chunk_size(mut self, size: usize) -> Self {
        self.upload_chunk_size = size;
        self
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            tracing::warn!("Ignoring invalid {key}={raw:?}, keeping default");
            None
        }
    }
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
