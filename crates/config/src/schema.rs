//! Config schema types (upstream API, browser, server).

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DinehallConfig {
    pub upstream: UpstreamConfig,
    pub browser: BrowserConfig,
    pub server: ServerConfig,
}

/// Where the dining-service API lives and how hard to try reaching it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream API host. The only host the automated page may reach.
    pub host: String,
    /// URL scheme used for both endpoints.
    pub scheme: String,
    /// Dining location identifier. Required; there is no usable default.
    pub location_id: String,
    /// Timeout for each upstream call in milliseconds.
    pub request_timeout_ms: u64,
    /// Extra attempts after a transport failure (0 = no retry).
    pub retries: u32,
    /// Delay before the first retry; doubled for each further attempt.
    pub retry_backoff_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host: "apiv4.dineoncampus.com".into(),
            scheme: "https".into(),
            location_id: String::new(),
            request_timeout_ms: 15_000,
            retries: 0,
            retry_backoff_ms: 500,
        }
    }
}

/// Browser launch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Path to Chrome/Chromium binary (auto-detected if not set).
    pub chrome_path: Option<String>,
    /// Whether to run in headless mode.
    pub headless: bool,
    /// Browser launch timeout in milliseconds.
    pub launch_timeout_ms: u64,
    /// User agent string (uses the browser default if not set).
    pub user_agent: Option<String>,
    /// Additional Chrome arguments.
    pub chrome_args: Vec<String>,
    /// Pass flags that hide the automation markers from page scripts.
    pub stealth: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            launch_timeout_ms: 30_000,
            user_agent: None,
            chrome_args: Vec::new(),
            stealth: true,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 3001,
        }
    }
}
