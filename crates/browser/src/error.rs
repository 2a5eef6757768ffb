//! Browser error types.

use thiserror::Error;

/// Errors that can occur while driving the shared browser.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser not available: {0}")]
    BrowserNotAvailable(String),

    #[error("browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("browser closed unexpectedly")]
    BrowserClosed,

    #[error("failed to open browsing context: {0}")]
    ContextFailed(String),

    #[error("in-page evaluation failed: {0}")]
    Evaluation(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("CDP error: {0}")]
    Cdp(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BrowserError {
    /// Whether the error means the browser process is gone rather than the
    /// single operation having failed.
    #[must_use]
    pub fn is_connection_lost(&self) -> bool {
        match self {
            Self::BrowserClosed => true,
            Self::Cdp(msg) | Self::ContextFailed(msg) => {
                msg.contains("AlreadyClosed") || msg.contains("ConnectionClosed")
            },
            _ => false,
        }
    }
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        BrowserError::Cdp(err.to_string())
    }
}
