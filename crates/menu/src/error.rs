//! Menu error types.

use thiserror::Error;

/// The single failure type returned by menu operations.
#[derive(Debug, Error)]
pub enum MenuError {
    /// The caller passed an unusable date or meal name.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The shared browser could not be launched or gave no usable context.
    #[error("browser session unavailable: {0}")]
    SessionLaunch(String),

    /// The date has no period with the requested name.
    #[error("no period named {meal:?} on {date}{}", available_suffix(.available))]
    PeriodNotFound {
        date: String,
        meal: String,
        available: Vec<String>,
    },

    /// Network error, timeout or non-success status from the upstream API.
    #[error("upstream request failed: {0}")]
    UpstreamTransport(String),

    /// The upstream answered with data that does not have the expected shape.
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
}

impl MenuError {
    /// Only transport failures are worth another attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamTransport(_))
    }

    /// Short, stable name for logs and metrics labels.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::SessionLaunch(_) => "session_launch",
            Self::PeriodNotFound { .. } => "period_not_found",
            Self::UpstreamTransport(_) => "upstream_transport",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }
}

fn available_suffix(available: &[String]) -> String {
    if available.is_empty() {
        " (no periods served that day)".to_string()
    } else {
        format!(" (available: {})", available.join(", "))
    }
}
