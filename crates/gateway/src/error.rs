use {
    axum::{
        http::StatusCode,
        response::{IntoResponse, Json, Response},
    },
    dinehall_menu::MenuError,
    tracing::warn,
};

/// An error rendered as `{"error": message}` with a status derived from its
/// kind.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Status code for each menu failure kind.
pub fn status_for(err: &MenuError) -> StatusCode {
    match err {
        MenuError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        MenuError::PeriodNotFound { .. } => StatusCode::NOT_FOUND,
        MenuError::UpstreamTransport(_) | MenuError::MalformedResponse(_) => {
            StatusCode::BAD_GATEWAY
        },
        MenuError::SessionLaunch(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl From<MenuError> for ApiError {
    fn from(err: MenuError) -> Self {
        Self {
            status: status_for(&err),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(status = self.status.as_u16(), error = %self.message, "request failed");
        }
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}
