use crate::upstream::UpstreamError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Failure of one proxy request.
///
/// Client errors (400) are kept apart from upstream failures (502) so callers
/// can tell a bad request from TMDB being unavailable.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Action is required")]
    MissingAction,

    #[error("Invalid action")]
    InvalidAction(String),

    #[error("missing or invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::MissingAction
            | ProxyError::InvalidAction(_)
            | ProxyError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}
