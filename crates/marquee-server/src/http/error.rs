//! Mapping from `MarqueeError` to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use marquee_core::error::{ClientCode, MarqueeError};

/// Handler error; renders as `{ "error": ... }` with the mapped status.
#[derive(Debug)]
pub struct ApiError(pub MarqueeError);

impl From<MarqueeError> for ApiError {
    fn from(e: MarqueeError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        if code == ClientCode::Internal {
            tracing::error!(error = %self.0, "request failed");
        }
        let status =
            StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({ "error": self.0.public_message() }))).into_response()
    }
}
