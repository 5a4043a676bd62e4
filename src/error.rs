use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/// JSON error body shared by every failing REST response. `message` is the
/// client-facing summary; `error` carries the underlying cause when one
/// exists (parse rejection text, RPC status message).
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub status: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            status: i64::from(status.as_u16()),
            error: None,
        }
    }
}

/// Gateway-level request failures.
///
/// Business failures reported by a backend (RPC succeeded, `success=false`)
/// are not represented here; handlers map those straight to the status code
/// and payload the backend specified.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{message}")]
    BadRequest {
        message: String,
        detail: Option<String>,
    },
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("{message}")]
    Internal {
        message: String,
        detail: Option<String>,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            detail: None,
        }
    }

    pub fn internal(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> Option<&str> {
        match self {
            ApiError::BadRequest { detail, .. } | ApiError::Internal { detail, .. } => {
                detail.as_deref()
            }
            _ => None,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest {
            message: "invalid JSON payload".into(),
            detail: Some(rejection.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, detail = ?self.detail(), "request failed");
        }
        let body = ErrorResponse {
            error: self.detail().map(str::to_string),
            ..ErrorResponse::new(status, self.to_string())
        };
        (status, Json(body)).into_response()
    }
}

/// Map a backend-supplied numeric status to an HTTP status, falling back
/// when the value is not a usable HTTP code.
pub fn http_status(code: i64, fallback: StatusCode) -> StatusCode {
    u16::try_from(code)
        .ok()
        .and_then(|c| StatusCode::from_u16(c).ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.expect("body").to_bytes();
        serde_json::from_slice(&body).expect("json")
    }

    #[tokio::test]
    async fn detail_is_relayed_in_the_error_field() {
        let response =
            ApiError::internal("backend call failed", "connection refused").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "backend call failed");
        assert_eq!(json["status"], 500);
        assert_eq!(json["error"], "connection refused");
    }

    #[tokio::test]
    async fn error_field_is_omitted_without_detail() {
        let response = ApiError::bad_request("missing required fields: email").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["message"], "missing required fields: email");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn http_status_accepts_valid_codes() {
        assert_eq!(http_status(201, StatusCode::OK), StatusCode::CREATED);
        assert_eq!(http_status(409, StatusCode::OK), StatusCode::CONFLICT);
    }

    #[test]
    fn http_status_falls_back_on_garbage() {
        assert_eq!(http_status(0, StatusCode::OK), StatusCode::OK);
        assert_eq!(http_status(-1, StatusCode::BAD_REQUEST), StatusCode::BAD_REQUEST);
        assert_eq!(http_status(99999, StatusCode::OK), StatusCode::OK);
    }
}
