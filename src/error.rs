// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

/// Failure body returned by every endpoint.
///
/// `code` is a negative integer that is only unique within one endpoint;
/// clients should branch on the HTTP status first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: i32,
    pub text: String,
}

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(ErrorBody),

    // 401 Unauthorized
    Unauthorized(ErrorBody),

    // 403 Forbidden
    Forbidden(ErrorBody),

    // 404 Not Found
    NotFound(ErrorBody),

    // 500 Internal Server Error
    InternalServerError(ErrorBody),

    // 503 Service Unavailable
    ServiceUnavailable(ErrorBody),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn body(&self) -> &ErrorBody {
        match self {
            ApiError::BadRequest(body)
            | ApiError::Unauthorized(body)
            | ApiError::Forbidden(body)
            | ApiError::NotFound(body)
            | ApiError::InternalServerError(body)
            | ApiError::ServiceUnavailable(body) => body,
        }
    }

    /// Endpoint-local error code
    pub fn code(&self) -> i32 {
        self.body().code
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        &self.body().text
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(code: i32, text: impl Into<String>) -> Self {
        ApiError::BadRequest(ErrorBody { code, text: text.into() })
    }

    pub fn unauthorized(code: i32, text: impl Into<String>) -> Self {
        ApiError::Unauthorized(ErrorBody { code, text: text.into() })
    }

    pub fn forbidden(code: i32, text: impl Into<String>) -> Self {
        ApiError::Forbidden(ErrorBody { code, text: text.into() })
    }

    pub fn not_found(code: i32, text: impl Into<String>) -> Self {
        ApiError::NotFound(ErrorBody { code, text: text.into() })
    }

    pub fn internal_server_error(code: i32, text: impl Into<String>) -> Self {
        ApiError::InternalServerError(ErrorBody { code, text: text.into() })
    }

    pub fn service_unavailable(code: i32, text: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(ErrorBody { code, text: text.into() })
    }

    /// Log a storage failure and hide its details behind a 500.
    pub fn storage(code: i32, text: impl Into<String>, err: impl std::fmt::Display) -> Self {
        let text = text.into();
        tracing::error!("{}: {}", text, err);
        ApiError::internal_server_error(code, text)
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message(), self.code())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = match self {
            ApiError::BadRequest(body)
            | ApiError::Unauthorized(body)
            | ApiError::Forbidden(body)
            | ApiError::NotFound(body)
            | ApiError::InternalServerError(body)
            | ApiError::ServiceUnavailable(body) => body,
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn renders_code_and_text() {
        let response = ApiError::forbidden(-2, "Not allowed to view this container.").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.code, -2);
        assert_eq!(body.text, "Not allowed to view this container.");
    }

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::unauthorized(-1, "x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::not_found(-1, "x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::storage(-3, "Unable to delete", "connection reset").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
