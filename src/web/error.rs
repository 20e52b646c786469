use crate::domain::scoring::ScoringError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// API error envelope: `{"status": "fail" | "error", "message": ...}`.
/// "fail" marks client-correctable 4xx conditions, "error" everything else.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Too many requests. Please try again later.")]
    TooManyRequests,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
}

impl ApiError {
    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{what} not found"))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 5xx details go to the log, never to the client.
        let message = if let ApiError::Internal(err) = &self {
            tracing::error!("internal error: {err:#}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            status: if status.is_client_error() { "fail" } else { "error" },
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<ScoringError> for ApiError {
    fn from(err: ScoringError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::QuestionType;

    #[test]
    fn scoring_errors_map_to_bad_request() {
        let err: ApiError = ScoringError::InvalidOptionValue {
            value: "maybe".into(),
            question_type: QuestionType::YesNo,
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("'maybe'"));
    }

    #[test]
    fn status_buckets() {
        assert_eq!(
            ApiError::not_found("Report").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("dup".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
