use crate::embedding::BatchError;
use crate::error::VidlensError;
use crate::rate_limit::RateLimitExceeded;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

/// API-layer error: a library error rendered as a status code and JSON body.
#[derive(Debug)]
pub struct ApiError(pub VidlensError);

impl From<VidlensError> for ApiError {
    fn from(err: VidlensError) -> Self {
        Self(err)
    }
}

impl From<RateLimitExceeded> for ApiError {
    fn from(err: RateLimitExceeded) -> Self {
        Self(VidlensError::RateLimited(err))
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorBody {
    error_type: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl ApiError {
    fn status(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            VidlensError::InvalidInput(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            VidlensError::VideoNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            VidlensError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded"),
            VidlensError::Batch(_) => (StatusCode::INTERNAL_SERVER_ERROR, "embedding_integrity"),
            VidlensError::TranscriptUnavailable(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "transcript_unavailable")
            }
            VidlensError::Embedding(_) => (StatusCode::INTERNAL_SERVER_ERROR, "embedding_error"),
            VidlensError::Generation(_) | VidlensError::Gemini(_) | VidlensError::OpenAI(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "generation_error")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    fn details(&self) -> Option<Value> {
        match &self.0 {
            VidlensError::RateLimited(e) => Some(json!({
                "scope": e.scope,
                "limit": e.limit,
                "retry_after_seconds": retry_after_seconds(e),
            })),
            VidlensError::Batch(BatchError::CountMismatch {
                expected,
                actual,
                first_preview,
                last_preview,
            }) => Some(json!({
                "expected": expected,
                "actual": actual,
                "first_item": first_preview,
                "last_item": last_preview,
            })),
            VidlensError::Batch(BatchError::EmptyVector { index }) => {
                Some(json!({ "index": index }))
            }
            _ => None,
        }
    }
}

fn retry_after_seconds(err: &RateLimitExceeded) -> u64 {
    // Round up so clients never retry a moment too early.
    let secs = err.retry_after.as_secs();
    if err.retry_after.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs.max(1)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status();
        if status.is_server_error() {
            tracing::error!(error_type, "Request failed: {}", self.0);
        }

        let retry_after = match &self.0 {
            VidlensError::RateLimited(e) => Some(retry_after_seconds(e)),
            _ => None,
        };

        let body = ErrorBody {
            error_type,
            message: self.0.to_string(),
            details: self.details(),
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::RateScope;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (VidlensError::InvalidInput("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (VidlensError::VideoNotFound("x".into()), StatusCode::NOT_FOUND),
            (
                VidlensError::Batch(BatchError::EmptyVector { index: 1 }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (VidlensError::Store("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_rate_limit_sets_retry_after() {
        let err = RateLimitExceeded {
            scope: RateScope::Minute,
            limit: 20,
            retry_after: Duration::from_millis(12_300),
        };
        let response = ApiError::from(err).into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "13");
    }

    #[test]
    fn test_integrity_details() {
        let err = ApiError(VidlensError::Batch(BatchError::CountMismatch {
            expected: 5,
            actual: 4,
            first_preview: "a".into(),
            last_preview: "e".into(),
        }));
        assert_eq!(err.status().1, "embedding_integrity");

        let details = err.details().unwrap();
        assert_eq!(details["expected"], 5);
        assert_eq!(details["actual"], 4);
    }
}
