use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Trigger of a task that does not resolve.
    #[error("{0}")]
    UnprocessableTask(String),

    /// Status query of a task that does not resolve.
    #[error("{0}")]
    TaskNotFound(String),

    #[error("{0}")]
    Busy(String),

    #[error("Invalid authentication credentials")]
    Unauthorized,

    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(feature = "http")]
mod http_impl {
    use axum::{
        Json,
        http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
        response::{IntoResponse, Response},
    };
    use tracing::warn;

    use super::ApiError;

    impl ApiError {
        pub fn status_code(&self) -> StatusCode {
            match self {
                ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                ApiError::UnprocessableTask(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::TaskNotFound(_) => StatusCode::NOT_FOUND,
                ApiError::Busy(_) => StatusCode::TOO_MANY_REQUESTS,
                ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
                ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }

    impl IntoResponse for ApiError {
        fn into_response(self) -> Response {
            let status = self.status_code();
            if status.is_server_error() {
                warn!(target: "sdci.api.http", error = %self, "request failed");
            }

            let body = Json(serde_json::json!({ "detail": self.to_string() }));
            let mut response = (status, body).into_response();
            if matches!(self, ApiError::Unauthorized) {
                response
                    .headers_mut()
                    .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            response
        }
    }
}
