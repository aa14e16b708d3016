use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/// Every failure a handler can return. Converted into a JSON body by
/// [`IntoResponse`], which is the only place statuses are chosen.
#[derive(Debug)]
pub enum ApiError {
    Validation { field: String, message: String },
    NotFound(String),
    /// The body went past the configured request size limit.
    TooLarge(String),
    Server(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    message: String,
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// A request body that could not be read at all.
    pub fn malformed(cause: impl std::fmt::Display) -> Self {
        Self::validation("non_field_errors", cause.to_string())
    }

    /// A body rejected by axum. Only the size limit keeps its own status;
    /// everything else is a malformed body.
    pub fn rejected(status: StatusCode, cause: impl std::fmt::Display) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::TooLarge(cause.to_string())
        } else {
            Self::malformed(cause)
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation { field, message } => ErrorBody {
                error: "ValidationError",
                field: Some(field),
                message,
            },
            ApiError::NotFound(message) => ErrorBody {
                error: "NotFoundError",
                field: None,
                message,
            },
            ApiError::TooLarge(message) => ErrorBody {
                error: "PayloadTooLargeError",
                field: None,
                message,
            },
            ApiError::Server(detail) => {
                error!("Request failed: {}", detail);
                ErrorBody {
                    error: "ServerError",
                    field: None,
                    message: "Internal server error".to_string(),
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<nr_core::Error> for ApiError {
    fn from(err: nr_core::Error) -> Self {
        match err {
            nr_core::Error::Validation { field, message } => {
                ApiError::Validation { field, message }
            }
            nr_core::Error::NotFound(message) => ApiError::NotFound(message),
            other => ApiError::Server(other.to_string()),
        }
    }
}
