//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hbnb_core::{HbnbError, InvalidField};
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Request failure, rendered as `{"error": "<message>"}`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not a JSON")]
    NotAJson,

    #[error("Missing {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    InvalidField(#[from] InvalidField),

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error")]
    Storage(#[source] HbnbError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotAJson | ApiError::MissingField(_) | ApiError::InvalidField(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<HbnbError> for ApiError {
    fn from(e: HbnbError) -> Self {
        match e {
            HbnbError::Conflict(message) => ApiError::Conflict(message),
            other => ApiError::Storage(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Storage(ref e) = self {
            tracing::error!("Storage failure: {}", e);
        }

        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}
