//! API error type and HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use measurement_session::SessionError;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidConfiguration(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Capture buffer is empty")]
    EmptyCaptureBuffer,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidConfiguration(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict(_) | ApiError::EmptyCaptureBuffer => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidConfiguration(_) => {
                ApiError::InvalidConfiguration(err.to_string())
            }
            SessionError::DuplicateMeasurement { .. } => ApiError::Conflict(err.to_string()),
            SessionError::MeasurementNotFound(_) | SessionError::SavedSessionNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        debug!("Request rejected ({}): {}", status, self);
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
