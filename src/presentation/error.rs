// HTTP error mapping
use crate::application::dashboard_store::StoreError;
use crate::domain::time_window::WindowError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Window(#[from] WindowError),
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Store(StoreError::InvalidGeometry { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_GEOMETRY")
            }
            ApiError::Store(StoreError::UnknownPolygon(_)) => (StatusCode::NOT_FOUND, "UNKNOWN_POLYGON"),
            ApiError::Store(StoreError::UnknownDataSource(_)) => {
                (StatusCode::NOT_FOUND, "UNKNOWN_DATA_SOURCE")
            }
            ApiError::Window(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_TIME_WINDOW"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        tracing::debug!("Request failed with {}: {}", status, self);
        let body = ErrorBody {
            code,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
