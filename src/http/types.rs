use http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::error::QueryError;

pub const NOT_FOUND_BODY: &str = "No task with ID found";

#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Plain-text 404, matching what clients of the task endpoints expect.
    pub fn not_found() -> Response { (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response() }

    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        tracing::error!(error = %e, "request failed");
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: e.to_string() }
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self { Self { status: StatusCode::BAD_REQUEST, message: e.to_string() } }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response { (self.status, axum::Json(self)).into_response() }
}
