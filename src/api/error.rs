use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::query_engine::SearchError;

use super::models::ErrorResponse;

const INVALID_REQUEST: &str = "Invalid request";
const SEARCH_FAILED: &str = "Search failed";
const SEARCH_FAILED_MESSAGE: &str = "Something went wrong while searching. Please try again.";

impl SearchError {
    fn status_code(&self) -> StatusCode {
        match self {
            SearchError::Validation(_) => StatusCode::BAD_REQUEST,
            SearchError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            SearchError::Validation(detail) => ErrorResponse {
                success: false,
                error: INVALID_REQUEST.to_string(),
                message: Some(detail),
            },
            // Catalog detail is logged by the engine and never sent out.
            SearchError::Catalog(_) => ErrorResponse {
                success: false,
                error: SEARCH_FAILED.to_string(),
                message: Some(SEARCH_FAILED_MESSAGE.to_string()),
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for SearchError {
    fn from(rejection: JsonRejection) -> Self {
        SearchError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for SearchError {
    fn from(rejection: QueryRejection) -> Self {
        SearchError::Validation(rejection.body_text())
    }
}
