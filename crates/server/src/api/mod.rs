pub mod convert;
pub mod download;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use routes::create_router;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Body of every failed request: `{"success": false, "error": "..."}`.
///
/// Failures are reported in the body with HTTP 200.
#[derive(Debug, Serialize)]
pub struct FailureBody {
    pub success: bool,
    pub error: String,
}

impl FailureBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

impl IntoResponse for FailureBody {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
