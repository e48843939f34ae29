//! `GET /download/{filename}`: serves a published file as an attachment.

use axum::{
    body::Body,
    extract::{rejection::PathRejection, Path, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::path::Path as FsPath;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, warn};

use super::FailureBody;
use crate::state::AppState;

pub async fn download(
    State(state): State<Arc<AppState>>,
    filename: Result<Path<String>, PathRejection>,
    request: Request,
) -> Response {
    let filename = match filename {
        Ok(Path(filename)) => filename,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Download path rejected");
            return FailureBody::new(rejection.body_text()).into_response();
        }
    };

    let path = match state.workspace().resolve_download(&filename).await {
        Ok(path) => path,
        Err(e) => {
            warn!(file = %filename, error = %e, "Download rejected");
            return FailureBody::new(e.to_string()).into_response();
        }
    };

    let mut response = serve_file(&path, request).await;
    if response.status() == StatusCode::NOT_FOUND {
        // Evicted between lookup and open
        return FailureBody::new(format!("file not found: {}", filename)).into_response();
    }

    match HeaderValue::from_str(&content_disposition(&filename)) {
        Ok(value) => {
            response
                .headers_mut()
                .insert(header::CONTENT_DISPOSITION, value);
        }
        Err(e) => warn!(file = %filename, error = %e, "Unrepresentable download name"),
    }

    debug!(file = %filename, status = %response.status(), "Serving download");
    response
}

/// Streams a file, guessing its content type from the extension.
pub(crate) async fn serve_file(path: &FsPath, request: Request) -> Response {
    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}

/// `Content-Disposition` value for an attachment.
///
/// Non-ASCII names get an RFC 5987 `filename*` next to an ASCII fallback.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    if fallback == filename {
        format!("attachment; filename=\"{}\"", filename)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            urlencoding::encode(filename)
        )
    }
}
