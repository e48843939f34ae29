use axum::{
    extract::{rejection::PathRejection, Path, Request, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use vid2audio_core::ProgressRecord;

use super::download::serve_file;
use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

/// Page served when the static directory has no `index.html`.
const FALLBACK_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>vid2audio</title></head>
<body>
<h1>Video to audio</h1>
<form id="f">
  <input name="url" placeholder="Video URL" size="60" required>
  <select name="format">
    <option>mp3</option><option>wav</option><option>m4a</option><option>flac</option>
  </select>
  <input name="quality" type="number" min="0" max="8" value="4">
  <button>Convert</button>
</form>
<p id="status"></p>
<p id="links"></p>
<script>
document.getElementById('f').onsubmit = async (ev) => {
  ev.preventDefault();
  const data = Object.fromEntries(new FormData(ev.target));
  data.taskId = crypto.randomUUID();
  const status = document.getElementById('status');
  const timer = setInterval(async () => {
    const p = await (await fetch('/progress/' + data.taskId)).json();
    status.textContent = p.percent + '% ' + p.message;
  }, 1000);
  const res = await (await fetch('/convert', {
    method: 'POST',
    headers: {'Content-Type': 'application/json'},
    body: JSON.stringify(data),
  })).json();
  clearInterval(timer);
  document.getElementById('links').innerHTML = res.success
    ? '<a href="' + res.video_url + '">video</a> <a href="' + res.audio_url + '">audio</a>'
    : '';
  status.textContent = res.success ? 'done' : res.error;
};
</script>
</body>
</html>
"#;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Page shell from the static directory, or the built-in page.
pub async fn index(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let index = state.static_dir().join("index.html");
    let exists = tokio::fs::metadata(&index)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false);

    if exists {
        serve_file(&index, request).await
    } else {
        Html(FALLBACK_PAGE).into_response()
    }
}

/// Current progress of a task; unknown or undecodable ids read as "preparing".
pub async fn progress(
    State(state): State<Arc<AppState>>,
    task_id: Result<Path<String>, PathRejection>,
) -> Json<ProgressRecord> {
    match task_id {
        Ok(Path(task_id)) => Json(state.progress().get(&task_id).await),
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "Progress path rejected");
            Json(ProgressRecord::default())
        }
    }
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
