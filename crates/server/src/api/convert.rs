//! `POST /convert`: runs one conversion within the request.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

use vid2audio_core::pipeline::{
    is_valid_task_id, new_task_id, ConversionOutcome, ConversionRequest, PipelineError,
};

use super::FailureBody;
use crate::state::AppState;

/// Request body. Field names follow the browser page.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertBody {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    /// Integer or numeric string.
    #[serde(default, deserialize_with = "number_or_string")]
    pub quality: Option<i64>,
    #[serde(default)]
    pub video_file_name: Option<String>,
    #[serde(default)]
    pub audio_file_name: Option<String>,
    /// Lets the client poll `/progress/{taskId}` while this request runs.
    #[serde(default)]
    pub task_id: Option<String>,
}

impl ConvertBody {
    pub fn into_request(self) -> ConversionRequest {
        let mut request = ConversionRequest::new(self.url.unwrap_or_default());
        if let Some(format) = self.format {
            request = request.with_format(format);
        }
        if let Some(quality) = self.quality {
            request = request.with_quality(quality);
        }
        if let Some(name) = self.video_file_name {
            request = request.with_video_base_name(name);
        }
        if let Some(name) = self.audio_file_name {
            request = request.with_audio_base_name(name);
        }
        request
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Int(i64),
    Float(f64),
    Text(String),
}

fn number_or_string<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Int(n)) => Ok(Some(n)),
        Some(NumberOrString::Float(f)) if f.is_finite() => Ok(Some(f.trunc() as i64)),
        Some(NumberOrString::Float(f)) => Err(de::Error::custom(format!("invalid quality: {}", f))),
        Some(NumberOrString::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid quality: {:?}", s))),
    }
}

/// Successful conversion response.
#[derive(Debug, Serialize)]
pub struct ConvertSuccess {
    pub success: bool,
    pub video_url: String,
    pub audio_url: String,
    pub video_ext: String,
}

impl From<&ConversionOutcome> for ConvertSuccess {
    fn from(outcome: &ConversionOutcome) -> Self {
        Self {
            success: true,
            video_url: outcome.video_url(),
            audio_url: outcome.audio_url(),
            video_ext: outcome.video_ext.clone(),
        }
    }
}

pub async fn convert(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConvertBody>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            let err = PipelineError::UnexpectedFailure(rejection.body_text());
            warn!(error = %err, "Rejected convert request body");
            return FailureBody::new(err.to_string()).into_response();
        }
    };

    let task_id = match body.task_id.as_deref() {
        Some(id) if is_valid_task_id(id) => id.to_string(),
        Some(id) => {
            warn!(task_id = id, "Ignoring malformed client task id");
            new_task_id()
        }
        None => new_task_id(),
    };

    // Detached so a dropped connection does not abandon the tools mid-run
    let pipeline = Arc::clone(state.pipeline());
    let request = body.into_request();
    let result = tokio::spawn(async move { pipeline.run(&task_id, request).await }).await;

    match result {
        Ok(Ok(outcome)) => Json(ConvertSuccess::from(&outcome)).into_response(),
        Ok(Err(e)) => FailureBody::new(e.to_string()).into_response(),
        Err(e) => {
            error!(error = %e, "Conversion task panicked");
            FailureBody::new(PipelineError::UnexpectedFailure(e.to_string()).to_string())
                .into_response()
        }
    }
}
