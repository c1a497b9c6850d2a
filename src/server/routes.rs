//! Request handlers for the upload endpoint and the health check.
//!
//! Validation failures map to 400, processing failures to 500. The handler
//! validates the upload before any pipeline stage runs; the raw pipeline
//! errors never cross the boundary beyond their rendered messages.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::warn;

use super::AppState;
use crate::error::ClassifyError;

/// Multipart field name carrying the audio clip
const UPLOAD_FIELD: &str = "file";

/// Liveness endpoint.
///
/// Never touches the inference lock: a classification in flight must not
/// stall health responses. Poisoning is observable without locking.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let healthy = !state.pipeline.is_poisoned();
    Json(json!({
        "healthy": healthy,
        "service": "emotion-classifier",
    }))
}

/// Classify an uploaded WAV clip
pub async fn classify(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    // Pull the audio part out of the multipart body
    let upload = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some(UPLOAD_FIELD) => {
                let filename = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => break Some((filename, bytes)),
                    Err(e) => {
                        return error_response(&ClassifyError::InvalidInput(format!(
                            "failed to read upload: {}",
                            e
                        )))
                    }
                }
            }
            Ok(Some(_)) => continue,
            Ok(None) => break None,
            Err(e) => {
                return error_response(&ClassifyError::InvalidInput(format!(
                    "malformed multipart body: {}",
                    e
                )))
            }
        }
    };

    let Some((filename, bytes)) = upload else {
        return error_response(&ClassifyError::InvalidInput(
            "no audio file received".to_string(),
        ));
    };

    if let Err(e) = validate_filename(&filename) {
        return error_response(&e);
    }

    // Inference is CPU-bound; keep it off the async executor. Requests
    // serialize on the pipeline lock.
    let pipeline = state.pipeline.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut pipeline = pipeline
            .lock()
            .map_err(|_| ClassifyError::InferenceError("classifier lock poisoned".to_string()))?;
        pipeline.classify_bytes(&bytes)
    })
    .await;

    match result {
        Ok(Ok(prediction)) => match serde_json::to_value(&prediction) {
            Ok(body) => (StatusCode::OK, Json(body)),
            Err(e) => error_response(&ClassifyError::InferenceError(format!(
                "failed to encode result: {}",
                e
            ))),
        },
        Ok(Err(e)) => error_response(&e),
        Err(e) => error_response(&ClassifyError::InferenceError(format!(
            "classification task failed: {}",
            e
        ))),
    }
}

/// Uploads must carry a non-empty filename with a .wav extension
fn validate_filename(filename: &str) -> Result<(), ClassifyError> {
    if filename.is_empty() {
        return Err(ClassifyError::InvalidInput(
            "empty upload filename".to_string(),
        ));
    }
    let allowed = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);
    if !allowed {
        return Err(ClassifyError::InvalidInput(
            "unsupported file type, only WAV is accepted".to_string(),
        ));
    }
    Ok(())
}

fn error_response(error: &ClassifyError) -> (StatusCode, Json<Value>) {
    let status = if error.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    warn!("Request rejected: {}", error);
    (status, Json(json!({ "error": error.to_string() })))
}
