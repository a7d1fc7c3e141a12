use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
	#[serde(default)]
	pub filename: String,
	pub model: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeResponse {
	pub text: String,
	pub transcription_file: String,
}

/// Synchronous variant: transcribe an already-downloaded audio file.
pub async fn transcribe(State(state): State<AppState>, Json(req): Json<TranscribeRequest>) -> Result<Json<TranscribeResponse>, ApiError> {
	if req.filename.trim().is_empty() {
		return Err(ApiError::Validation("filename is required".to_string()));
	}

	let model = state.pipeline.resolve_model(req.model.as_deref());
	let outcome = state.pipeline.transcribe(&req.filename, model).await?;

	Ok(Json(TranscribeResponse {
		text: outcome.text,
		transcription_file: outcome.transcript_filename,
	}))
}
