use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
	#[serde(default)]
	pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
	pub filename: String,
}

/// Synchronous variant: runs the download stage inline and answers with
/// the produced audio filename.
pub async fn convert(State(state): State<AppState>, Json(req): Json<ConvertRequest>) -> Result<Json<ConvertResponse>, ApiError> {
	let outcome = state.pipeline.fetch_title_and_download(&req.url).await?;
	Ok(Json(ConvertResponse {
		filename: outcome.audio_filename,
	}))
}
