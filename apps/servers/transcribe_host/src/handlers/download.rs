use crate::error::ApiError;
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Response};
use tokio_util::io::ReaderStream;

/// Stream a transcript as an attachment. The filename is a single path
/// segment; anything that tries to escape the transcript store is
/// treated as absent.
pub async fn download(State(state): State<AppState>, Path(filename): Path<String>) -> Result<Response<Body>, ApiError> {
	if filename.contains(['/', '\\']) || filename.contains("..") {
		return Err(ApiError::NotFound("file not found".to_string()));
	}

	let path = state.config.transcript_dir.join(&filename);
	let file = tokio::fs::File::open(&path).await.map_err(|_| ApiError::NotFound("file not found".to_string()))?;

	let response = Response::builder()
		.header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
		.header(header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\""))
		.body(Body::from_stream(ReaderStream::new(file)))?;
	Ok(response)
}
