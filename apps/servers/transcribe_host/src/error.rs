use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use transcribe_queue::KnownError;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
	#[error("{0}")]
	Validation(String),

	#[error("{0}")]
	NotFound(String),

	#[error("{message}")]
	Stage { message: String, details: String },

	#[error("queue backend unavailable: {0}")]
	Queue(String),

	#[error("internal error: {0}")]
	Internal(String),
}

impl From<KnownError> for ApiError {
	fn from(err: KnownError) -> Self {
		match err {
			KnownError::Validation(msg) => Self::Validation(msg),
			KnownError::NotFound(msg) => Self::NotFound(msg),
			KnownError::StageFailure { stage, detail } => Self::Stage {
				message: stage.message().to_string(),
				details: detail,
			},
			KnownError::Queue(msg) => Self::Queue(msg),
			KnownError::Redis(e) => Self::Queue(e.to_string()),
			other => Self::Internal(other.to_string()),
		}
	}
}

impl From<axum::http::Error> for ApiError {
	fn from(err: axum::http::Error) -> Self {
		Self::Internal(err.to_string())
	}
}

impl ApiError {
	const fn status_code(&self) -> StatusCode {
		match self {
			Self::Validation(_) => StatusCode::BAD_REQUEST,
			Self::NotFound(_) => StatusCode::NOT_FOUND,
			Self::Stage { .. } | Self::Queue(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = self.status_code();
		if status.is_server_error() {
			tracing::error!(status = %status, error = %self, "request failed");
		}

		let body = match &self {
			Self::Stage { message, details } => json!({ "error": message, "details": details }),
			other => json!({ "error": other.to_string() }),
		};
		(status, Json(body)).into_response()
	}
}
