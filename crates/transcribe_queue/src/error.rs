use thiserror::Error;

/// Pipeline stage that produced a failure, used to keep the
/// human-readable message stable across the worker and HTTP layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
	TitleFetch,
	Download,
	Transcription,
}

impl Stage {
	#[must_use]
	pub const fn message(self) -> &'static str {
		match self {
			Self::TitleFetch => "title fetch failed",
			Self::Download => "download failed",
			Self::Transcription => "transcription failed",
		}
	}
}

#[derive(Error, Debug)]
pub enum KnownError {
	#[error("{}: {detail}", .stage.message())]
	StageFailure { stage: Stage, detail: String },
	#[error("{0}")]
	Validation(String),
	#[error("{0}")]
	NotFound(String),
	#[error("Queue error: {0}")]
	Queue(String),
	#[error("Redis error: {0}")]
	Redis(#[from] redis::RedisError),
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Internal error: {0}")]
	Internal(String),
}
