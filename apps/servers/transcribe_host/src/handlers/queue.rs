use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use transcribe_queue::job::{Job, JobResult, LogEntry};
use transcribe_queue::JobStatus;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
	#[serde(default)]
	pub url: String,
	pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
	pub id: Uuid,
}

pub async fn enqueue(State(state): State<AppState>, Json(req): Json<EnqueueRequest>) -> Result<(StatusCode, Json<EnqueueResponse>), ApiError> {
	let model = state.pipeline.resolve_model(req.model.as_deref());
	let id = state.queue.submit(&req.url, model).await?;
	Ok((StatusCode::ACCEPTED, Json(EnqueueResponse { id })))
}

#[derive(Debug, Serialize)]
pub struct JobData {
	pub url: String,
	pub model: String,
}

/// Wire shape existing clients consume: `data`, `returnvalue`,
/// `failedReason` mirror the original queue API.
#[derive(Debug, Serialize)]
pub struct JobView {
	pub id: Uuid,
	pub status: JobStatus,
	pub data: JobData,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub returnvalue: Option<JobResult>,
	#[serde(rename = "failedReason", skip_serializing_if = "Option::is_none")]
	pub failed_reason: Option<String>,
	pub log: Vec<LogEntry>,
}

impl From<Job> for JobView {
	fn from(job: Job) -> Self {
		Self {
			id: job.id,
			status: job.status,
			data: JobData {
				url: job.url,
				model: job.model.to_string(),
			},
			returnvalue: job.result,
			failed_reason: job.failed_reason,
			log: job.log,
		}
	}
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<JobView>>, ApiError> {
	let jobs = state.queue.list().await?;
	Ok(Json(jobs.into_iter().map(JobView::from).collect()))
}

#[derive(Debug, Serialize)]
pub struct CleanResponse {
	pub message: String,
}

pub async fn clean(State(state): State<AppState>) -> Result<Json<CleanResponse>, ApiError> {
	let removed = state.queue.clean().await?;
	Ok(Json(CleanResponse {
		message: format!("Removed {removed} completed/failed jobs"),
	}))
}
