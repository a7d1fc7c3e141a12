use crate::error::KnownError;
use crate::job::{Job, JobResult};
use crate::pipeline::Pipeline;
use crate::queue::JobQueue;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

const TEXT_PREVIEW_LEN: usize = 100;

/// Claims one job at a time and drives it through the pipeline stages
/// in order. Several workers may run against the same queue; each holds
/// at most one claim and never overlaps external-process invocations.
pub struct Worker {
	id: usize,
	queue: Arc<dyn JobQueue>,
	pipeline: Arc<Pipeline>,
	poll_interval: Duration,
	shutdown: CancellationToken,
}

impl Worker {
	#[must_use]
	pub fn new(id: usize, queue: Arc<dyn JobQueue>, pipeline: Arc<Pipeline>, poll_interval: Duration, shutdown: CancellationToken) -> Self {
		Self {
			id,
			queue,
			pipeline,
			poll_interval,
			shutdown,
		}
	}

	pub async fn run(&self) -> Result<(), KnownError> {
		info!(worker = self.id, "worker started");

		loop {
			let claimed = tokio::select! {
				() = self.shutdown.cancelled() => break,
				claimed = self.queue.claim() => claimed?,
			};

			match claimed {
				Some(job) => self.process(job).await?,
				None => {
					// Small delay to prevent tight polling
					tokio::select! {
						() = self.shutdown.cancelled() => break,
						() = sleep(self.poll_interval) => {}
					}
				}
			}
		}

		info!(worker = self.id, "worker stopped");
		Ok(())
	}

	/// Run both stages for one claimed job. Stage failures are attached
	/// to the job and finalize it as `failed`; they never escape the
	/// worker. Errors returned here are queue-infrastructure errors only.
	async fn process(&self, job: Job) -> Result<(), KnownError> {
		let id = job.id;
		info!(worker = self.id, job_id = %id, url = %job.url, "processing job");
		self.queue.append_log(id, format!("Processing URL: {} with model: {}", job.url, job.model)).await?;

		self.queue.append_log(id, "Fetching title and downloading audio...".to_string()).await?;
		let download = match self.pipeline.fetch_title_and_download(&job.url).await {
			Ok(outcome) => outcome,
			Err(e) => return self.finalize_failed(id, &e).await,
		};
		self.queue.append_log(id, format!("Downloaded {}", download.audio_filename)).await?;

		self.queue.append_log(id, format!("Transcribing with model {}...", job.model)).await?;
		let transcription = match self.pipeline.transcribe(&download.audio_filename, job.model).await {
			Ok(outcome) => outcome,
			Err(e) => return self.finalize_failed(id, &e).await,
		};

		let result = JobResult {
			filename: transcription.transcript_filename,
			text_preview: transcription.text.chars().take(TEXT_PREVIEW_LEN).collect(),
			audio_filename: download.audio_filename,
		};

		self.queue.append_log(id, "Done!".to_string()).await?;
		self.queue.complete(id, result).await?;
		info!(worker = self.id, job_id = %id, "job completed");
		Ok(())
	}

	async fn finalize_failed(&self, id: Uuid, err: &KnownError) -> Result<(), KnownError> {
		error!(worker = self.id, job_id = %id, error = %err, "job failed");
		self.queue.append_log(id, format!("Error: {err}")).await?;
		self.queue.fail(id, err.to_string()).await
	}
}
