use crate::error::KnownError;
use crate::job::{Job, JobResult, WhisperModel};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Contract every queue backend satisfies.
///
/// The queue is an owned component injected into workers and the HTTP
/// boundary, never a module-level singleton, so tests can spin up as
/// many independent queues as they like.
#[async_trait]
pub trait JobQueue: Send + Sync {
	/// Admit a new job at the FIFO tail in `waiting` state.
	/// Rejects an empty url with a validation error.
	async fn submit(&self, url: &str, model: WhisperModel) -> Result<Uuid, KnownError>;

	/// Atomically pop the head `waiting` job and mark it `active`.
	/// `None` means no work; callers poll rather than block forever.
	async fn claim(&self) -> Result<Option<Job>, KnownError>;

	/// `active -> completed` with the produced artifacts.
	async fn complete(&self, id: Uuid, result: JobResult) -> Result<(), KnownError>;

	/// `active -> failed` with the last error detail.
	async fn fail(&self, id: Uuid, reason: String) -> Result<(), KnownError>;

	/// Append a timestamped progress line to the job log.
	async fn append_log(&self, id: Uuid, line: String) -> Result<(), KnownError>;

	/// Remove all completed/failed jobs; waiting/active jobs and their
	/// positions are untouched. Returns how many were removed.
	async fn clean(&self) -> Result<usize, KnownError>;

	/// Snapshot of all jobs in admission order.
	async fn list(&self) -> Result<Vec<Job>, KnownError>;

	async fn get(&self, id: Uuid) -> Result<Option<Job>, KnownError>;
}

#[derive(Default)]
struct Inner {
	jobs: HashMap<Uuid, Job>,
	order: Vec<Uuid>,
	waiting: VecDeque<Uuid>,
}

impl Inner {
	fn job_mut(&mut self, id: Uuid) -> Result<&mut Job, KnownError> {
		self.jobs.get_mut(&id).ok_or_else(|| KnownError::Queue(format!("unknown job: {id}")))
	}
}

/// In-process queue used by tests and as a fallback when no Redis is
/// configured. A single mutex around the state makes `claim` exclusive.
#[derive(Default)]
pub struct MemoryQueue {
	inner: Mutex<Inner>,
}

impl MemoryQueue {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl JobQueue for MemoryQueue {
	async fn submit(&self, url: &str, model: WhisperModel) -> Result<Uuid, KnownError> {
		if url.trim().is_empty() {
			return Err(KnownError::Validation("url is required".to_string()));
		}
		let job = Job::new(url.to_string(), model);
		let id = job.id;

		let mut inner = self.inner.lock().await;
		inner.order.push(id);
		inner.waiting.push_back(id);
		inner.jobs.insert(id, job);
		Ok(id)
	}

	async fn claim(&self) -> Result<Option<Job>, KnownError> {
		let mut inner = self.inner.lock().await;
		let Some(id) = inner.waiting.pop_front() else {
			return Ok(None);
		};
		let job = inner.job_mut(id)?;
		job.mark_active()?;
		Ok(Some(job.clone()))
	}

	async fn complete(&self, id: Uuid, result: JobResult) -> Result<(), KnownError> {
		let mut inner = self.inner.lock().await;
		inner.job_mut(id)?.mark_completed(result)
	}

	async fn fail(&self, id: Uuid, reason: String) -> Result<(), KnownError> {
		let mut inner = self.inner.lock().await;
		inner.job_mut(id)?.mark_failed(reason)
	}

	async fn append_log(&self, id: Uuid, line: String) -> Result<(), KnownError> {
		let mut inner = self.inner.lock().await;
		inner.job_mut(id)?.append_log(line);
		Ok(())
	}

	async fn clean(&self) -> Result<usize, KnownError> {
		let mut guard = self.inner.lock().await;
		let inner = &mut *guard;
		let before = inner.jobs.len();
		inner.jobs.retain(|_, job| !job.status.is_terminal());
		let removed = before - inner.jobs.len();
		inner.order.retain(|id| inner.jobs.contains_key(id));
		Ok(removed)
	}

	async fn list(&self) -> Result<Vec<Job>, KnownError> {
		let inner = self.inner.lock().await;
		Ok(inner.order.iter().filter_map(|id| inner.jobs.get(id)).cloned().collect())
	}

	async fn get(&self, id: Uuid) -> Result<Option<Job>, KnownError> {
		let inner = self.inner.lock().await;
		Ok(inner.jobs.get(&id).cloned())
	}
}
