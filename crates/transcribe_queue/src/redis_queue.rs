use crate::error::KnownError;
use crate::job::{Job, JobResult, WhisperModel};
use crate::queue::JobQueue;
use async_trait::async_trait;
use redis::{Client, Commands, Connection};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

const WAITING_KEY: &str = "transcribe:waiting";
const ORDER_KEY: &str = "transcribe:order";

/// Durable queue backend. Jobs are serialized JSON under per-job keys;
/// FIFO order lives in a Redis list and LPOP makes the claim atomic
/// across any number of worker processes.
#[derive(Clone)]
pub struct RedisQueue {
	conn: Arc<Mutex<Connection>>,
}

impl RedisQueue {
	///
	/// # Errors
	/// Returns an error if the Redis connection cannot be established.
	pub fn new(redis_url: &str) -> Result<Self, KnownError> {
		let client = Client::open(redis_url)?;
		let conn = client.get_connection()?;

		Ok(Self {
			conn: Arc::new(Mutex::new(conn)),
		})
	}

	fn job_key(id: Uuid) -> String {
		format!("transcribe:job:{id}")
	}

	fn save_job(conn: &mut Connection, job: &Job) -> Result<(), KnownError> {
		let serialized = serde_json::to_string(job)?;
		let _: () = conn.set(Self::job_key(job.id), serialized)?;
		Ok(())
	}

	fn load_job(conn: &mut Connection, id: Uuid) -> Result<Option<Job>, KnownError> {
		let serialized: Option<String> = conn.get(Self::job_key(id))?;
		match serialized {
			Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
			None => Ok(None),
		}
	}

	fn parse_id(raw: &str) -> Result<Uuid, KnownError> {
		raw.parse::<Uuid>().map_err(|e| KnownError::Queue(format!("malformed job id {raw}: {e}")))
	}
}

#[async_trait]
impl JobQueue for RedisQueue {
	async fn submit(&self, url: &str, model: WhisperModel) -> Result<Uuid, KnownError> {
		if url.trim().is_empty() {
			return Err(KnownError::Validation("url is required".to_string()));
		}
		let job = Job::new(url.to_string(), model);
		let id = job.id;

		let mut conn = self.conn.lock().await;
		Self::save_job(&mut conn, &job)?;
		let _: () = conn.rpush(ORDER_KEY, id.to_string())?;
		let _: () = conn.rpush(WAITING_KEY, id.to_string())?;
		drop(conn);
		Ok(id)
	}

	async fn claim(&self) -> Result<Option<Job>, KnownError> {
		let mut conn = self.conn.lock().await;
		let popped: Option<String> = conn.lpop(WAITING_KEY, None)?;
		let Some(raw) = popped else {
			drop(conn);
			return Ok(None);
		};

		let id = Self::parse_id(&raw)?;
		let mut job = Self::load_job(&mut conn, id)?.ok_or_else(|| KnownError::Queue(format!("claimed job {id} has no record")))?;
		job.mark_active()?;
		Self::save_job(&mut conn, &job)?;
		drop(conn);
		Ok(Some(job))
	}

	async fn complete(&self, id: Uuid, result: JobResult) -> Result<(), KnownError> {
		let mut conn = self.conn.lock().await;
		let mut job = Self::load_job(&mut conn, id)?.ok_or_else(|| KnownError::Queue(format!("unknown job: {id}")))?;
		job.mark_completed(result)?;
		Self::save_job(&mut conn, &job)?;
		drop(conn);
		Ok(())
	}

	async fn fail(&self, id: Uuid, reason: String) -> Result<(), KnownError> {
		let mut conn = self.conn.lock().await;
		let mut job = Self::load_job(&mut conn, id)?.ok_or_else(|| KnownError::Queue(format!("unknown job: {id}")))?;
		job.mark_failed(reason)?;
		Self::save_job(&mut conn, &job)?;
		drop(conn);
		Ok(())
	}

	async fn append_log(&self, id: Uuid, line: String) -> Result<(), KnownError> {
		let mut conn = self.conn.lock().await;
		let mut job = Self::load_job(&mut conn, id)?.ok_or_else(|| KnownError::Queue(format!("unknown job: {id}")))?;
		job.append_log(line);
		Self::save_job(&mut conn, &job)?;
		drop(conn);
		Ok(())
	}

	async fn clean(&self) -> Result<usize, KnownError> {
		let mut conn = self.conn.lock().await;
		let ids: Vec<String> = conn.lrange(ORDER_KEY, 0, -1)?;

		let mut removed = 0;
		for raw in ids {
			let id = Self::parse_id(&raw)?;
			let Some(job) = Self::load_job(&mut conn, id)? else {
				continue;
			};
			if job.status.is_terminal() {
				let _: () = conn.del(Self::job_key(id))?;
				let _: () = conn.lrem(ORDER_KEY, 1, &raw)?;
				removed += 1;
			}
		}
		drop(conn);
		Ok(removed)
	}

	async fn list(&self) -> Result<Vec<Job>, KnownError> {
		let mut conn = self.conn.lock().await;
		let ids: Vec<String> = conn.lrange(ORDER_KEY, 0, -1)?;

		let mut jobs = Vec::with_capacity(ids.len());
		for raw in ids {
			let id = Self::parse_id(&raw)?;
			if let Some(job) = Self::load_job(&mut conn, id)? {
				jobs.push(job);
			}
		}
		drop(conn);
		Ok(jobs)
	}

	async fn get(&self, id: Uuid) -> Result<Option<Job>, KnownError> {
		let mut conn = self.conn.lock().await;
		let job = Self::load_job(&mut conn, id)?;
		drop(conn);
		Ok(job)
	}
}
