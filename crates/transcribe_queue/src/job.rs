use crate::error::KnownError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Whisper model sizes accepted by the transcription script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhisperModel {
	Tiny,
	Base,
	Small,
	Medium,
	Large,
}

impl WhisperModel {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Tiny => "tiny",
			Self::Base => "base",
			Self::Small => "small",
			Self::Medium => "medium",
			Self::Large => "large",
		}
	}

	/// Resolve a caller-supplied model name. Anything outside the allowed
	/// set (including absence) falls back to `default` rather than failing
	/// the request.
	#[must_use]
	pub fn resolve(requested: Option<&str>, default: Self) -> Self {
		requested.and_then(|raw| raw.parse().ok()).unwrap_or(default)
	}
}

impl FromStr for WhisperModel {
	type Err = KnownError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"tiny" => Ok(Self::Tiny),
			"base" => Ok(Self::Base),
			"small" => Ok(Self::Small),
			"medium" => Ok(Self::Medium),
			"large" => Ok(Self::Large),
			other => Err(KnownError::Validation(format!("unknown model: {other}"))),
		}
	}
}

impl fmt::Display for WhisperModel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
	Waiting,
	Active,
	Completed,
	Failed,
}

impl JobStatus {
	#[must_use]
	pub const fn is_terminal(self) -> bool {
		matches!(self, Self::Completed | Self::Failed)
	}
}

impl fmt::Display for JobStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Waiting => "waiting",
			Self::Active => "active",
			Self::Completed => "completed",
			Self::Failed => "failed",
		};
		f.write_str(name)
	}
}

/// One timestamped, append-only progress line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
	pub at: DateTime<Utc>,
	pub line: String,
}

/// Artifacts of a completed job. Field names follow the wire shape
/// clients already consume (`returnvalue.filename`, `textPreview`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
	pub filename: String,
	pub text_preview: String,
	pub audio_filename: String,
}

/// One unit of pipeline work tracking a single URL through download
/// and transcription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
	pub id: Uuid,
	pub url: String,
	pub model: WhisperModel,
	pub status: JobStatus,
	pub log: Vec<LogEntry>,
	pub result: Option<JobResult>,
	pub failed_reason: Option<String>,
	pub submitted_at: DateTime<Utc>,
}

impl Job {
	#[must_use]
	pub fn new(url: String, model: WhisperModel) -> Self {
		Self {
			id: Uuid::new_v4(),
			url,
			model,
			status: JobStatus::Waiting,
			log: Vec::new(),
			result: None,
			failed_reason: None,
			submitted_at: Utc::now(),
		}
	}

	pub fn append_log(&mut self, line: impl Into<String>) {
		self.log.push(LogEntry {
			at: Utc::now(),
			line: line.into(),
		});
	}

	/// `waiting -> active`. Only an unclaimed job can be claimed.
	pub fn mark_active(&mut self) -> Result<(), KnownError> {
		if self.status != JobStatus::Waiting {
			return Err(KnownError::Queue(format!("job {} is {}, expected waiting", self.id, self.status)));
		}
		self.status = JobStatus::Active;
		Ok(())
	}

	/// `active -> completed`, attaching the result.
	pub fn mark_completed(&mut self, result: JobResult) -> Result<(), KnownError> {
		if self.status != JobStatus::Active {
			return Err(KnownError::Queue(format!("job {} is {}, expected active", self.id, self.status)));
		}
		self.status = JobStatus::Completed;
		self.result = Some(result);
		Ok(())
	}

	/// `active -> failed`, attaching the reason. No automatic requeue;
	/// retry is an explicit resubmission by the caller.
	pub fn mark_failed(&mut self, reason: String) -> Result<(), KnownError> {
		if self.status != JobStatus::Active {
			return Err(KnownError::Queue(format!("job {} is {}, expected active", self.id, self.status)));
		}
		self.status = JobStatus::Failed;
		self.failed_reason = Some(reason);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn model_resolution_falls_back_to_default() {
		assert_eq!(WhisperModel::resolve(None, WhisperModel::Medium), WhisperModel::Medium);
		assert_eq!(WhisperModel::resolve(Some("xxl"), WhisperModel::Medium), WhisperModel::Medium);
		assert_eq!(WhisperModel::resolve(Some(""), WhisperModel::Small), WhisperModel::Small);
	}

	#[test]
	fn model_resolution_is_case_insensitive() {
		assert_eq!(WhisperModel::resolve(Some("TINY"), WhisperModel::Medium), WhisperModel::Tiny);
		assert_eq!(WhisperModel::resolve(Some("Large"), WhisperModel::Medium), WhisperModel::Large);
		assert_eq!(WhisperModel::resolve(Some("base"), WhisperModel::Medium), WhisperModel::Base);
	}

	#[test]
	fn transitions_follow_the_state_machine() {
		let mut job = Job::new("https://example.com/video".to_string(), WhisperModel::Small);
		assert_eq!(job.status, JobStatus::Waiting);

		job.mark_active().unwrap();
		assert_eq!(job.status, JobStatus::Active);
		assert!(job.result.is_none());
		assert!(job.failed_reason.is_none());

		job.mark_completed(JobResult {
			filename: "a.txt".to_string(),
			text_preview: "hi".to_string(),
			audio_filename: "a.mp3".to_string(),
		})
		.unwrap();
		assert_eq!(job.status, JobStatus::Completed);
		assert!(job.result.is_some());
		assert!(job.failed_reason.is_none());
	}

	#[test]
	fn waiting_job_cannot_complete_or_fail() {
		let mut job = Job::new("https://example.com/video".to_string(), WhisperModel::Small);
		assert!(job
			.mark_completed(JobResult {
				filename: "a.txt".to_string(),
				text_preview: String::new(),
				audio_filename: "a.mp3".to_string(),
			})
			.is_err());
		assert!(job.mark_failed("nope".to_string()).is_err());
	}

	#[test]
	fn terminal_job_cannot_be_reclaimed() {
		let mut job = Job::new("https://example.com/video".to_string(), WhisperModel::Small);
		job.mark_active().unwrap();
		job.mark_failed("boom".to_string()).unwrap();
		assert_eq!(job.status, JobStatus::Failed);
		assert!(job.mark_active().is_err());
		assert_eq!(job.failed_reason.as_deref(), Some("boom"));
		assert!(job.result.is_none());
	}
}
