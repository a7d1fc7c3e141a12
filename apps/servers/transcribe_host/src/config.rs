use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use transcribe_queue::WhisperModel;

#[derive(Parser, Clone, Debug)]
#[command(author, version, about = "Media download + transcription queue service", long_about = None)]
pub struct Config {
	#[arg(long, env = "PORT", default_value = "3001", help = "Port the HTTP server listens on")]
	pub port: u16,

	#[arg(long, env = "DEFAULT_MODEL", default_value = "medium", help = "Whisper model used when a request names none")]
	pub default_model: String,

	#[arg(long, env = "REDIS_URL", default_value = "redis://localhost:6379", help = "Queue backend address")]
	pub redis_url: String,

	#[arg(long, env = "AUDIO_DIR", default_value = "uploads", help = "Storage location for extracted audio")]
	pub audio_dir: PathBuf,

	#[arg(long, env = "TRANSCRIPT_DIR", default_value = "transcriptions", help = "Storage location for transcript text files")]
	pub transcript_dir: PathBuf,

	#[arg(long, env = "WHISPER_SCRIPT", default_value = "whisper_transcribe.py", help = "Path to the transcription script")]
	pub whisper_script: PathBuf,

	#[arg(long, env = "WORKER_COUNT", default_value = "1", help = "Number of queue workers to run")]
	pub workers: usize,

	#[arg(
        long = "claim-poll-ms",
        env = "CLAIM_POLL_MS",
        default_value = "500",
        value_parser = parse_millis,
        help = "Delay between claim attempts when the queue is empty"
    )]
	pub claim_poll: Duration,

	#[arg(long, env = "NO_QUEUE", help = "Use an in-process queue instead of Redis (jobs do not survive restarts)")]
	pub no_queue: bool,
}

impl Config {
	/// An unrecognized configured default degrades to `medium`, matching
	/// how request-level model names are resolved.
	#[must_use]
	pub fn default_model(&self) -> WhisperModel {
		WhisperModel::resolve(Some(&self.default_model), WhisperModel::Medium)
	}
}

fn parse_millis(s: &str) -> Result<Duration, std::num::ParseIntError> {
	s.parse::<u64>().map(Duration::from_millis)
}
