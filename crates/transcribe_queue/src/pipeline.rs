use crate::command::CommandRunner;
use crate::error::{KnownError, Stage};
use crate::job::WhisperModel;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;

// The original service sends a desktop user agent to dodge bot checks.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const MAX_TITLE_LEN: usize = 80;

/// Characters that cannot appear in artifact filenames.
const ILLEGAL_FILENAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

#[derive(Debug, Clone)]
pub struct DownloadOutcome {
	pub audio_filename: String,
	pub title: String,
}

#[derive(Debug, Clone)]
pub struct TranscriptionOutcome {
	pub text: String,
	pub transcript_filename: String,
}

/// The two pipeline stages, expressed as request -> outcome functions
/// over an injected [`CommandRunner`] so the slow, non-deterministic
/// external tools can be swapped for canned runners in tests.
pub struct Pipeline {
	runner: Arc<dyn CommandRunner>,
	audio_dir: PathBuf,
	transcript_dir: PathBuf,
	whisper_script: PathBuf,
	default_model: WhisperModel,
}

impl Pipeline {
	#[must_use]
	pub fn new(runner: Arc<dyn CommandRunner>, audio_dir: PathBuf, transcript_dir: PathBuf, whisper_script: PathBuf, default_model: WhisperModel) -> Self {
		Self {
			runner,
			audio_dir,
			transcript_dir,
			whisper_script,
			default_model,
		}
	}

	#[must_use]
	pub fn resolve_model(&self, requested: Option<&str>) -> WhisperModel {
		WhisperModel::resolve(requested, self.default_model)
	}

	/// Stage 1: fetch the video title, derive a filesystem-safe filename,
	/// then extract the audio to `audio_dir`. Returns the filename only;
	/// callers know the storage location.
	pub async fn fetch_title_and_download(&self, url: &str) -> Result<DownloadOutcome, KnownError> {
		if url.trim().is_empty() {
			return Err(KnownError::Validation("url is required".to_string()));
		}

		let title_args = vec![
			"--user-agent".to_string(),
			USER_AGENT.to_string(),
			"--get-title".to_string(),
			"--no-playlist".to_string(),
			"--no-warnings".to_string(),
			url.to_string(),
		];
		let title_output = self.runner.run("yt-dlp", &title_args, None).await.map_err(|e| KnownError::StageFailure {
			stage: Stage::TitleFetch,
			detail: e.to_string(),
		})?;

		let mut title = sanitize_title(&title_output.stdout);
		if title.is_empty() {
			title = fallback_title();
		}

		let audio_filename = format!("{title}.mp3");
		let output_path = self.audio_dir.join(&audio_filename);

		let download_args = vec![
			"--user-agent".to_string(),
			USER_AGENT.to_string(),
			"-x".to_string(),
			"--audio-format".to_string(),
			"mp3".to_string(),
			"-o".to_string(),
			output_path.to_string_lossy().into_owned(),
			url.to_string(),
		];
		self.runner.run("yt-dlp", &download_args, None).await.map_err(|e| KnownError::StageFailure {
			stage: Stage::Download,
			detail: e.to_string(),
		})?;

		Ok(DownloadOutcome { audio_filename, title })
	}

	/// Stage 2: run speech-to-text over an already-downloaded audio file
	/// and persist the text next to it (same base name, `.txt`) in the
	/// transcript store.
	///
	/// A missing audio file is a client input error ([`KnownError::NotFound`]),
	/// not a pipeline fault; the runner is never invoked for it.
	pub async fn transcribe(&self, audio_filename: &str, model: WhisperModel) -> Result<TranscriptionOutcome, KnownError> {
		let audio_path = self.audio_dir.join(audio_filename);
		if !audio_path.is_file() {
			return Err(KnownError::NotFound(format!("audio file not found: {audio_filename}")));
		}

		let args = vec![
			self.whisper_script.to_string_lossy().into_owned(),
			audio_path.to_string_lossy().into_owned(),
			model.as_str().to_string(),
		];
		let output = self.runner.run("python3", &args, None).await.map_err(|e| KnownError::StageFailure {
			stage: Stage::Transcription,
			detail: e.to_string(),
		})?;

		let transcript_filename = transcript_name(audio_filename);
		let transcript_path = self.transcript_dir.join(&transcript_filename);
		tokio::fs::write(&transcript_path, &output.stdout).await?;

		Ok(TranscriptionOutcome {
			text: output.stdout,
			transcript_filename,
		})
	}
}

/// Map a title to a filesystem-safe name: illegal characters become `_`,
/// whitespace runs collapse to a single `_`, and the result is capped at
/// 80 characters. Total and idempotent; may return an empty string for
/// whitespace-only input (callers substitute [`fallback_title`]).
#[must_use]
pub fn sanitize_title(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());
	let mut pending_separator = false;
	for c in raw.trim().chars() {
		if c.is_whitespace() {
			pending_separator = true;
			continue;
		}
		if pending_separator {
			out.push('_');
			pending_separator = false;
		}
		if ILLEGAL_FILENAME_CHARS.contains(&c) {
			out.push('_');
		} else {
			out.push(c);
		}
	}
	out.chars().take(MAX_TITLE_LEN).collect()
}

/// Unique-enough stand-in for an empty sanitized title.
#[must_use]
pub fn fallback_title() -> String {
	format!("audio_{}", Utc::now().timestamp_millis())
}

fn transcript_name(audio_filename: &str) -> String {
	audio_filename.strip_suffix(".mp3").map_or_else(|| format!("{audio_filename}.txt"), |base| format!("{base}.txt"))
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;
	use crate::command::{CommandFailure, CommandOutput};
	use async_trait::async_trait;
	use std::path::Path;
	use std::sync::Mutex;

	/// Canned runner keyed on the command shape, standing in for the
	/// real yt-dlp / whisper binaries.
	pub(crate) struct ScriptedRunner {
		pub title: Result<&'static str, &'static str>,
		pub download: Result<(), &'static str>,
		pub transcription: Result<&'static str, &'static str>,
		pub calls: Mutex<Vec<String>>,
	}

	impl ScriptedRunner {
		pub fn succeeding(title: &'static str, text: &'static str) -> Self {
			Self {
				title: Ok(title),
				download: Ok(()),
				transcription: Ok(text),
				calls: Mutex::new(Vec::new()),
			}
		}

		pub fn call_count(&self) -> usize {
			self.calls.lock().unwrap().len()
		}
	}

	fn ok(stdout: &str) -> CommandOutput {
		CommandOutput {
			stdout: stdout.to_string(),
			stderr: String::new(),
		}
	}

	fn boom(stderr: &str) -> CommandFailure {
		CommandFailure {
			status: Some(1),
			stdout: String::new(),
			stderr: stderr.to_string(),
		}
	}

	#[async_trait]
	impl CommandRunner for ScriptedRunner {
		async fn run(&self, program: &str, args: &[String], _cwd: Option<&Path>) -> Result<CommandOutput, CommandFailure> {
			self.calls.lock().unwrap().push(format!("{program} {}", args.join(" ")));
			if args.iter().any(|a| a == "--get-title") {
				self.title.map(ok).map_err(boom)
			} else if program == "yt-dlp" {
				self.download.map(|()| ok("")).map_err(boom)
			} else {
				self.transcription.map(ok).map_err(boom)
			}
		}
	}

	fn pipeline(runner: Arc<ScriptedRunner>, audio_dir: &Path, transcript_dir: &Path) -> Pipeline {
		Pipeline::new(
			runner,
			audio_dir.to_path_buf(),
			transcript_dir.to_path_buf(),
			PathBuf::from("whisper_transcribe.py"),
			WhisperModel::Medium,
		)
	}

	#[test]
	fn sanitize_replaces_illegal_characters() {
		assert_eq!(sanitize_title(r#"a\b/c:d*e?f"g<h>i|j"#), "a_b_c_d_e_f_g_h_i_j");
	}

	#[test]
	fn sanitize_collapses_whitespace_runs() {
		assert_eq!(sanitize_title("My   Cool \t Video\n"), "My_Cool_Video");
	}

	#[test]
	fn sanitize_truncates_to_eighty_chars() {
		let long = "x".repeat(200);
		assert_eq!(sanitize_title(&long).chars().count(), 80);
	}

	#[test]
	fn sanitize_is_idempotent() {
		let once = sanitize_title("  My: Cool? Video  ");
		assert_eq!(sanitize_title(&once), once);
	}

	#[test]
	fn sanitize_maps_whitespace_only_to_empty() {
		assert_eq!(sanitize_title("   \t\n "), "");
	}

	#[test]
	fn fallback_title_is_filesystem_safe() {
		let name = fallback_title();
		assert!(name.starts_with("audio_"));
		assert!(!name.contains(ILLEGAL_FILENAME_CHARS));
		assert!(!name.contains(char::is_whitespace));
	}

	#[test]
	fn transcript_name_swaps_extension() {
		assert_eq!(transcript_name("My_Cool_Video.mp3"), "My_Cool_Video.txt");
		assert_eq!(transcript_name("weird"), "weird.txt");
	}

	#[tokio::test]
	async fn download_produces_sanitized_filename() {
		let audio = tempfile::tempdir().unwrap();
		let transcripts = tempfile::tempdir().unwrap();
		let runner = Arc::new(ScriptedRunner::succeeding("My Cool Video\n", "Hello world"));
		let pipeline = pipeline(runner.clone(), audio.path(), transcripts.path());

		let outcome = pipeline.fetch_title_and_download("https://example.com/video").await.unwrap();
		assert_eq!(outcome.audio_filename, "My_Cool_Video.mp3");
		assert_eq!(outcome.title, "My_Cool_Video");
		// title fetch + download
		assert_eq!(runner.call_count(), 2);
	}

	#[tokio::test]
	async fn title_fetch_failure_skips_download() {
		let audio = tempfile::tempdir().unwrap();
		let transcripts = tempfile::tempdir().unwrap();
		let runner = Arc::new(ScriptedRunner {
			title: Err("video unavailable"),
			download: Ok(()),
			transcription: Ok(""),
			calls: Mutex::new(Vec::new()),
		});
		let pipeline = pipeline(runner.clone(), audio.path(), transcripts.path());

		let err = pipeline.fetch_title_and_download("https://example.com/video").await.unwrap_err();
		assert!(matches!(err, KnownError::StageFailure { stage: Stage::TitleFetch, .. }));
		assert!(err.to_string().contains("video unavailable"));
		assert_eq!(runner.call_count(), 1);
	}

	#[tokio::test]
	async fn download_failure_carries_detail() {
		let audio = tempfile::tempdir().unwrap();
		let transcripts = tempfile::tempdir().unwrap();
		let runner = Arc::new(ScriptedRunner {
			title: Ok("clip"),
			download: Err("403 forbidden"),
			transcription: Ok(""),
			calls: Mutex::new(Vec::new()),
		});
		let pipeline = pipeline(runner.clone(), audio.path(), transcripts.path());

		let err = pipeline.fetch_title_and_download("https://example.com/video").await.unwrap_err();
		assert!(matches!(err, KnownError::StageFailure { stage: Stage::Download, .. }));
		assert!(err.to_string().contains("403 forbidden"));
	}

	#[tokio::test]
	async fn empty_url_is_rejected_before_any_command() {
		let audio = tempfile::tempdir().unwrap();
		let transcripts = tempfile::tempdir().unwrap();
		let runner = Arc::new(ScriptedRunner::succeeding("clip", ""));
		let pipeline = pipeline(runner.clone(), audio.path(), transcripts.path());

		let err = pipeline.fetch_title_and_download("  ").await.unwrap_err();
		assert!(matches!(err, KnownError::Validation(_)));
		assert_eq!(runner.call_count(), 0);
	}

	#[tokio::test]
	async fn empty_title_falls_back_to_generated_name() {
		let audio = tempfile::tempdir().unwrap();
		let transcripts = tempfile::tempdir().unwrap();
		let runner = Arc::new(ScriptedRunner::succeeding("   \n", ""));
		let pipeline = pipeline(runner.clone(), audio.path(), transcripts.path());

		let outcome = pipeline.fetch_title_and_download("https://example.com/video").await.unwrap();
		assert!(outcome.audio_filename.starts_with("audio_"));
		assert!(outcome.audio_filename.ends_with(".mp3"));
	}

	#[tokio::test]
	async fn transcribe_missing_file_never_spawns() {
		let audio = tempfile::tempdir().unwrap();
		let transcripts = tempfile::tempdir().unwrap();
		let runner = Arc::new(ScriptedRunner::succeeding("clip", "text"));
		let pipeline = pipeline(runner.clone(), audio.path(), transcripts.path());

		let err = pipeline.transcribe("missing.mp3", WhisperModel::Medium).await.unwrap_err();
		assert!(matches!(err, KnownError::NotFound(_)));
		assert_eq!(runner.call_count(), 0);
	}

	#[tokio::test]
	async fn transcribe_writes_sibling_text_file() {
		let audio = tempfile::tempdir().unwrap();
		let transcripts = tempfile::tempdir().unwrap();
		std::fs::write(audio.path().join("clip.mp3"), b"dummy").unwrap();
		let runner = Arc::new(ScriptedRunner::succeeding("clip", "Hello world"));
		let pipeline = pipeline(runner.clone(), audio.path(), transcripts.path());

		let outcome = pipeline.transcribe("clip.mp3", WhisperModel::Small).await.unwrap();
		assert_eq!(outcome.text, "Hello world");
		assert_eq!(outcome.transcript_filename, "clip.txt");

		let persisted = std::fs::read_to_string(transcripts.path().join("clip.txt")).unwrap();
		assert_eq!(persisted, "Hello world");

		// model name is passed through to the external command
		let calls = runner.calls.lock().unwrap();
		assert!(calls[0].contains("small"));
	}

	#[tokio::test]
	async fn transcription_failure_carries_detail() {
		let audio = tempfile::tempdir().unwrap();
		let transcripts = tempfile::tempdir().unwrap();
		std::fs::write(audio.path().join("clip.mp3"), b"dummy").unwrap();
		let runner = Arc::new(ScriptedRunner {
			title: Ok("clip"),
			download: Ok(()),
			transcription: Err("model load failed"),
			calls: Mutex::new(Vec::new()),
		});
		let pipeline = pipeline(runner.clone(), audio.path(), transcripts.path());

		let err = pipeline.transcribe("clip.mp3", WhisperModel::Medium).await.unwrap_err();
		assert!(matches!(err, KnownError::StageFailure { stage: Stage::Transcription, .. }));
		assert!(err.to_string().contains("model load failed"));
	}
}
