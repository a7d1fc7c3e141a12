use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Captured output of an external command that exited successfully.
#[derive(Debug, Clone)]
pub struct CommandOutput {
	pub stdout: String,
	pub stderr: String,
}

/// A command that exited non-zero or could not be spawned.
///
/// This is a value the caller interprets, not a panic: retry policy
/// belongs to whoever invoked the runner.
#[derive(Debug, Clone)]
pub struct CommandFailure {
	pub status: Option<i32>,
	pub stdout: String,
	pub stderr: String,
}

impl fmt::Display for CommandFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.status {
			Some(code) => write!(f, "exit code {code}: {}", self.stderr.trim()),
			None => write!(f, "{}", self.stderr.trim()),
		}
	}
}

/// Abstraction over spawning an external executable and collecting its
/// output, so the pipeline stages can be tested against a canned runner.
#[async_trait]
pub trait CommandRunner: Send + Sync {
	async fn run(&self, program: &str, args: &[String], cwd: Option<&Path>) -> Result<CommandOutput, CommandFailure>;
}

/// Spawns real OS processes with a structured argument list.
///
/// Arguments are never joined into a shell string, so URLs and video
/// titles cannot smuggle shell metacharacters into the invocation.
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
	async fn run(&self, program: &str, args: &[String], cwd: Option<&Path>) -> Result<CommandOutput, CommandFailure> {
		let mut command = Command::new(program);
		command.args(args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
		if let Some(dir) = cwd {
			command.current_dir(dir);
		}

		let output = match command.output().await {
			Ok(output) => output,
			Err(e) => {
				return Err(CommandFailure {
					status: None,
					stdout: String::new(),
					stderr: format!("failed to spawn {program}: {e}"),
				})
			}
		};

		let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
		let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

		if output.status.success() {
			Ok(CommandOutput { stdout, stderr })
		} else {
			Err(CommandFailure {
				status: output.status.code(),
				stdout,
				stderr,
			})
		}
	}
}
