pub mod command;
pub mod error;
pub mod job;
pub mod pipeline;
pub mod queue;
pub mod redis_queue;
pub mod worker;

pub use command::{CommandFailure, CommandOutput, CommandRunner, ProcessRunner};
pub use error::KnownError;
pub use job::{Job, JobResult, JobStatus, WhisperModel};
pub use pipeline::Pipeline;
pub use queue::{JobQueue, MemoryQueue};
pub use redis_queue::RedisQueue;
pub use worker::Worker;
