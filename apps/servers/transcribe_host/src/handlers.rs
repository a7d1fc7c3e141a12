pub mod convert;
pub mod download;
pub mod queue;
pub mod transcribe;
