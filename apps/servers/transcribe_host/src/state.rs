use crate::config::Config;
use std::sync::Arc;
use transcribe_queue::{JobQueue, Pipeline};

#[derive(Clone)]
pub struct AppState {
	pub queue: Arc<dyn JobQueue>,
	pub pipeline: Arc<Pipeline>,
	pub config: Arc<Config>,
}
