use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use transcribe_host::config::Config;
use transcribe_host::state::AppState;
use transcribe_queue::{JobQueue, MemoryQueue, Pipeline, ProcessRunner, RedisQueue, Worker};

#[tokio::main]
async fn main() -> Result<()> {
	dotenvy::dotenv().ok();
	let config = Config::parse();
	init_tracing();

	tokio::fs::create_dir_all(&config.audio_dir).await?;
	tokio::fs::create_dir_all(&config.transcript_dir).await?;

	let config = Arc::new(config);

	let queue: Arc<dyn JobQueue> = if config.no_queue {
		warn!("running with in-process queue; jobs will not survive restarts");
		Arc::new(MemoryQueue::new())
	} else {
		let queue = RedisQueue::new(&config.redis_url)?;
		info!(url = %config.redis_url, "connected to queue backend");
		Arc::new(queue)
	};

	let pipeline = Arc::new(Pipeline::new(
		Arc::new(ProcessRunner),
		config.audio_dir.clone(),
		config.transcript_dir.clone(),
		config.whisper_script.clone(),
		config.default_model(),
	));

	let shutdown_token = CancellationToken::new();
	for id in 0..config.workers {
		let worker = Worker::new(id, queue.clone(), pipeline.clone(), config.claim_poll, shutdown_token.clone());
		tokio::spawn(async move {
			if let Err(e) = worker.run().await {
				error!(worker = id, error = %e, "worker exited with error");
			}
		});
	}

	let state = AppState {
		queue,
		pipeline,
		config: config.clone(),
	};
	let app = transcribe_host::router(state);

	let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
	info!("listening on {}", listener.local_addr()?);

	let signal_token = shutdown_token.clone();
	tokio::spawn(async move {
		tokio::signal::ctrl_c().await.ok();
		info!("Received Ctrl+C, initiating shutdown...");
		signal_token.cancel();
	});

	let server_token = shutdown_token.clone();
	axum::serve(listener, app)
		.with_graceful_shutdown(async move {
			server_token.cancelled().await;
		})
		.await?;

	info!("Server stopped");
	Ok(())
}

fn init_tracing() {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();
}
