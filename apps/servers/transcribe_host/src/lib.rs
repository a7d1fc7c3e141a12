pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use state::AppState;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[must_use]
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/api/convert", post(handlers::convert::convert))
		.route("/api/transcribe", post(handlers::transcribe::transcribe))
		.route("/api/queue", post(handlers::queue::enqueue).get(handlers::queue::list))
		.route("/api/queue/clean", get(handlers::queue::clean))
		.route("/api/download/:filename", get(handlers::download::download))
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
		.with_state(state)
}
