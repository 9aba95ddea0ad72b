pub mod health;

use axum::{routing::get, Router};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/generate-post",
            get(handlers::handle_generate_post_probe).post(handlers::handle_generate_post),
        )
        .with_state(state)
}
