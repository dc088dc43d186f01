//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The chat front end is a separate process. It forwards each user command
//! to `POST /api/commands` with the shared bot token and renders the JSON
//! [`Reply`](crate::commands::Reply) it gets back.

pub mod commands;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/commands", post(commands::run_command))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
