//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! Every collaborator is built once in `main` and shared behind an `Arc`;
//! nothing in the crate reaches for a process-wide client.

use std::sync::Arc;

use crate::accounts::Gateway;
use crate::dispatch::Dispatcher;

/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub gateway: Arc<Gateway>,
    /// Shared secret the chat front end presents as a bearer token.
    pub bot_token: Arc<str>,
}

impl AppState {
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>, gateway: Arc<Gateway>, bot_token: &str) -> Self {
        Self { dispatcher, gateway, bot_token: Arc::from(bot_token) }
    }
}
