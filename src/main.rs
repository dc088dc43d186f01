mod accounts;
mod commands;
mod config;
mod db;
mod dispatch;
mod error;
mod llm;
mod remote;
mod routes;
mod state;
mod tools;

use std::sync::Arc;

use time::UtcOffset;
use tracing::{error, info};

use crate::accounts::{Gateway, PgAccountStore};
use crate::config::{AppConfig, ConfigError};
use crate::dispatch::{Dispatcher, LlmAgent};
use crate::error::ErrorCode;
use crate::llm::LlmClient;
use crate::llm::types::LlmError;
use crate::remote::{BackendClient, RemoteError};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("database init failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("backend client: {0}")]
    Remote(#[from] RemoteError),
    #[error("LLM client: {0}")]
    Llm(#[from] LlmError),
    #[error("server: {0}")]
    Io(#[from] std::io::Error),
}

impl ErrorCode for StartupError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Database(_) => "E_DATABASE",
            Self::Remote(e) => e.error_code(),
            Self::Llm(e) => e.error_code(),
            Self::Io(_) => "E_IO",
        }
    }
}

fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    // The local offset is only readable while the process is single-threaded.
    let utc_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(StartupError::from)
        .and_then(|runtime| runtime.block_on(run(utc_offset)));

    if let Err(e) = result {
        error!(code = e.error_code(), error = %e, "relaydesk failed");
        std::process::exit(1);
    }
}

async fn run(utc_offset: UtcOffset) -> Result<(), StartupError> {
    let config = AppConfig::from_env()?;

    let pool = db::init_pool(&config.database_url).await?;
    let backend = Arc::new(BackendClient::new(&config.backend)?);
    let llm = Arc::new(LlmClient::from_config(config.llm.clone())?);
    info!(model = llm.model(), "LLM client ready");

    let agent = Arc::new(LlmAgent::new(llm, backend.clone(), config.agent));
    let dispatcher = Dispatcher::new(agent, config.dispatch_deadline).with_utc_offset(utc_offset);
    let gateway = Gateway::new(Arc::new(PgAccountStore::new(pool)), backend);
    let state = state::AppState::new(Arc::new(dispatcher), Arc::new(gateway), &config.bot_auth_token);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    info!(port = config.port, "relaydesk listening");
    axum::serve(listener, app).await?;
    Ok(())
}
