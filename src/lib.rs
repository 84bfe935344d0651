pub mod analytics;
pub mod api;
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod models;
pub mod records;
pub mod sanitize;
pub mod session;
pub mod validation;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use config::ServerConfig;
use core_state::{CoreError, CoreState};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("{0}")]
    Server(String),
    #[error("Signal handling failed: {0}")]
    Signal(#[from] std::io::Error),
}

/// Initialise the global tracing subscriber. `RUST_LOG` overrides the
/// default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Run the server until Ctrl-C.
pub async fn run(config: ServerConfig) -> Result<(), AppError> {
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let core = Arc::new(CoreState::from_config(&config)?);

    // Opening once up front creates the data directory and applies migrations
    drop(core.open_db()?);
    tracing::info!(path = %core.db_path().display(), "Database ready");

    match &config.admin_password {
        Some(password) => {
            core.bootstrap_admin(&config.admin_user, password)?;
        }
        None => tracing::debug!("No bootstrap password configured"),
    }

    let server = api::start_api_server(core, config.bind)
        .await
        .map_err(AppError::Server)?;
    tracing::info!(addr = %server.session.server_addr, "Listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received, shutting down");
    server.stop().await;
    Ok(())
}
