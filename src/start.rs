//! Startup helpers for the entity API and the development sidecar.

use std::future::Future;
use std::process::ExitCode;

use crate::config::ApiConfig;
use crate::server::{self, AppState};
use crate::sidecar::{self, SidecarServerConfig};

/// Run the entity API (used by the `sidecar-crud` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run_api() -> ExitCode {
    init_tracing();
    tracing::info!("Starting entity API v{}", env!("CARGO_PKG_VERSION"));

    let config = ApiConfig::from_env();
    let state = AppState::from_config(&config);

    block_on(server::run_server_with_shutdown(state, config.port, shutdown_signal()))
}

/// Run the development sidecar (used by the `sidecar-crud-sidecar` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run_sidecar() -> ExitCode {
    init_tracing();
    tracing::info!("Starting development sidecar v{}", env!("CARGO_PKG_VERSION"));

    let config = SidecarServerConfig::from_env();
    block_on(sidecar::run_sidecar_with_shutdown(config, shutdown_signal()))
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();
}

fn block_on<F>(server: F) -> ExitCode
where
    F: Future<Output = Result<(), Box<dyn std::error::Error + Send + Sync>>>,
{
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(server) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Resolves on Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
