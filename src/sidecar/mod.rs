//! Development sidecar.
//!
//! A minimal local resolution agent that serves the invocation URL scheme
//! `/v1.0/invoke/{app_id}/method/{path}` and forwards each call to the
//! app registered under `app_id`.

pub mod config;
pub mod error;
pub mod forward;
pub mod registry;

pub use config::{RetryPolicy, SidecarServerConfig};
pub use error::{SidecarError, SidecarResult};
pub use forward::{SidecarState, create_router};
pub use registry::AppRegistry;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::server::with_layers;

/// Start the sidecar.
///
/// # Errors
/// Returns an error if the registrations are invalid or the listener fails.
pub async fn run_sidecar(config: SidecarServerConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    run_sidecar_with_shutdown(config, std::future::pending()).await
}

/// Start the sidecar with graceful shutdown support.
///
/// # Errors
/// Returns an error if the registrations are invalid or the listener fails.
pub async fn run_sidecar_with_shutdown<F>(
    config: SidecarServerConfig,
    shutdown_signal: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let registry = Arc::new(AppRegistry::parse(&config.apps)?);
    let state = SidecarState::new(registry, &config)?;
    if state.registry().is_empty() {
        tracing::warn!("No apps registered; every invocation will return 404");
    }
    let app = with_layers(create_router(state));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Sidecar listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}
