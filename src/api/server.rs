use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{config::AppConfig, errors::Error};

use super::routes::{build_router, ApiState};

pub async fn start_api_server(config: &AppConfig, state: ApiState) -> crate::Result<()> {
    let router = build_router(state, &config.server)?;
    let addr = config.server.bind_address();

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::io(e, format!("Failed to bind API server to {}", addr)))?;

    info!(address = %addr, "Starting HTTP API server");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "API server shutdown listener failed");
            }
        })
        .await
        .map_err(|e| Error::io(e, "API server error"))?;

    info!("API server shutdown completed");
    Ok(())
}
