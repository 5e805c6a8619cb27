//! Public release proxy for a private GitHub repository.
//!
//! Lists published releases (installers only) and streams installer
//! downloads, without ever exposing the access token. See
//! [`vitrine_gateway`] for the operations themselves; this crate wires them
//! to HTTP and to the process.

pub mod cli;
pub mod error;
pub mod http;
pub mod logging;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::sync::Arc;
use tokio::net::TcpListener;
use vitrine_config::Config;
use vitrine_gateway::Gateway;
use vitrine_upstream::backend::GithubBackend;

/// Validate `config`, then serve until Ctrl-C.
pub async fn serve(config: &Config) -> Result<()> {
    let credential = config.validate().or_raise(|| ErrorKind::Config)?;
    let backend = GithubBackend::new(&config.api_url, &config.owner, &config.repo, Some(credential.clone()))
        .or_raise(|| ErrorKind::Backend)?;
    let gateway = Arc::new(Gateway::new(Arc::new(backend)));

    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr).await.or_raise(|| ErrorKind::Bind(addr))?;
    tracing::info!(%addr, repository = %config.repository(), "Starting release proxy");

    axum::serve(listener, http::router(gateway))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .or_raise(|| ErrorKind::Serve)?;
    tracing::info!("Release proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown requested, finishing in-flight requests"),
        // Without a signal handler there is no way to stop gracefully; keep serving.
        Err(err) => {
            tracing::warn!(error = %err, "Could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        },
    }
}
