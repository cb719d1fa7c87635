//! Development HTTP server for drop sites.
//!
//! Pages are processed on request instead of being built ahead of time. Each
//! descriptor is served under its mount point (or at the root) by a chain of
//! states, tried in order until one responds:
//!
//! 1. static files from the statics directory
//! 2. dynamic routes
//! 3. pages, processed through their front-matter processor chain
//! 4. 404
//!
//! # Quick Start
//!
//! ```ignore
//! use drop_context::Descriptor;
//! use drop_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let site = Descriptor::new("site").with_statics("static").with_pages("pages");
//!     run_server(&ServerConfig::default(), &[site]).await.unwrap();
//! }
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod response;
mod state;

use drop_context::Descriptor;

pub use app::create_router;
pub use error::ServerError;
pub use handlers::map_url_to_logical_path;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
        }
    }
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the descriptors conflict or the listener cannot be
/// bound.
pub async fn run_server(
    config: &ServerConfig,
    descriptors: &[Descriptor],
) -> Result<(), ServerError> {
    let app = create_router(descriptors)?;

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    tracing::info!(address = %addr, sites = descriptors.len(), "Starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
