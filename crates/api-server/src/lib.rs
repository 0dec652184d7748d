//! API Server
//!
//! HTTP front of the order relay.
//!
//! # Features
//!
//! - **Orders**: submission, cancellation, quotes and order books
//! - **Markets**: the active-market snapshot and the token registry
//! - **Background jobs**: expiry sweeping and market indexing
//! - **OpenAPI**: Swagger documentation at `/swagger-ui`
//!
//! # Example
//!
//! ```ignore
//! use api_server::{ApiServer, AppState, ServerConfig};
//!
//! let state = AppState::in_memory(ExchangeSettings::default(), &RelayConfig::default());
//! let server = ApiServer::new(ServerConfig::from_env(), state, RelayConfig::default());
//! server.run().await?;
//! ```

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use order_engine::{spawn_periodic, ExpirySweeper};
use relay_core::config::RelayConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Enable CORS for all origins (development only).
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_permissive: true,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            // PORT first, then API_PORT, then 3000
            port: std::env::var("PORT")
                .or_else(|_| std::env::var("API_PORT"))
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            cors_permissive: std::env::var("CORS_PERMISSIVE")
                .map(|v| v == "true")
                .unwrap_or(true),
        }
    }

    /// Get the socket address.
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid socket address {}:{}", self.host, self.port))
    }
}

/// The API server and its background jobs.
pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
    relay: RelayConfig,
}

impl ApiServer {
    pub fn new(config: ServerConfig, state: AppState, relay: RelayConfig) -> Self {
        Self {
            config,
            state,
            relay,
        }
    }

    /// Serve until Ctrl-C, then stop the background jobs.
    pub async fn run(self) -> anyhow::Result<()> {
        let state = Arc::new(self.state);

        let router = create_router(state.clone())
            .layer(
                TraceLayer::new_for_http()
                    .on_request(|request: &Request<_>, _span: &tracing::Span| {
                        tracing::info!(
                            method = %request.method(),
                            uri = %request.uri(),
                            "Incoming request"
                        );
                    })
                    .on_response(DefaultOnResponse::new().level(Level::DEBUG))
                    .on_failure(
                        |error: tower_http::classify::ServerErrorsFailureClass,
                         latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::error!(
                                error = %error,
                                latency_ms = latency.as_millis(),
                                "Request failed"
                            );
                        },
                    ),
            )
            .layer(DefaultBodyLimit::max(256 * 1024))
            .layer(if self.config.cors_permissive {
                CorsLayer::permissive()
            } else {
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any)
            });

        // ── Background jobs ──
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sweeper = Arc::new(ExpirySweeper::new(
            state.store.clone(),
            self.relay.sweep_grace_secs,
        ));
        let jobs = vec![
            spawn_periodic(sweeper, self.relay.sweep_interval(), shutdown_rx.clone()),
            spawn_periodic(
                Arc::new(state.indexer.clone()),
                self.relay.market_index_interval(),
                shutdown_rx,
            ),
        ];
        info!(
            sweep_interval_secs = self.relay.sweep_interval_secs,
            sweep_grace_secs = self.relay.sweep_grace_secs,
            market_index_interval_secs = self.relay.market_index_interval_secs,
            "Background jobs spawned"
        );

        let addr = self.config.socket_addr()?;
        info!(address = %addr, "Starting API server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Shutting down background jobs");
        let _ = shutdown_tx.send(true);
        for job in jobs {
            if let Err(e) = job.await {
                warn!(error = %e, "Background job ended abnormally");
            }
        }

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
