//! HTTP server setup and lifecycle management
//!
//! This module handles:
//! - Server configuration
//! - TCP listener setup
//! - Graceful shutdown on signals (SIGTERM, SIGINT)

use crate::{routes, state::AppState};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use vaultkeeper_vault::VaultKey;

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Host to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// PostgreSQL URL; in-memory storage when absent
    pub database_url: Option<String>,
    /// Process-wide key for secret fields
    pub vault_key: Option<VaultKey>,
    /// Write audit rows from a detached task
    pub detached_audit: bool,
    /// Leave undecryptable items out of listings instead of failing them
    pub skip_corrupt_items: bool,
    /// Honour `x-forwarded-for` for the audit client ip
    pub trust_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: None,
            vault_key: None,
            detached_audit: false,
            skip_corrupt_items: false,
            trust_forwarded_for: false,
        }
    }
}

/// HTTP server instance
pub struct Server {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Start the server and block until shutdown signal
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = self.config.port,
            persistent = self.config.database_url.is_some(),
            detached_audit = self.config.detached_audit,
            trust_forwarded_for = self.config.trust_forwarded_for,
            "Starting Vaultkeeper API server"
        );

        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;

        let local_addr = listener.local_addr()?;
        info!("Server listening on http://{}", local_addr);
        info!("OpenAPI document at http://{}/api-docs/openapi.json", local_addr);

        let app = routes::create_router(self.state.clone());

        // Peer addresses feed the audit trail when no proxy header is present
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

        info!("Server shutdown complete");
        Ok(())
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the application state
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}

/// Wait for SIGTERM or SIGINT
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}

/// Builder for creating a server with custom configuration
pub struct ServerBuilder {
    config: ServerConfig,
    state: Option<Arc<AppState>>,
}

impl ServerBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            state: None,
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn database_url(mut self, url: Option<String>) -> Self {
        self.config.database_url = url;
        self
    }

    pub fn vault_key(mut self, key: VaultKey) -> Self {
        self.config.vault_key = Some(key);
        self
    }

    pub fn detached_audit(mut self, detached: bool) -> Self {
        self.config.detached_audit = detached;
        self
    }

    pub fn skip_corrupt_items(mut self, skip: bool) -> Self {
        self.config.skip_corrupt_items = skip;
        self
    }

    pub fn trust_proxy(mut self, trusted: bool) -> Self {
        self.config.trust_forwarded_for = trusted;
        self
    }

    /// Use prebuilt state instead of wiring it from configuration
    pub fn state(mut self, state: Arc<AppState>) -> Self {
        self.state = Some(state);
        self
    }

    /// Build the server, connecting storage if no state was supplied
    pub async fn build(self) -> Result<Server> {
        let state = match self.state {
            Some(state) => state,
            None => Arc::new(AppState::from_config(&self.config).await?),
        };

        Ok(Server::new(self.config, state))
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
