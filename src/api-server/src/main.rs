//! Vaultkeeper API Server
//!
//! Entry point for the REST API in front of the encrypted vault and its
//! audit trail.
//!
//! # Usage
//!
//! ```bash
//! # Generate a vault key once and keep it with the deployment
//! cargo run -- --generate-key
//!
//! # Start with in-memory storage on 0.0.0.0:8080
//! APP_KEY=base64:... cargo run
//!
//! # Start against PostgreSQL
//! APP_KEY=base64:... DATABASE_URL=postgres://localhost/vaultkeeper cargo run
//!
//! # Enable debug logging
//! RUST_LOG=debug cargo run
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Logging level (trace, debug, info, warn, error)
//! - `VAULTKEEPER_HOST`: Server host (default: 0.0.0.0)
//! - `VAULTKEEPER_PORT`: Server port (default: 8080)
//! - `DATABASE_URL`: PostgreSQL URL (default: in-memory storage)
//! - `APP_KEY`: 32-byte vault key, `base64:` prefixed
//! - `VAULTKEEPER_DETACHED_AUDIT`: Write audit rows from a background task
//! - `VAULTKEEPER_SKIP_CORRUPT_ITEMS`: Omit undecryptable items from listings
//! - `VAULTKEEPER_TRUST_PROXY`: Take client ips from `x-forwarded-for`
//! - `VAULTKEEPER_JSON_LOGS`: JSON log output

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vaultkeeper_api_server::ServerBuilder;
use vaultkeeper_vault::VaultKey;

/// Vaultkeeper API Server
#[derive(Parser, Debug)]
#[command(
    name = "vaultkeeper-server",
    version,
    about = "REST API server for the Vaultkeeper encrypted vault",
    long_about = None
)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "VAULTKEEPER_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short = 'p', long, default_value = "8080", env = "VAULTKEEPER_PORT")]
    port: u16,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Vault encryption key (base64:<32 bytes>)
    #[arg(long, env = "APP_KEY", hide_env_values = true)]
    app_key: Option<String>,

    /// Print a freshly generated vault key and exit
    #[arg(long)]
    generate_key: bool,

    /// Write audit rows without waiting for them
    #[arg(long, env = "VAULTKEEPER_DETACHED_AUDIT")]
    detached_audit: bool,

    /// Omit undecryptable items from listings instead of failing
    #[arg(long, env = "VAULTKEEPER_SKIP_CORRUPT_ITEMS")]
    skip_corrupt_items: bool,

    /// Trust `x-forwarded-for` from a reverse proxy in front of the server
    #[arg(long, env = "VAULTKEEPER_TRUST_PROXY")]
    trust_proxy: bool,

    /// Enable JSON logging format
    #[arg(long, env = "VAULTKEEPER_JSON_LOGS")]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info", env = "RUST_LOG")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.generate_key {
        println!("{}", VaultKey::generate().to_config_string());
        return Ok(());
    }

    init_tracing(&args);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Vaultkeeper");

    let app_key = args
        .app_key
        .as_deref()
        .context("APP_KEY is not set; create one with --generate-key")?;
    let vault_key = VaultKey::parse(app_key).context("APP_KEY is not a valid vault key")?;

    let server = ServerBuilder::new()
        .host(&args.host)
        .port(args.port)
        .database_url(args.database_url.clone())
        .vault_key(vault_key)
        .detached_audit(args.detached_audit)
        .skip_corrupt_items(args.skip_corrupt_items)
        .trust_proxy(args.trust_proxy)
        .build()
        .await?;

    info!("Health check: http://{}:{}/health", args.host, args.port);

    if let Err(e) = server.run().await {
        error!("Server error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize tracing/logging subsystem
fn init_tracing(args: &Args) {
    let log_level = args.log_level.parse::<tracing::Level>().unwrap_or_else(|_| {
        eprintln!("Invalid log level '{}', using 'info'", args.log_level);
        tracing::Level::INFO
    });

    let http_level = if log_level <= tracing::Level::DEBUG {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "vaultkeeper_api_server={level},vaultkeeper_vault={level},vaultkeeper_audit={level},tower_http={http},axum={http}",
            level = log_level,
            http = http_level,
        )
        .into()
    });

    if args.json_logs {
        // JSON structured logging for production
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }
}
