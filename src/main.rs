//! Vendor Onboarding Service - Main Application Entry Point
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Connect the store (PostgreSQL + migrations, or in-memory)
//! 3. Prepare the upload root, session keys and notifier
//! 4. Build HTTP router with routes and middleware
//! 5. Start server on configured port

use tracing_subscriber::EnvFilter;

use vendor_onboarding_server::{AppState, build_router, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info")
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        env = %config.app_env,
        variant = config.form_variant.as_str(),
        "Configuration loaded"
    );

    let port = config.server_port;
    let state = AppState::new(config).await?;
    let app = build_router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
