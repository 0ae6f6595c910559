//! # Giftdesk
//!
//! Dashboard gateway for a gifting backend: it owns operator sessions,
//! gates dashboard views by privilege and renders gift-slot cooldowns for
//! linked game accounts.
//!
//! ## Architecture
//! - `server`: router construction and startup
//! - `config`: environment variable configuration
//! - `auth`: session authority, per-credential session stores and the gate
//! - `navigation`: route table, authorization and menu
//! - `gifts`: gift-slot availability and countdowns
//! - `backend`: HTTP client for the gifting backend
//! - `routes`: HTTP handlers
//!
//! ## Environment Setup
//! Configuration is read from the environment, after loading `.env`:
//! ```bash
//! BACKEND_URL=http://localhost:8080/api PORT=3000 cargo run
//! ```
//!
//! ## Health Check
//! ```bash
//! curl http://localhost:3000/ping
//! ```

mod auth;
mod backend;
mod config;
mod gifts;
mod navigation;
mod routes;
mod server;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point.
///
/// Startup configuration errors are the only fatal errors; they are
/// returned from here and reported by the runtime.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();

    tracing::info!("Starting gift dashboard gateway...");
    tracing::info!("Package: {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Build profile: {}",
        if cfg!(debug_assertions) { "debug" } else { "release" }
    );

    let config = config::Config::from_env()?;
    server::start(config).await
}
