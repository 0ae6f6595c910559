//! # Server Module
//!
//! HTTP server setup and route configuration for the dashboard gateway.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::auth::{SessionAuthority, SessionGate, SessionHub, SessionVerifier};
use crate::backend::BackendClient;
use crate::config::{Config, ServerConfig};
use crate::gifts::{CooldownTracker, Precision};
use crate::routes::{auth, gifts, health::ping, views};

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub backend: Arc<BackendClient>,
    pub sessions: Arc<SessionHub>,
    pub gifts: CooldownTracker,
}

impl AppState {
    /// Wire the state around an explicit session verifier
    pub fn new(config: Config, backend: Arc<BackendClient>, verifier: Arc<dyn SessionVerifier>) -> Self {
        let authority = Arc::new(SessionAuthority::new(config.session.verification, verifier));
        let gifts = CooldownTracker::new(config.gifts.fallback_cooldown, Precision::Coarse);
        Self {
            config: Arc::new(config),
            backend,
            sessions: Arc::new(SessionHub::new(authority)),
            gifts,
        }
    }

    /// Production wiring: sessions are verified by the backend itself
    pub fn from_config(config: Config) -> Result<Self> {
        let backend = Arc::new(
            BackendClient::new(config.backend.base_url.clone(), config.backend.timeout)
                .context("Failed to build backend client")?,
        );
        Ok(Self::new(config, backend.clone(), backend))
    }
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin `{}`", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

/// Build the gateway router
pub fn router(state: AppState) -> Router {
    // Dashboard pages go through the page gate
    let pages = Router::new()
        .route("/", get(views::login_view))
        .route("/gifts", get(views::own_accounts))
        .route("/fortniteaccounts", get(views::own_accounts))
        .route("/transactionshistory", get(views::transactions))
        .route("/transactionsadminhistory", get(views::transactions))
        .route("/fortniteadminaccounts", get(views::all_accounts))
        .route("/usersadminaccounts", get(views::operator_users))
        .route("/logout", get(auth::logout_page))
        .route_layer(middleware::from_fn_with_state(state.clone(), SessionGate::pages));

    // Gift-slot data requires an authenticated session
    let gift_routes = Router::new()
        .route("/api/gifts/{account_id}", get(gifts::gift_slot))
        .route("/api/gifts/{account_id}/countdown", get(gifts::countdown))
        .route_layer(middleware::from_fn_with_state(state.clone(), SessionGate::api));

    let unknown = get(views::not_found)
        .route_layer(middleware::from_fn_with_state(state.clone(), SessionGate::pages));

    Router::new()
        .route("/ping", get(ping))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/session", get(auth::session))
        .route("/api/session/events", get(auth::session_events))
        .merge(pages)
        .merge(gift_routes)
        .fallback(unknown)
        .layer(ServiceBuilder::new().layer(cors_layer(&state.config.server)))
        .with_state(state)
}

/// Starts the dashboard gateway and serves until the process is stopped.
pub async fn start(config: Config) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let backend_url = config.backend.base_url.clone();
    let verification = config.session.verification;
    let state = AppState::from_config(config)?;

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} - port may already be in use", addr))?;

    tracing::info!("Gift dashboard gateway starting...");
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Health check available at http://{}/ping", addr);
    tracing::info!("Backend: {} ({:?} verification)", backend_url, verification);

    axum::serve(listener, router(state))
        .await
        .context("Server terminated unexpectedly")?;
    Ok(())
}
