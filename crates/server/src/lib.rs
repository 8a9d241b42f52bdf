pub mod auth;
pub mod config;
pub mod error;
pub mod fabric;
pub mod protocol;
pub mod registry;
pub mod routes;
pub mod session;
pub mod store;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::auth::Authenticator;
use crate::config::Config;
use crate::fabric::BroadcastFabric;
use crate::registry::MatchRegistry;
use crate::session::SessionHandler;

/// Build the HTTP + WebSocket router around one match registry.
pub fn app(config: &Config, registry: Arc<MatchRegistry>) -> Router {
    let authenticator = Authenticator::from_config(config);
    let sessions = Arc::new(SessionHandler::new(
        registry.clone(),
        Arc::new(BroadcastFabric::new()),
        authenticator.clone(),
    ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/api/matches",
            get(routes::matches::list_matches).post(routes::matches::create_match),
        )
        .route("/ws", get(routes::play_ws::ws_handler))
        .layer(Extension(registry))
        .layer(Extension(sessions))
        .layer(Extension(authenticator))
        .layer(Extension(config.clone()))
        .layer(cors)
}
