pub mod config;
pub mod error;
pub mod message;
pub mod pages;
pub mod relay;
pub mod state;
pub mod store;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::routing::get;
use axum::Router;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::relay::RelayClient;
use crate::state::{AppState, SharedState};
use crate::store::Store;

pub fn build_app(config: Config) -> Router {
    let state: SharedState = Arc::new(AppState {
        relay: RelayClient::new(config.relay.clone()),
        static_files: ServeDir::new(&config.web_root),
        config,
    });

    Router::new()
        .route("/", get(pages::index).post(relay::submit))
        .route("/message", get(pages::message).post(relay::submit))
        .route("/health", get(health))
        .fallback(relay::fallback)
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the store loop on its own task until `shutdown` flips.
pub fn spawn_store(store: Store, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(store.run(shutdown))
}

async fn health() -> &'static str {
    "ok"
}
