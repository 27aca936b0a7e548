use std::{net::SocketAddr, sync::Arc};

use axum::{routing::get, Router};
use tokio_util::sync::CancellationToken;
use tracing::info;

use sn_core::{config::Config, dispatch::Dispatcher, ports::RelayPort};

use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub dispatcher: Arc<Dispatcher>,
    /// `None` when no webhook is configured: digests go back in the response body.
    pub relay: Option<Arc<dyn RelayPort>>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/news", get(handlers::news_query).post(handlers::news_form))
        .route("/status", get(handlers::status))
        .with_state(state)
}

/// Serve until `shutdown` is cancelled, then drain in-flight requests.
pub async fn run_server(state: Arc<AppState>, shutdown: CancellationToken) -> anyhow::Result<()> {
    let addr = SocketAddr::new(state.cfg.bind_addr, state.cfg.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(
        %addr,
        relay = state.relay.is_some(),
        expiration_secs = state.cfg.cache_expiration.as_secs(),
        "slacker-news listening"
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("server stopped");
    Ok(())
}
