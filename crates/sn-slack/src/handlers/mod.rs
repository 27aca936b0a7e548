//! HTTP handlers.
//!
//! Each handler is a thin adapter that pulls the request fields axum
//! extracted, calls into the `sn-core` dispatcher and shapes the response.

use std::sync::Arc;

use axum::{
    extract::{Form, Query, State},
    response::{IntoResponse, Response},
    Json,
};

use crate::router::AppState;

mod news;
mod status;

pub use news::{format_banner, resolve_channel, SlashCommand};

pub async fn index() -> &'static str {
    "Slacker News, a Slack integration that posts the current top stories from your favourite news sources."
}

/// Slash command via query string (`GET /news?text=...`).
pub async fn news_query(
    State(state): State<Arc<AppState>>,
    Query(cmd): Query<SlashCommand>,
) -> Response {
    news::handle_news(&state, cmd).await
}

/// Slash command via form body, the way Slack delivers it (`POST /news`).
pub async fn news_form(
    State(state): State<Arc<AppState>>,
    Form(cmd): Form<SlashCommand>,
) -> Response {
    news::handle_news(&state, cmd).await
}

pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(status::build_status(&state))
}
