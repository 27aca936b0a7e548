use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{error, info};

use crate::router::AppState;

/// The fields of a Slack slash-command request this service reads.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SlashCommand {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub channel_id: String,
}

/// First line of every relayed digest, naming who asked for it.
pub fn format_banner(user_name: &str) -> String {
    format!("// {user_name}\n")
}

/// Where a relayed digest should land: the DM, the private group id, or the channel.
pub fn resolve_channel(cmd: &SlashCommand) -> String {
    match cmd.channel_name.as_str() {
        "directmessage" => format!("@{}", cmd.user_name),
        "privategroup" => cmd.channel_id.clone(),
        name => format!("#{name}"),
    }
}

pub(super) async fn handle_news(state: &AppState, cmd: SlashCommand) -> Response {
    info!(user = %cmd.user_name, text = %cmd.text, "slash command");

    let banner = format_banner(&cmd.user_name);
    let reply = state.dispatcher.handle_command(&cmd.text, &banner).await;

    if !reply.is_digest() {
        return (StatusCode::OK, reply.text).into_response();
    }

    let Some(relay) = &state.relay else {
        return (StatusCode::OK, reply.text).into_response();
    };

    let channel = resolve_channel(&cmd);
    match relay.post(&reply.text, &channel).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            error!(channel = %channel, error = %e, "relay to slack failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server Error - the digest could not be posted to Slack",
            )
                .into_response()
        }
    }
}
