//! Slack adapter.
//!
//! This crate implements the `sn-core` RelayPort over a Slack incoming webhook
//! and serves the slash-command HTTP endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

pub mod handlers;
pub mod router;

use sn_core::{errors::Error, ports::RelayPort, Result};

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
    channel: &'a str,
}

/// Posts messages through a Slack incoming webhook.
#[derive(Clone, Debug)]
pub struct SlackWebhook {
    url: String,
    http: reqwest::Client,
}

impl SlackWebhook {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }
}

#[async_trait]
impl RelayPort for SlackWebhook {
    async fn post(&self, text: &str, channel: &str) -> Result<()> {
        let resp = self
            .http
            .post(&self.url)
            .json(&WebhookPayload { text, channel })
            .send()
            .await
            .map_err(|e| Error::Relay(format!("slack webhook request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Relay(format!(
                "slack webhook failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        Ok(())
    }
}
