//! Shared HTTP plumbing for feed clients.

use std::time::Duration;

use serde::de::DeserializeOwned;

use sn_core::{errors::Error, Result};

/// Build the client every feed shares. `timeout` is the per-request deadline.
pub fn build_client(timeout: Duration, user_agent: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent.to_string())
        .build()
        .map_err(|e| Error::Config(format!("http client build failed: {e}")))
}

async fn get_ok(http: &reqwest::Client, feed: &str, url: &str) -> Result<reqwest::Response> {
    let resp = http
        .get(url)
        .send()
        .await
        .map_err(|e| Error::upstream(feed, format!("request error: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::upstream(
            feed,
            format!(
                "{url} returned {status} {}",
                body.chars().take(200).collect::<String>()
            ),
        ));
    }

    Ok(resp)
}

pub async fn get_text(http: &reqwest::Client, feed: &str, url: &str) -> Result<String> {
    get_ok(http, feed, url)
        .await?
        .text()
        .await
        .map_err(|e| Error::upstream(feed, format!("body error: {e}")))
}

pub async fn get_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    feed: &str,
    url: &str,
) -> Result<T> {
    get_ok(http, feed, url)
        .await?
        .json::<T>()
        .await
        .map_err(|e| Error::upstream(feed, format!("json error: {e}")))
}
