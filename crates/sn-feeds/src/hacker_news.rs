//! Hacker News via the public Firebase API.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::task::JoinSet;
use tracing::warn;

use sn_core::{
    digest::MAX_DIGEST_ITEMS, domain::FeedItem, errors::Error, ports::FeedClient, Result,
};

use crate::http::get_json;

pub const DEFAULT_API_BASE: &str = "https://hacker-news.firebaseio.com/v0";
const FEED_NAME: &str = "hacker-news";

#[derive(Clone, Debug, Deserialize)]
pub struct HnItem {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub by: Option<String>,
    #[serde(default)]
    pub score: Option<u64>,
    #[serde(default)]
    pub descendants: Option<u64>,
    #[serde(default)]
    pub dead: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl HnItem {
    /// Discussion link for self posts (Ask HN etc.) which carry no `url`.
    pub fn discussion_url(&self) -> String {
        format!("https://news.ycombinator.com/item?id={}", self.id)
    }

    pub fn into_feed_item(self) -> Option<FeedItem> {
        if self.dead || self.deleted {
            return None;
        }
        let title = self.title.clone().filter(|t| !t.trim().is_empty())?;
        let link = self
            .url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| self.discussion_url());

        let summary = format!(
            "{} points by {} | {} comments",
            self.score.unwrap_or(0),
            self.by.as_deref().unwrap_or("unknown"),
            self.descendants.unwrap_or(0)
        );
        Some(FeedItem::new(title, link).with_summary(summary))
    }
}

#[derive(Clone, Debug)]
pub struct HackerNewsClient {
    http: reqwest::Client,
    api_base: String,
}

impl HackerNewsClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_api_base(http, DEFAULT_API_BASE)
    }

    pub fn with_api_base(http: reqwest::Client, api_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FeedClient for HackerNewsClient {
    async fn fetch(&self, _category: Option<&str>) -> Result<Vec<FeedItem>> {
        let ids: Vec<u64> = get_json(
            &self.http,
            FEED_NAME,
            &format!("{}/topstories.json", self.api_base),
        )
        .await?;

        // Fetch a few spare items so dead/deleted stories don't shorten the digest.
        let wanted: Vec<u64> = ids.into_iter().take(MAX_DIGEST_ITEMS + 5).collect();

        let mut set = JoinSet::new();
        for (rank, id) in wanted.iter().copied().enumerate() {
            let http = self.http.clone();
            let url = format!("{}/item/{id}.json", self.api_base);
            set.spawn(async move {
                let item = get_json::<Option<HnItem>>(&http, FEED_NAME, &url).await;
                (rank, id, item)
            });
        }

        let mut slots: Vec<Option<FeedItem>> = vec![None; wanted.len()];
        let mut failures = 0usize;
        while let Some(joined) = set.join_next().await {
            let (rank, id, item) =
                joined.map_err(|e| Error::upstream(FEED_NAME, format!("item task failed: {e}")))?;
            match item {
                Ok(item) => slots[rank] = item.and_then(HnItem::into_feed_item),
                Err(e) => {
                    failures += 1;
                    warn!(id, error = %e, "hacker news item fetch failed");
                }
            }
        }

        let items: Vec<FeedItem> = slots
            .into_iter()
            .flatten()
            .take(MAX_DIGEST_ITEMS)
            .collect();

        if items.is_empty() && failures > 0 {
            return Err(Error::upstream(
                FEED_NAME,
                format!("all {failures} item fetches failed"),
            ));
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use std::time::Duration;

    use crate::http::build_client;

    /// Serve `router` on an ephemeral port and return its `/v0` base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}/v0")
    }

    fn item_id(file: &str) -> u64 {
        file.trim_end_matches(".json").parse().unwrap()
    }

    fn client(api_base: String) -> HackerNewsClient {
        let http = build_client(Duration::from_secs(5), "sn-test").unwrap();
        HackerNewsClient::with_api_base(http, api_base)
    }

    #[tokio::test]
    async fn items_keep_rank_order_and_skip_unusable_ones() {
        async fn item(Path(file): Path<String>) -> Response {
            let id = item_id(&file);
            // Higher-ranked items answer last.
            tokio::time::sleep(Duration::from_millis(60 / id)).await;
            match id {
                2 => Json(json!({"id": 2, "title": "gone", "dead": true})).into_response(),
                4 => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
                5 => Json(serde_json::Value::Null).into_response(),
                _ => Json(json!({"id": id, "title": format!("story {id}"), "by": "pg", "score": id}))
                    .into_response(),
            }
        }
        let router = Router::new()
            .route("/v0/topstories.json", get(|| async { Json(vec![1u64, 5, 3, 2, 4, 6]) }))
            .route("/v0/item/{file}", get(item));

        let items = client(serve(router).await).fetch(None).await.unwrap();

        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["story 1", "story 3", "story 6"]);
        assert_eq!(items[0].link, "https://news.ycombinator.com/item?id=1");
        assert_eq!(items[1].summary.as_deref(), Some("3 points by pg | 0 comments"));
    }

    #[tokio::test]
    async fn every_item_failing_is_an_upstream_error() {
        let router = Router::new()
            .route("/v0/topstories.json", get(|| async { Json(vec![7u64, 8]) }))
            .route(
                "/v0/item/{file}",
                get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
            );

        let err = client(serve(router).await).fetch(None).await.unwrap_err();
        assert!(
            matches!(err, Error::Upstream { ref message, .. } if message == "all 2 item fetches failed"),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn topstories_failure_is_an_upstream_error() {
        let router = Router::new().route(
            "/v0/topstories.json",
            get(|| async { StatusCode::BAD_GATEWAY }),
        );

        let err = client(serve(router).await).fetch(None).await.unwrap_err();
        assert!(matches!(err, Error::Upstream { .. }));
    }

    #[test]
    fn story_with_url_keeps_it() {
        let item: HnItem = serde_json::from_str(
            r#"{"id":1,"type":"story","title":"Show HN: A thing","url":"https://thing.dev","by":"pg","score":42,"descendants":7}"#,
        )
        .unwrap();
        let fi = item.into_feed_item().unwrap();
        assert_eq!(fi.title, "Show HN: A thing");
        assert_eq!(fi.link, "https://thing.dev");
        assert_eq!(fi.summary.as_deref(), Some("42 points by pg | 7 comments"));
    }

    #[test]
    fn self_post_links_to_discussion() {
        let item: HnItem =
            serde_json::from_str(r#"{"id":99,"title":"Ask HN: Why?","by":"x"}"#).unwrap();
        let fi = item.into_feed_item().unwrap();
        assert_eq!(fi.link, "https://news.ycombinator.com/item?id=99");
        assert_eq!(fi.summary.as_deref(), Some("0 points by x | 0 comments"));
    }

    #[test]
    fn dead_or_untitled_items_are_skipped() {
        let dead: HnItem =
            serde_json::from_str(r#"{"id":2,"title":"gone","dead":true}"#).unwrap();
        assert!(dead.into_feed_item().is_none());
        let untitled: HnItem = serde_json::from_str(r#"{"id":3}"#).unwrap();
        assert!(untitled.into_feed_item().is_none());
    }

    #[test]
    fn api_base_trailing_slash_is_trimmed() {
        let c = HackerNewsClient::with_api_base(reqwest::Client::new(), "http://localhost:1/v0/");
        assert_eq!(c.api_base, "http://localhost:1/v0");
    }
}
