//! Designer News (stories and the message of the day) via its JSON API.

use async_trait::async_trait;
use serde::Deserialize;

use sn_core::{
    digest::MAX_DIGEST_ITEMS, domain::FeedItem, errors::Error, ports::FeedClient,
    source::CategorySet, Result,
};

use crate::http::get_json;

pub const DEFAULT_API_BASE: &str = "https://api.designernews.co/api/v2";
const SITE: &str = "https://www.designernews.co";
const FEED_NAME: &str = "designer-news";

pub const STORIES: &str = "stories";
pub const MOTD: &str = "motd";

#[derive(Debug, Default, Deserialize)]
pub struct StoriesPage {
    #[serde(default)]
    pub stories: Vec<Story>,
}

#[derive(Debug, Deserialize)]
pub struct Story {
    pub id: serde_json::Value,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub vote_count: Option<u64>,
    #[serde(default)]
    pub comment_count: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MotdPage {
    #[serde(default)]
    pub motds: Vec<Motd>,
}

#[derive(Debug, Deserialize)]
pub struct Motd {
    pub message: String,
    #[serde(default)]
    pub upvote_count: Option<u64>,
}

pub fn stories_to_items(page: StoriesPage) -> Vec<FeedItem> {
    page.stories
        .into_iter()
        .take(MAX_DIGEST_ITEMS)
        .map(|s| {
            let link = s.url.filter(|u| !u.trim().is_empty()).unwrap_or_else(|| {
                let id = match &s.id {
                    serde_json::Value::String(id) => id.clone(),
                    other => other.to_string(),
                };
                format!("{SITE}/stories/{id}")
            });
            FeedItem::new(s.title, link).with_summary(format!(
                "{} points | {} comments",
                s.vote_count.unwrap_or(0),
                s.comment_count.unwrap_or(0)
            ))
        })
        .collect()
}

pub fn motd_to_items(page: MotdPage) -> Vec<FeedItem> {
    page.motds
        .into_iter()
        .filter(|m| !m.message.trim().is_empty())
        .take(1)
        .map(|m| {
            FeedItem::new(m.message, SITE)
                .with_summary(format!("{} upvotes", m.upvote_count.unwrap_or(0)))
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct DesignerNewsClient {
    http: reqwest::Client,
    api_base: String,
}

impl DesignerNewsClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn categories() -> CategorySet {
        CategorySet::new([STORIES, MOTD])
    }
}

#[async_trait]
impl FeedClient for DesignerNewsClient {
    async fn fetch(&self, category: Option<&str>) -> Result<Vec<FeedItem>> {
        match category.unwrap_or(STORIES) {
            STORIES => {
                let url = format!("{}/stories?limit={MAX_DIGEST_ITEMS}", self.api_base);
                let page: StoriesPage = get_json(&self.http, FEED_NAME, &url).await?;
                Ok(stories_to_items(page))
            }
            MOTD => {
                let url = format!("{}/motds", self.api_base);
                let page: MotdPage = get_json(&self.http, FEED_NAME, &url).await?;
                Ok(motd_to_items(page))
            }
            other => Err(Error::InvalidCategory {
                feed: FEED_NAME.to_string(),
                category: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stories_fall_back_to_discussion_link() {
        let page: StoriesPage = serde_json::from_str(
            r#"{"stories":[
                {"id":"17","title":"Grids are back","url":"https://grids.example","vote_count":5,"comment_count":2},
                {"id":18,"title":"Discussion: kerning","url":null}
            ]}"#,
        )
        .unwrap();
        let items = stories_to_items(page);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].link, "https://grids.example");
        assert_eq!(items[0].summary.as_deref(), Some("5 points | 2 comments"));
        assert_eq!(items[1].link, "https://www.designernews.co/stories/18");
    }

    #[test]
    fn motd_keeps_only_the_current_message() {
        let page: MotdPage = serde_json::from_str(
            r#"{"motds":[{"message":"Ship it","upvote_count":3},{"message":"older"}]}"#,
        )
        .unwrap();
        let items = motd_to_items(page);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Ship it");
        assert_eq!(items[0].summary.as_deref(), Some("3 upvotes"));
    }

    #[test]
    fn categories_are_stories_then_motd() {
        let cats = DesignerNewsClient::categories();
        assert_eq!(cats.iter().collect::<Vec<_>>(), vec!["stories", "motd"]);
    }
}
