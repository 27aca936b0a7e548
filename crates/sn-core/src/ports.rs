use async_trait::async_trait;

use crate::{domain::FeedItem, Result};

/// Hexagonal port for an upstream news feed.
///
/// Single-category and multi-category sources share this one shape: the
/// category is `None` for the former and a validated, lower-cased token for
/// the latter. Implementations own their network deadline; the core never
/// retries a failed call.
#[async_trait]
pub trait FeedClient: Send + Sync {
    async fn fetch(&self, category: Option<&str>) -> Result<Vec<FeedItem>>;
}

/// Hexagonal port for relaying a finished digest to a chat channel.
#[async_trait]
pub trait RelayPort: Send + Sync {
    async fn post(&self, text: &str, channel: &str) -> Result<()>;
}
