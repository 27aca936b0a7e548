/// Core error type for the service.
///
/// Adapter crates should map their specific errors into this type so the
/// dispatcher can turn every failure into a user-facing message consistently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid category for {feed}: {category:?}")]
    InvalidCategory { feed: String, category: String },

    #[error("unknown source: {0:?}")]
    UnknownSource(String),

    #[error("upstream fetch failed for {feed}: {message}")]
    Upstream { feed: String, message: String },

    #[error("relay error: {0}")]
    Relay(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    pub fn upstream(feed: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Upstream {
            feed: feed.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
