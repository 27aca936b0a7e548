//! Command dispatch: command text → source/category → cached digest or a
//! user-facing message.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    cache::ResponseCache,
    domain::CacheKey,
    errors::Error,
    source::{InvalidCategoryReply, SourceRegistry, SourceSpec},
};

/// What kind of text a [`Reply`] carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyKind {
    /// A digest, already prefixed with the caller banner.
    Digest,
    Help,
    UnknownSource,
    InvalidCategory,
    UpstreamFetchFailed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub kind: ReplyKind,
    pub text: String,
}

impl Reply {
    fn new(kind: ReplyKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn is_digest(&self) -> bool {
        self.kind == ReplyKind::Digest
    }
}

/// Split command text into a lower-cased source token and the trimmed rest.
pub fn tokenize(text: &str) -> (String, String) {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let source = parts.next().unwrap_or("").trim().to_lowercase();
    let rest = parts.next().unwrap_or("").trim().to_string();
    (source, rest)
}

pub struct Dispatcher {
    registry: Arc<SourceRegistry>,
    cache: Arc<ResponseCache>,
    command: String,
}

impl Dispatcher {
    /// `command` is the slash command users type (`/news`); it only appears
    /// in corrective messages.
    pub fn new(
        registry: Arc<SourceRegistry>,
        cache: Arc<ResponseCache>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            cache,
            command: command.into(),
        }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Tokenize `text` and dispatch it.
    pub async fn handle_command(&self, text: &str, banner: &str) -> Reply {
        let (source, argument) = tokenize(text);
        self.handle(&source, &argument, banner).await
    }

    pub async fn handle(&self, source_token: &str, raw_argument: &str, banner: &str) -> Reply {
        let token = source_token.trim().to_lowercase();
        if token.is_empty() || token == "help" {
            return Reply::new(ReplyKind::Help, self.help());
        }

        let Some(source) = self.registry.get(&token) else {
            let received = format!("{token} {}", raw_argument.trim());
            info!(token = %token, "unknown source requested");
            return Reply::new(
                ReplyKind::UnknownSource,
                format!(
                    "Hmm.. I can't figure out what news you are looking for :( I received \"{}\"\n\n{}",
                    received.trim(),
                    self.help()
                ),
            );
        };

        let category = match source.resolve_category(raw_argument) {
            Ok(c) => c,
            Err(_) => {
                info!(source = %source.id, argument = raw_argument, "invalid category");
                return self.invalid_category(source, raw_argument);
            }
        };

        let key = CacheKey::new(source.id.clone(), category);
        match self.cache.get(&key).await {
            Ok(digest) => Reply::new(ReplyKind::Digest, format!("{banner}{digest}")),
            Err(Error::InvalidCategory { .. }) => self.invalid_category(source, raw_argument),
            Err(e) => {
                warn!(%key, error = %e, "digest unavailable");
                Reply::new(
                    ReplyKind::UpstreamFetchFailed,
                    format!(
                        "Server Error - {} could not be reached",
                        source.unreachable_name
                    ),
                )
            }
        }
    }

    /// One line per source: `Name: token [cat1, cat2]`.
    pub fn help(&self) -> String {
        let mut out = String::new();
        for source in self.registry.iter() {
            out.push_str(&source.display_name);
            out.push_str(": ");
            out.push_str(source.id.as_str());
            if source.is_multi_category() {
                let cats = source.categories().iter().collect::<Vec<_>>().join(", ");
                out.push_str(&format!(" [{cats}]"));
            }
            out.push('\n');
        }
        out
    }

    fn invalid_category(&self, source: &SourceSpec, raw_argument: &str) -> Reply {
        let text = match source.invalid_category_reply() {
            InvalidCategoryReply::Named => format!(
                "That is an invalid {} category: {}\nTry `{} help` to view all sources.",
                source.display_name,
                raw_argument.trim(),
                self.command
            ),
            InvalidCategoryReply::Generic => format!(
                "Invalid argument - try `{} help` to view valid selections.",
                self.command
            ),
        };
        Reply::new(ReplyKind::InvalidCategory, text)
    }
}
