//! Source definitions and the startup registry.

use std::{collections::HashMap, sync::Arc};

use crate::{domain::SourceId, errors::Error, ports::FeedClient, Result};

/// The fixed, ordered set of category tokens a multi-category source accepts.
///
/// Empty for single-category sources.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategorySet(Vec<String>);

impl CategorySet {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for t in tokens {
            let t = t.as_ref().trim().to_lowercase();
            if !t.is_empty() && !out.contains(&t) {
                out.push(t);
            }
        }
        Self(out)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.0.iter().any(|c| c == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// How a source answers a category argument it does not recognize.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InvalidCategoryReply {
    /// Names the source and echoes the argument back.
    #[default]
    Named,
    /// A fixed "Invalid argument" line pointing at help.
    Generic,
}

/// Everything the core knows about one upstream source.
pub struct SourceSpec {
    pub id: SourceId,
    /// Human name used in help output and corrective messages (`BBC`).
    pub display_name: String,
    /// Name used in the "could not be reached" message (`the BBC`, `Firebase`).
    pub unreachable_name: String,
    header: String,
    categories: CategorySet,
    default_category: Option<String>,
    invalid_category_reply: InvalidCategoryReply,
    client: Arc<dyn FeedClient>,
}

impl std::fmt::Debug for SourceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceSpec")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("categories", &self.categories)
            .field("default_category", &self.default_category)
            .finish_non_exhaustive()
    }
}

impl SourceSpec {
    /// A source backed by one feed.
    pub fn single(
        token: &str,
        display_name: impl Into<String>,
        header: impl Into<String>,
        client: Arc<dyn FeedClient>,
    ) -> Self {
        let display_name = display_name.into();
        Self {
            id: SourceId::new(token.to_lowercase()),
            unreachable_name: display_name.clone(),
            display_name,
            header: header.into(),
            categories: CategorySet::default(),
            default_category: None,
            invalid_category_reply: InvalidCategoryReply::default(),
            client,
        }
    }

    /// A source with one feed per category. The digest header is
    /// `"{header} {category}"`.
    pub fn multi(
        token: &str,
        display_name: impl Into<String>,
        header: impl Into<String>,
        categories: CategorySet,
        client: Arc<dyn FeedClient>,
    ) -> Self {
        let mut spec = Self::single(token, display_name, header, client);
        spec.categories = categories;
        spec
    }

    pub fn with_unreachable_name(mut self, name: impl Into<String>) -> Self {
        self.unreachable_name = name.into();
        self
    }

    /// Category used when the command carries no argument.
    pub fn with_default_category(mut self, category: &str) -> Self {
        self.default_category = Some(category.trim().to_lowercase());
        self
    }

    pub fn with_invalid_category_reply(mut self, reply: InvalidCategoryReply) -> Self {
        self.invalid_category_reply = reply;
        self
    }

    pub fn invalid_category_reply(&self) -> InvalidCategoryReply {
        self.invalid_category_reply
    }

    pub fn is_multi_category(&self) -> bool {
        !self.categories.is_empty()
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    pub fn client(&self) -> &Arc<dyn FeedClient> {
        &self.client
    }

    pub fn header_for(&self, category: &str) -> String {
        if category.is_empty() {
            self.header.clone()
        } else {
            format!("{} {}", self.header, category)
        }
    }

    /// Normalize a raw command argument into the category component of a cache key.
    ///
    /// Single-category sources ignore the argument. Multi-category sources
    /// match case-insensitively and fall back to the default category when
    /// the argument is empty.
    pub fn resolve_category(&self, raw: &str) -> Result<String> {
        if !self.is_multi_category() {
            return Ok(String::new());
        }

        let wanted = raw.trim().to_lowercase();
        let wanted = match (wanted.is_empty(), &self.default_category) {
            (true, Some(default)) => default.clone(),
            _ => wanted,
        };

        if self.categories.contains(&wanted) {
            Ok(wanted)
        } else {
            Err(Error::InvalidCategory {
                feed: self.id.0.clone(),
                category: raw.trim().to_string(),
            })
        }
    }

    /// Every cache key category this source can ever produce.
    pub fn key_categories(&self) -> Vec<String> {
        if self.is_multi_category() {
            self.categories.iter().map(str::to_string).collect()
        } else {
            vec![String::new()]
        }
    }
}

/// Registered sources, in registration order. Fixed after startup.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<SourceSpec>>,
    by_token: HashMap<String, usize>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: SourceSpec) -> Result<()> {
        let token = spec.id.0.clone();
        if token.trim().is_empty() || token.contains(char::is_whitespace) {
            return Err(Error::Config(format!("invalid source token: {token:?}")));
        }
        if matches!(token.as_str(), "help") {
            return Err(Error::Config("source token `help` is reserved".to_string()));
        }
        if self.by_token.contains_key(&token) {
            return Err(Error::Config(format!("duplicate source token: {token}")));
        }
        if let Some(default) = &spec.default_category {
            if !spec.categories.contains(default) {
                return Err(Error::Config(format!(
                    "default category {default:?} is not a category of {token}"
                )));
            }
        }

        self.by_token.insert(token, self.sources.len());
        self.sources.push(Arc::new(spec));
        Ok(())
    }

    pub fn get(&self, token: &str) -> Option<&Arc<SourceSpec>> {
        self.by_token.get(token).map(|&idx| &self.sources[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<SourceSpec>> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeedItem;
    use async_trait::async_trait;

    struct NoFeed;

    #[async_trait]
    impl FeedClient for NoFeed {
        async fn fetch(&self, _category: Option<&str>) -> Result<Vec<FeedItem>> {
            Ok(Vec::new())
        }
    }

    fn demo() -> SourceSpec {
        SourceSpec::multi(
            "demo",
            "Demo",
            "Top Stories from Demo",
            CategorySet::new(["alpha", "Beta"]),
            Arc::new(NoFeed),
        )
    }

    #[test]
    fn category_set_normalizes_and_dedupes() {
        let set = CategorySet::new([" Alpha", "alpha", "", "BETA"]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["alpha", "beta"]);
    }

    #[test]
    fn resolve_category_is_case_insensitive() {
        let spec = demo();
        assert_eq!(spec.resolve_category("ALPHA").unwrap(), "alpha");
        assert_eq!(spec.resolve_category(" beta ").unwrap(), "beta");
    }

    #[test]
    fn resolve_category_rejects_unknown_and_empty_without_default() {
        let spec = demo();
        assert!(matches!(
            spec.resolve_category("gamma"),
            Err(Error::InvalidCategory { ref category, .. }) if category == "gamma"
        ));
        assert!(matches!(
            spec.resolve_category(""),
            Err(Error::InvalidCategory { .. })
        ));
    }

    #[test]
    fn resolve_category_uses_default_when_empty() {
        let spec = demo().with_default_category("beta");
        assert_eq!(spec.resolve_category("").unwrap(), "beta");
    }

    #[test]
    fn single_category_sources_ignore_argument() {
        let spec = SourceSpec::single("hn", "Hacker News", "Top", Arc::new(NoFeed));
        assert_eq!(spec.resolve_category("whatever").unwrap(), "");
        assert_eq!(spec.key_categories(), vec![String::new()]);
    }

    #[test]
    fn header_appends_category() {
        assert_eq!(demo().header_for("alpha"), "Top Stories from Demo alpha");
        assert_eq!(demo().header_for(""), "Top Stories from Demo");
    }

    #[test]
    fn registry_rejects_duplicates_and_bad_defaults() {
        let mut reg = SourceRegistry::new();
        reg.register(demo()).unwrap();
        assert!(matches!(reg.register(demo()), Err(Error::Config(_))));

        let bad = SourceSpec::multi(
            "other",
            "Other",
            "Top",
            CategorySet::new(["a"]),
            Arc::new(NoFeed),
        )
        .with_default_category("b");
        assert!(matches!(reg.register(bad), Err(Error::Config(_))));
        assert_eq!(reg.len(), 1);
        assert!(reg.get("demo").is_some());
    }
}
