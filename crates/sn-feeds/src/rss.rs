//! RSS 2.0 / Atom feeds, one URL per category.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use roxmltree::{Document, Node};

use sn_core::{
    digest::MAX_DIGEST_ITEMS, domain::FeedItem, errors::Error, ports::FeedClient,
    source::CategorySet, Result,
};

use crate::http::get_text;

const MAX_SUMMARY_CHARS: usize = 300;

/// A feed client backed by one RSS/Atom URL, or one URL per category.
#[derive(Clone, Debug)]
pub struct RssFeed {
    name: String,
    http: reqwest::Client,
    single: Option<String>,
    by_category: Vec<(String, String)>,
}

impl RssFeed {
    pub fn single(name: impl Into<String>, http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            http,
            single: Some(url.into()),
            by_category: Vec::new(),
        }
    }

    /// Category tokens are matched lower-cased; order is kept for help output.
    pub fn by_category<I, C, U>(name: impl Into<String>, http: reqwest::Client, feeds: I) -> Self
    where
        I: IntoIterator<Item = (C, U)>,
        C: Into<String>,
        U: Into<String>,
    {
        Self {
            name: name.into(),
            http,
            single: None,
            by_category: feeds
                .into_iter()
                .map(|(c, u)| (c.into().to_lowercase(), u.into()))
                .collect(),
        }
    }

    pub fn categories(&self) -> CategorySet {
        CategorySet::new(self.by_category.iter().map(|(c, _)| c.as_str()))
    }

    fn url_for(&self, category: Option<&str>) -> Result<&str> {
        let url = match category {
            None => self.single.as_deref(),
            Some(c) => self
                .by_category
                .iter()
                .find(|(cat, _)| cat == c)
                .map(|(_, url)| url.as_str()),
        };
        url.ok_or_else(|| Error::InvalidCategory {
            feed: self.name.clone(),
            category: category.unwrap_or("").to_string(),
        })
    }
}

#[async_trait]
impl FeedClient for RssFeed {
    async fn fetch(&self, category: Option<&str>) -> Result<Vec<FeedItem>> {
        let url = self.url_for(category)?;
        let body = get_text(&self.http, &self.name, url).await?;
        parse_feed(&body).map_err(|e| Error::upstream(&self.name, e))
    }
}

/// Parse the first [`MAX_DIGEST_ITEMS`] `<item>` (RSS) or `<entry>` (Atom) elements.
pub fn parse_feed(xml: &str) -> std::result::Result<Vec<FeedItem>, String> {
    let doc = Document::parse(xml).map_err(|e| format!("invalid feed xml: {e}"))?;

    let root = doc.root_element().tag_name().name();
    if !matches!(root, "rss" | "feed" | "RDF") {
        return Err(format!("unexpected feed root element <{root}>"));
    }

    let items = doc
        .descendants()
        .filter(|n| n.has_tag_name("item") || n.has_tag_name("entry"))
        .take(MAX_DIGEST_ITEMS)
        .map(|node| {
            let title = child_text(&node, &["title"]).unwrap_or_else(|| "Untitled".to_string());
            let link = child_link(&node).unwrap_or_default();
            let mut item = FeedItem::new(clean_text(&title), link.trim());
            if let Some(summary) = child_text(&node, &["description", "summary", "content"]) {
                let summary = truncate_chars(&clean_text(&summary), MAX_SUMMARY_CHARS);
                if !summary.is_empty() {
                    item = item.with_summary(summary);
                }
            }
            item
        })
        .collect();

    Ok(items)
}

fn child_text(node: &Node<'_, '_>, names: &[&str]) -> Option<String> {
    for child in node.children().filter(|c| c.is_element()) {
        if !names.iter().any(|n| child.tag_name().name() == *n) {
            continue;
        }
        // CDATA and text nodes both surface as text children.
        let text: String = child
            .children()
            .filter_map(|c| c.text())
            .collect::<Vec<_>>()
            .concat();
        if !text.trim().is_empty() {
            return Some(text.trim().to_string());
        }
    }
    None
}

fn child_link(node: &Node<'_, '_>) -> Option<String> {
    let mut fallback = None;
    for child in node.children().filter(|c| c.has_tag_name("link")) {
        // Atom: <link rel="alternate" href="..."/>
        if let Some(href) = child.attribute("href") {
            match child.attribute("rel") {
                None | Some("alternate") => return Some(href.to_string()),
                _ => {
                    fallback.get_or_insert_with(|| href.to_string());
                }
            }
            continue;
        }
        // RSS: <link>https://...</link>
        if let Some(text) = child.text().map(str::trim).filter(|t| !t.is_empty()) {
            return Some(text.to_string());
        }
    }
    fallback.or_else(|| child_text(node, &["guid", "id"]).filter(|g| g.starts_with("http")))
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("static regex"))
}

/// Strip markup, decode the entities feeds double-escape, collapse whitespace.
pub fn clean_text(raw: &str) -> String {
    let stripped = tag_regex().replace_all(raw, " ");
    let decoded = decode_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(s: &str) -> String {
    const ENTITIES: [(&str, &str); 10] = [
        ("&nbsp;", " "),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&#039;", "'"),
        ("&apos;", "'"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&#8217;", "\u{2019}"),
        ("&#8220;", "\u{201c}"),
        ("&#8221;", "\u{201d}"),
    ];

    let mut out = s.to_string();
    for (entity, ch) in ENTITIES {
        out = out.replace(entity, ch);
    }
    // Last, so `&amp;lt;` stays `&lt;`.
    out.replace("&amp;", "&")
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push('…');
    out
}
