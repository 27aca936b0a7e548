//! The sources the `/news` command knows about.

use std::sync::Arc;

use sn_core::{
    config::Config,
    source::{InvalidCategoryReply, SourceRegistry, SourceSpec},
    Result,
};

use crate::{
    designer_news::DesignerNewsClient, hacker_news::HackerNewsClient, http::build_client,
    rss::RssFeed,
};

const PRODUCT_HUNT_FEED: &str = "https://www.producthunt.com/feed";
const VICE_FEED: &str = "https://www.vice.com/en/rss";

const BBC_NEWS: [(&str, &str); 10] = [
    ("top", "https://feeds.bbci.co.uk/news/rss.xml"),
    ("world", "https://feeds.bbci.co.uk/news/world/rss.xml"),
    ("uk", "https://feeds.bbci.co.uk/news/uk/rss.xml"),
    ("business", "https://feeds.bbci.co.uk/news/business/rss.xml"),
    ("politics", "https://feeds.bbci.co.uk/news/politics/rss.xml"),
    ("health", "https://feeds.bbci.co.uk/news/health/rss.xml"),
    ("education", "https://feeds.bbci.co.uk/news/education/rss.xml"),
    (
        "science",
        "https://feeds.bbci.co.uk/news/science_and_environment/rss.xml",
    ),
    ("technology", "https://feeds.bbci.co.uk/news/technology/rss.xml"),
    (
        "entertainment",
        "https://feeds.bbci.co.uk/news/entertainment_and_arts/rss.xml",
    ),
];

const BBC_SPORT: [(&str, &str); 7] = [
    ("sport", "https://feeds.bbci.co.uk/sport/rss.xml"),
    ("football", "https://feeds.bbci.co.uk/sport/football/rss.xml"),
    ("cricket", "https://feeds.bbci.co.uk/sport/cricket/rss.xml"),
    ("formula1", "https://feeds.bbci.co.uk/sport/formula1/rss.xml"),
    ("rugby-union", "https://feeds.bbci.co.uk/sport/rugby-union/rss.xml"),
    ("tennis", "https://feeds.bbci.co.uk/sport/tennis/rss.xml"),
    ("golf", "https://feeds.bbci.co.uk/sport/golf/rss.xml"),
];

const FIVETHIRTYEIGHT: [(&str, &str); 6] = [
    ("all", "https://fivethirtyeight.com/all/feed"),
    ("politics", "https://fivethirtyeight.com/politics/feed/"),
    ("economics", "https://fivethirtyeight.com/economics/feed/"),
    ("sports", "https://fivethirtyeight.com/sports/feed/"),
    ("science", "https://fivethirtyeight.com/science/feed/"),
    ("life", "https://fivethirtyeight.com/life/feed/"),
];

/// Build the registry of every supported source, sharing one HTTP client
/// whose timeout is the configured fetch deadline.
pub fn default_registry(cfg: &Config) -> Result<SourceRegistry> {
    let http = build_client(cfg.fetch_timeout, &cfg.user_agent)?;
    let mut reg = SourceRegistry::new();

    reg.register(
        SourceSpec::single(
            "hn",
            "Hacker News",
            "Top Stories from <https://news.ycombinator.com|Hacker News>",
            Arc::new(HackerNewsClient::new(http.clone())),
        )
        .with_unreachable_name("Firebase"),
    )?;

    reg.register(SourceSpec::single(
        "ph",
        "Product Hunt",
        "Top Posts from <https://www.producthunt.com|Product Hunt>",
        Arc::new(RssFeed::single("product-hunt", http.clone(), PRODUCT_HUNT_FEED)),
    ))?;

    reg.register(SourceSpec::single(
        "vice",
        "Vice News",
        "Top Stories from <https://www.vice.com|Vice News>",
        Arc::new(RssFeed::single("vice", http.clone(), VICE_FEED)),
    ))?;

    reg.register(
        SourceSpec::multi(
            "dn",
            "Designer News",
            "Top from <https://www.designernews.co|Designer News>",
            DesignerNewsClient::categories(),
            Arc::new(DesignerNewsClient::new(http.clone())),
        )
        .with_default_category(crate::designer_news::STORIES)
        .with_invalid_category_reply(InvalidCategoryReply::Generic),
    )?;

    let fte = RssFeed::by_category("fivethirtyeight", http.clone(), FIVETHIRTYEIGHT);
    reg.register(SourceSpec::multi(
        "538",
        "FiveThirtyEight",
        "Top Stories from FiveThirtyEight",
        fte.categories(),
        Arc::new(fte),
    ))?;

    let bbc = RssFeed::by_category("bbc", http, BBC_NEWS.into_iter().chain(BBC_SPORT));
    reg.register(
        SourceSpec::multi(
            "bbc",
            "BBC",
            "Top Stories from BBC",
            bbc.categories(),
            Arc::new(bbc),
        )
        .with_unreachable_name("the BBC"),
    )?;

    Ok(reg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> Config {
        Config::from_lookup(|_| None, &[]).unwrap()
    }

    #[test]
    fn registers_every_source_in_help_order() {
        let reg = default_registry(&cfg()).unwrap();
        let tokens: Vec<&str> = reg.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(tokens, vec!["hn", "ph", "vice", "dn", "538", "bbc"]);
    }

    #[test]
    fn bbc_lists_news_before_sport() {
        let reg = default_registry(&cfg()).unwrap();
        let bbc = reg.get("bbc").unwrap();
        let cats: Vec<&str> = bbc.categories().iter().collect();
        assert_eq!(cats.first(), Some(&"top"));
        assert_eq!(cats.len(), BBC_NEWS.len() + BBC_SPORT.len());
        assert!(cats.iter().position(|c| *c == "technology") < cats.iter().position(|c| *c == "football"));
        assert!(bbc.resolve_category("").is_err());
    }

    #[test]
    fn designer_news_defaults_to_stories() {
        let reg = default_registry(&cfg()).unwrap();
        assert_eq!(reg.get("dn").unwrap().resolve_category("").unwrap(), "stories");
        assert_eq!(reg.get("dn").unwrap().resolve_category("MOTD").unwrap(), "motd");
        assert_eq!(
            reg.get("dn").unwrap().invalid_category_reply(),
            InvalidCategoryReply::Generic
        );
        assert_eq!(
            reg.get("bbc").unwrap().invalid_category_reply(),
            InvalidCategoryReply::Named
        );
    }
}
