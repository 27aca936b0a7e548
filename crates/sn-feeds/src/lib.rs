//! Upstream feed adapters.
//!
//! This crate implements the `sn-core` FeedClient port over HTTP: RSS/Atom
//! feeds, the Hacker News Firebase API and the Designer News API.

pub mod catalog;
pub mod designer_news;
pub mod hacker_news;
pub mod http;
pub mod rss;

pub use catalog::default_registry;
