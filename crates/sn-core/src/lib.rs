//! Core domain + application logic for the Slacker News slash-command service.
//!
//! This crate is intentionally framework-agnostic. Upstream feeds and the Slack
//! relay live behind ports (traits) implemented in adapter crates.

pub mod cache;
pub mod config;
pub mod digest;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod ports;
pub mod relay;
pub mod source;

pub use errors::{Error, Result};
