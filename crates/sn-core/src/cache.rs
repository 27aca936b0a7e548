//! Per-source, per-category digest cache with lazy expiration.
//!
//! Every key a registered source can produce gets its own slot at
//! construction time, so lookups never take a lock shared across keys.
//! Within a slot, the first caller to find the digest expired performs the
//! fetch while holding the slot's lock; callers queued behind it receive the
//! outcome of that same fetch instead of starting another one.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex as StdMutex, PoisonError,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, info, warn};

use crate::{
    digest::format_digest,
    domain::CacheKey,
    errors::Error,
    source::{SourceRegistry, SourceSpec},
    Result,
};

/// Outcome of one settled fetch, shared with every caller that waited on it.
type Outcome = std::result::Result<String, String>;

#[derive(Debug, Default)]
struct CacheEntry {
    digest: String,
    stamp: Stamp,
    last_outcome: Option<Outcome>,
}

/// When the stored digest was computed.
#[derive(Clone, Copy, Debug, Default)]
struct Stamp {
    /// `None` until the first successful fetch, i.e. always expired.
    last_computed: Option<Instant>,
    computed_at: Option<DateTime<Utc>>,
}

impl Stamp {
    fn is_expired(&self, now: Instant, window: Duration) -> bool {
        match self.last_computed {
            Some(at) => now.saturating_duration_since(at) > window,
            None => true,
        }
    }
}

struct Slot {
    source: Arc<SourceSpec>,
    /// Number of fetches that have settled for this key. Read before queueing
    /// on `entry` so a waiter can tell whether a fetch finished meanwhile.
    settled: AtomicU64,
    entry: Mutex<CacheEntry>,
    /// Copy of `entry.stamp`, readable without queueing behind a fetch.
    published: StdMutex<Stamp>,
    refreshing: AtomicBool,
}

impl Slot {
    fn published(&self) -> Stamp {
        *self.published.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, stamp: Stamp) {
        *self.published.lock().unwrap_or_else(PoisonError::into_inner) = stamp;
    }
}

/// Marks a slot as refreshing until dropped, including when the fetching
/// request is cancelled.
struct RefreshGuard<'a>(&'a AtomicBool);

impl<'a> RefreshGuard<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Point-in-time view of one cache slot (for the status endpoint).
#[derive(Clone, Debug, Serialize)]
pub struct SlotStatus {
    pub source: String,
    pub category: String,
    pub has_digest: bool,
    pub computed_at: Option<DateTime<Utc>>,
    pub expired: bool,
    pub refreshing: bool,
}

pub struct ResponseCache {
    window: Duration,
    slots: BTreeMap<CacheKey, Slot>,
}

impl ResponseCache {
    /// Pre-create one expired entry for every key the registry can produce.
    pub fn new(registry: &SourceRegistry, window: Duration) -> Result<Self> {
        if window.is_zero() {
            return Err(Error::Config(
                "cache expiration window must be greater than zero".to_string(),
            ));
        }

        let mut slots = BTreeMap::new();
        for source in registry.iter() {
            for category in source.key_categories() {
                slots.insert(
                    CacheKey::new(source.id.clone(), category),
                    Slot {
                        source: source.clone(),
                        settled: AtomicU64::new(0),
                        entry: Mutex::new(CacheEntry::default()),
                        published: StdMutex::new(Stamp::default()),
                        refreshing: AtomicBool::new(false),
                    },
                );
            }
        }

        Ok(Self { window, slots })
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Return the digest for `key`, refetching it if the stored one is older
    /// than the expiration window.
    ///
    /// A failed fetch leaves the stored digest untouched and returns
    /// [`Error::Upstream`]; the stale digest is not served in its place.
    pub async fn get(&self, key: &CacheKey) -> Result<String> {
        let slot = self.slot(key)?;

        let ticket = slot.settled.load(Ordering::Acquire);
        let mut entry = slot.entry.lock().await;

        if slot.settled.load(Ordering::Acquire) != ticket {
            if let Some(outcome) = entry.last_outcome.clone() {
                debug!(%key, "sharing result of concurrent fetch");
                return outcome.map_err(|message| Error::Upstream {
                    feed: key.to_string(),
                    message,
                });
            }
        }

        if !entry.stamp.is_expired(Instant::now(), self.window) {
            debug!(%key, "cache hit");
            return Ok(entry.digest.clone());
        }

        info!(%key, "digest expired; fetching");
        let refreshing = RefreshGuard::start(&slot.refreshing);
        let outcome = fetch_digest(&slot.source, &key.category).await;
        let settled_at = Instant::now();

        match &outcome {
            Ok(digest) => {
                // Last completed fetch wins.
                if entry
                    .stamp
                    .last_computed
                    .map_or(true, |prev| settled_at >= prev)
                {
                    entry.digest = digest.clone();
                    entry.stamp = Stamp {
                        last_computed: Some(settled_at),
                        computed_at: Some(Utc::now()),
                    };
                    slot.publish(entry.stamp);
                }
                info!(%key, "digest refreshed");
            }
            Err(message) => warn!(%key, error = %message, "fetch failed; keeping previous digest"),
        }

        entry.last_outcome = Some(outcome.clone());
        slot.settled.fetch_add(1, Ordering::Release);
        drop(refreshing);

        outcome.map_err(|message| Error::Upstream {
            feed: key.to_string(),
            message,
        })
    }

    /// Status of every slot. Never waits on an in-flight fetch.
    pub fn snapshot(&self) -> Vec<SlotStatus> {
        let now = Instant::now();
        self.slots
            .iter()
            .map(|(key, slot)| {
                let stamp = slot.published();
                SlotStatus {
                    source: key.source.to_string(),
                    category: key.category.clone(),
                    has_digest: stamp.last_computed.is_some(),
                    computed_at: stamp.computed_at,
                    expired: stamp.is_expired(now, self.window),
                    refreshing: slot.refreshing.load(Ordering::Acquire),
                }
            })
            .collect()
    }

    fn slot(&self, key: &CacheKey) -> Result<&Slot> {
        if let Some(slot) = self.slots.get(key) {
            return Ok(slot);
        }

        let known_source = self.slots.keys().any(|k| k.source == key.source);
        if known_source {
            Err(Error::InvalidCategory {
                feed: key.source.to_string(),
                category: key.category.clone(),
            })
        } else {
            Err(Error::UnknownSource(key.source.to_string()))
        }
    }
}

async fn fetch_digest(source: &SourceSpec, category: &str) -> Outcome {
    let wanted = (!category.is_empty()).then_some(category);
    match source.client().fetch(wanted).await {
        Ok(items) => Ok(format_digest(&source.header_for(category), &items)),
        Err(Error::Upstream { message, .. }) => Err(message),
        Err(e) => Err(e.to_string()),
    }
}
