use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{ports::RelayPort, Result};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* two posts through this relay.
    pub global_min_interval: Duration,
    /// Minimum spacing between posts to the same channel.
    pub per_channel_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        // Slack incoming webhooks allow roughly one message per second.
        Self {
            global_min_interval: Duration::from_millis(50),
            per_channel_min_interval: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return the wait duration required before executing.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }
}

/// RelayPort decorator that spaces outbound posts.
///
/// Best-effort: it reduces rate-limit rejections from the chat platform but
/// does not retry the ones that still happen.
pub struct ThrottledRelay {
    inner: Arc<dyn RelayPort>,
    cfg: ThrottleConfig,
    global: Mutex<IntervalLimiter>,
    per_channel: Mutex<HashMap<String, Arc<Mutex<IntervalLimiter>>>>,
}

impl ThrottledRelay {
    pub fn new(inner: Arc<dyn RelayPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval)),
            per_channel: Mutex::new(HashMap::new()),
        }
    }

    async fn limiter_for_channel(&self, channel: &str) -> Arc<Mutex<IntervalLimiter>> {
        let mut map = self.per_channel.lock().await;
        if !map.contains_key(channel) {
            prune_idle(&mut map, Instant::now());
        }
        map.entry(channel.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(IntervalLimiter::new(
                    self.cfg.per_channel_min_interval,
                )))
            })
            .clone()
    }

    async fn throttle_channel(&self, channel: &str) {
        let global_wait = { self.global.lock().await.reserve() };
        let channel_wait = {
            let lim = self.limiter_for_channel(channel).await;
            let mut guard = lim.lock().await;
            guard.reserve()
        };

        let wait = global_wait.max(channel_wait);
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }
}

/// Drop limiters whose reserved slot has passed and that no post is using;
/// a fresh limiter behaves identically.
fn prune_idle(map: &mut HashMap<String, Arc<Mutex<IntervalLimiter>>>, now: Instant) {
    map.retain(|_, lim| {
        Arc::strong_count(lim) > 1 || lim.try_lock().map_or(true, |l| l.next > now)
    });
}

#[async_trait::async_trait]
impl RelayPort for ThrottledRelay {
    async fn post(&self, text: &str, channel: &str) -> Result<()> {
        self.throttle_channel(channel).await;
        self.inner.post(text, channel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingRelay {
        posts: StdMutex<Vec<(String, Instant)>>,
    }

    #[async_trait::async_trait]
    impl RelayPort for RecordingRelay {
        async fn post(&self, _text: &str, channel: &str) -> Result<()> {
            self.posts
                .lock()
                .unwrap()
                .push((channel.to_string(), Instant::now()));
            Ok(())
        }
    }

    fn cfg() -> ThrottleConfig {
        ThrottleConfig {
            global_min_interval: Duration::ZERO,
            per_channel_min_interval: Duration::from_secs(1),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn spaces_posts_to_the_same_channel() {
        let inner = Arc::new(RecordingRelay::default());
        let relay = ThrottledRelay::new(inner.clone(), cfg());

        let start = Instant::now();
        relay.post("a", "#general").await.unwrap();
        relay.post("b", "#general").await.unwrap();

        let posts = inner.posts.lock().unwrap().clone();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].1, start);
        assert!(posts[1].1 >= start + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_channel_limiters_are_pruned() {
        let inner = Arc::new(RecordingRelay::default());
        let relay = ThrottledRelay::new(inner.clone(), cfg());

        relay.post("a", "#general").await.unwrap();
        relay.post("b", "#random").await.unwrap();
        assert_eq!(relay.per_channel.lock().await.len(), 2);

        tokio::time::advance(Duration::from_secs(2)).await;
        relay.post("c", "@alice").await.unwrap();
        let channels: Vec<String> = relay.per_channel.lock().await.keys().cloned().collect();
        assert_eq!(channels, vec!["@alice".to_string()]);

        // A channel still inside its interval keeps its limiter.
        relay.post("d", "#general").await.unwrap();
        assert_eq!(relay.per_channel.lock().await.len(), 2);
        let start = Instant::now();
        relay.post("e", "#general").await.unwrap();
        assert!(Instant::now() >= start + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn different_channels_are_independent() {
        let inner = Arc::new(RecordingRelay::default());
        let relay = ThrottledRelay::new(inner.clone(), cfg());

        let start = Instant::now();
        relay.post("a", "#general").await.unwrap();
        relay.post("b", "@alice").await.unwrap();

        let posts = inner.posts.lock().unwrap().clone();
        assert!(posts.iter().all(|(_, at)| *at == start));
    }
}
