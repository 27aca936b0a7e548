use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use sn_core::{
    cache::ResponseCache,
    config::Config,
    dispatch::Dispatcher,
    ports::RelayPort,
    relay::throttled::{ThrottleConfig, ThrottledRelay},
};
use sn_slack::{router::AppState, SlackWebhook};

#[tokio::main]
async fn main() -> Result<(), sn_core::Error> {
    sn_core::logging::init("sn")?;

    let cfg = Arc::new(Config::load()?);

    let registry = Arc::new(sn_feeds::default_registry(&cfg)?);
    let cache = Arc::new(ResponseCache::new(&registry, cfg.cache_expiration)?);
    let dispatcher = Arc::new(Dispatcher::new(registry, cache, cfg.slash_command.clone()));

    let relay: Option<Arc<dyn RelayPort>> = match &cfg.webhook_url {
        Some(url) => {
            let webhook: Arc<dyn RelayPort> = Arc::new(SlackWebhook::new(url, cfg.fetch_timeout)?);
            let throttled: Arc<dyn RelayPort> = Arc::new(ThrottledRelay::new(
                webhook,
                ThrottleConfig {
                    per_channel_min_interval: cfg.relay_min_interval,
                    ..ThrottleConfig::default()
                },
            ));
            Some(throttled)
        }
        None => {
            warn!("WEBHOOK_URL not set; digests are returned in the HTTP response");
            None
        }
    };

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("ctrl-c received; shutting down");
                    shutdown.cancel();
                }
                Err(e) => warn!(error = %e, "cannot listen for ctrl-c; graceful shutdown disabled"),
            }
        });
    }

    let state = Arc::new(AppState {
        cfg,
        dispatcher,
        relay,
    });

    sn_slack::router::run_server(state, shutdown)
        .await
        .map_err(|e| sn_core::Error::External(format!("http server failed: {e}")))?;

    Ok(())
}
