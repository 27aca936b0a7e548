use serde::Serialize;

use sn_core::cache::SlotStatus;

use crate::router::AppState;

#[derive(Debug, Serialize)]
pub(super) struct StatusBody {
    expiration_secs: u64,
    relay_enabled: bool,
    slots: Vec<SlotStatus>,
}

pub(super) fn build_status(state: &AppState) -> StatusBody {
    let cache = state.dispatcher.cache();
    StatusBody {
        expiration_secs: cache.window().as_secs(),
        relay_enabled: state.relay.is_some(),
        slots: cache.snapshot(),
    }
}
