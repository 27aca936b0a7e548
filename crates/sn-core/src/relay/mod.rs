//! Relay-side helpers shared by chat adapters.

pub mod throttled;
