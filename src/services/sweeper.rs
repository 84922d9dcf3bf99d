//! Background sweep dropping sessions that have been idle past their TTL,
//! bounding memory growth without any per-session timers.

use tokio::time::{MissedTickBehavior, interval};
use tracing::info;

use crate::state::SharedState;

/// Periodically remove idle sessions. Runs for the lifetime of the process.
pub async fn run(state: SharedState) {
    let ttl = state.config().session_ttl();
    let mut ticker = interval(state.config().sweep_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let removed = state.sweep_idle(ttl).await;
        if removed > 0 {
            info!(
                removed,
                remaining = state.session_count(),
                "swept idle quiz sessions"
            );
        }
    }
}
