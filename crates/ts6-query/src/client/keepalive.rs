//! Per-session keepalive.
//!
//! Each session gets its own task, bound to the session's cancellation token.
//! Replacing or closing the session cancels the token and ends the task, so
//! at most one keepalive runs per live session.

use std::sync::Weak;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::model::KEEPALIVE;

use super::{SessionSlot, Shared};

pub(super) async fn run(
    shared: Weak<Shared>,
    slot: Weak<SessionSlot>,
    token: CancellationToken,
    session_id: u64,
    every: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let Some(slot) = slot.upgrade() else {
            return;
        };
        let result = tokio::select! {
            _ = token.cancelled() => return,
            result = async {
                let mut session = slot.session.lock().await;
                session.execute(KEEPALIVE).await
            } => result,
        };
        drop(slot);

        match result {
            Ok(_) => trace!(session = session_id, "keepalive ok"),
            Err(e) => {
                if token.is_cancelled() {
                    return;
                }
                warn!(session = session_id, error = %e, "keepalive failed, reconnecting");
                let Some(shared) = shared.upgrade() else {
                    return;
                };
                if let Err(e) = shared.ensure_session(Some(session_id)).await {
                    warn!(session = session_id, error = %e, "keepalive reconnect failed");
                }
                return;
            }
        }
    }
}
