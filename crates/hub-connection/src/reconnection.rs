//! Mid-session reconnect loop.
//!
//! Runs after an established connection drops. Walks the handle's
//! [`MidSessionPolicy`](crate::policy::MidSessionPolicy) with its own retry
//! index; the lifecycle manager's attempt counter is never touched here.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::factory::ConnectionHandle;
use crate::transport::{Connector, Session};

/// How a reconnect loop ended.
pub(crate) enum Reconnect<L> {
    Restored(Session<L>),
    Exhausted,
    Cancelled,
}

impl<C: Connector> ConnectionHandle<C> {
    /// Retries the connection once per scheduled delay until one attempt
    /// succeeds, the schedule runs out or `cancel` fires.
    pub(crate) async fn reconnect(&self, cancel: &CancellationToken) -> Reconnect<C::Link> {
        let policy = self.mid_session_policy();

        for (retry, delay) in policy.delays().iter().copied().enumerate() {
            let attempt = retry + 1;
            info!(
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "reconnecting"
            );

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("reconnect cancelled");
                    return Reconnect::Cancelled;
                }
                () = tokio::time::sleep(delay) => {}
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("reconnect cancelled mid-attempt");
                    return Reconnect::Cancelled;
                }
                result = self.open() => result,
            };

            match result {
                Ok(session) => {
                    info!(attempt, "reconnected");
                    return Reconnect::Restored(session);
                }
                Err(e) => warn!(attempt, error = %e, "reconnect attempt failed"),
            }
        }

        warn!(
            retries = policy.delays().len(),
            "reconnect schedule exhausted"
        );
        Reconnect::Exhausted
    }
}
