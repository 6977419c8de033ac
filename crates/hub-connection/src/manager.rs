//! Connection lifecycle manager.
//!
//! Owns the connection handle and drives it through
//! `Idle -> Connecting -> Connected`, retries the initial connect with
//! exponential backoff, hands mid-session drops to the reconnect loop and
//! reports every transition as a [`LifecycleEvent`]. A single driver task
//! per session does all of the network work; transitions are serialized by
//! one mutex.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::channel::{InboundSubscription, MessageChannel};
use crate::conversation::ConversationState;
use crate::error::ConnectionError;
use crate::factory::ConnectionHandle;
use crate::reconnection::Reconnect;
use crate::transport::{Connector, Link, LinkEvent};
use crate::types::{ConnectionState, LifecycleEvent};
use crate::ws_client::WsConnector;

/// Receiving end of a session's lifecycle events.
///
/// Unbounded: a slow reader never loses an event, terminal ones included.
/// Yields `None` once the session is stopped.
#[derive(Debug)]
pub struct LifecycleEvents {
    rx: mpsc::UnboundedReceiver<LifecycleEvent>,
}

impl LifecycleEvents {
    pub async fn recv(&mut self) -> Option<LifecycleEvent> {
        self.rx.recv().await
    }

    /// Returns the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<LifecycleEvent> {
        self.rx.try_recv().ok()
    }
}

/// Drives one hub connection through its lifecycle.
pub struct ConnectionLifecycleManager<C: Connector = WsConnector> {
    shared: Arc<Shared<C>>,
}

pub(crate) struct Shared<C: Connector> {
    handle: ConnectionHandle<C>,
    conversation: Arc<dyn ConversationState>,
    state_tx: watch::Sender<ConnectionState>,
    /// Parent of every session token. Cancelled on drop without locking.
    shutdown: CancellationToken,
    pub(crate) inner: Mutex<Inner<C::Link>>,
}

pub(crate) struct Inner<L> {
    /// Failed initial-connect attempts since the last start or success.
    attempts: u32,
    pub(crate) link: Option<Arc<L>>,
    events_tx: Option<mpsc::UnboundedSender<LifecycleEvent>>,
    driver: Option<(CancellationToken, JoinHandle<()>)>,
}

impl<L> Inner<L> {
    fn emit(&self, event: LifecycleEvent) {
        let Some(tx) = &self.events_tx else {
            return;
        };
        if let Err(e) = tx.send(event) {
            debug!(event = ?e.0, "lifecycle event receiver dropped");
        }
    }
}

impl<C: Connector> Shared<C> {
    pub(crate) fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Callers must hold `inner`.
    fn set_state(&self, state: ConnectionState) -> ConnectionState {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "connection state changed");
        }
        previous
    }
}

impl<C: Connector> ConnectionLifecycleManager<C> {
    /// Takes ownership of `handle`; its [`ReconnectPolicy`] drives both
    /// recovery paths.
    ///
    /// [`ReconnectPolicy`]: crate::policy::ReconnectPolicy
    pub fn new(handle: ConnectionHandle<C>, conversation: Arc<dyn ConversationState>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Idle);
        Self {
            shared: Arc::new(Shared {
                handle,
                conversation,
                state_tx,
                shutdown: CancellationToken::new(),
                inner: Mutex::new(Inner {
                    attempts: 0,
                    link: None,
                    events_tx: None,
                    driver: None,
                }),
            }),
        }
    }

    /// Starts connecting in the background.
    ///
    /// Only valid from [`ConnectionState::Idle`]; use [`stop`](Self::stop)
    /// or [`restart`](Self::restart) to leave any other state.
    pub async fn start(&self) -> Result<LifecycleEvents, ConnectionError> {
        let mut inner = self.shared.inner.lock().await;
        let state = self.shared.state();
        if state != ConnectionState::Idle {
            return Err(ConnectionError::AlreadyStarted(state));
        }

        let (events_tx, rx) = mpsc::unbounded_channel();
        inner.attempts = 0;
        inner.events_tx = Some(events_tx);
        self.shared.set_state(ConnectionState::Connecting);

        let cancel = self.shared.shutdown.child_token();
        let task = tokio::spawn(drive(Arc::clone(&self.shared), cancel.clone()));
        inner.driver = Some((cancel, task));

        info!(endpoint = %self.shared.handle.endpoint(), "starting hub connection");
        Ok(LifecycleEvents { rx })
    }

    /// Cancels any pending retry, drops the inbound subscription, closes the
    /// transport and returns to [`ConnectionState::Idle`].
    ///
    /// Safe to call in any state, any number of times. No event is emitted
    /// after it returns.
    pub async fn stop(&self) {
        let driver = {
            let mut inner = self.shared.inner.lock().await;
            let driver = inner.driver.take();
            if let Some((cancel, _)) = &driver {
                cancel.cancel();
            }
            driver
        };
        if let Some((_, task)) = driver {
            task.abort();
            let _ = task.await;
        }

        let (link, previous) = {
            let mut inner = self.shared.inner.lock().await;
            inner.events_tx = None;
            (inner.link.take(), self.shared.set_state(ConnectionState::Idle))
        };
        if let Some(link) = link {
            link.close().await;
        }
        if previous != ConnectionState::Idle {
            info!(from = %previous, "hub connection stopped");
        }
    }

    /// Stops, then starts a fresh session. This is the manual refresh that
    /// leaves `Failed` or `Disconnected`.
    pub async fn restart(&self) -> Result<LifecycleEvents, ConnectionError> {
        self.stop().await;
        self.start().await
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state_tx.subscribe()
    }

    /// Failed initial-connect attempts so far. Reset on start and on
    /// success; mid-session retries never touch it.
    pub async fn attempt_count(&self) -> u32 {
        self.shared.inner.lock().await.attempts
    }

    pub fn channel(&self) -> MessageChannel<C> {
        MessageChannel::new(Arc::clone(&self.shared))
    }
}

impl<C: Connector> Drop for ConnectionLifecycleManager<C> {
    fn drop(&mut self) {
        self.shared.shutdown.cancel();
        if let Ok(mut inner) = self.shared.inner.try_lock()
            && let Some((_, task)) = inner.driver.take()
        {
            task.abort();
        }
    }
}

async fn drive<C: Connector>(shared: Arc<Shared<C>>, cancel: CancellationToken) {
    let Some(events) = connect_with_retry(&shared, &cancel).await else {
        return;
    };
    run_session(&shared, &cancel, events).await;
}

/// Initial connect with bounded exponential backoff. Returns the event
/// stream of the established link.
async fn connect_with_retry<C: Connector>(
    shared: &Shared<C>,
    cancel: &CancellationToken,
) -> Option<mpsc::Receiver<LinkEvent>> {
    loop {
        let result = tokio::select! {
            _ = cancel.cancelled() => return None,
            result = shared.handle.open() => result,
        };

        let retry = match result {
            Ok(session) => {
                let mut inner = shared.inner.lock().await;
                if cancel.is_cancelled() {
                    drop(inner);
                    session.link.close().await;
                    return None;
                }
                inner.attempts = 0;
                inner.link = Some(session.link);
                shared.set_state(ConnectionState::Connected);
                inner.emit(LifecycleEvent::Connected);
                info!(endpoint = %shared.handle.endpoint(), "connected to hub");
                return Some(session.events);
            }
            Err(e) => {
                let mut inner = shared.inner.lock().await;
                if cancel.is_cancelled() {
                    return None;
                }
                let retry = inner.attempts;
                inner.attempts = inner.attempts.saturating_add(1);

                if inner.attempts >= shared.handle.initial_policy().max_attempts() {
                    let err = ConnectionError::Exhausted {
                        attempts: inner.attempts,
                        last: e,
                    };
                    warn!("{err}");
                    shared.set_state(ConnectionState::Failed);
                    inner.emit(LifecycleEvent::ConnectionError {
                        message: err.user_message(),
                        terminal: true,
                    });
                    return None;
                }

                let err = ConnectionError::Transient(e);
                warn!(attempt = inner.attempts, "{err}");
                inner.emit(LifecycleEvent::ConnectionError {
                    message: err.user_message(),
                    terminal: false,
                });
                retry
            }
        };

        let delay = shared.handle.initial_policy().delay(retry);
        debug!(delay_ms = delay.as_millis() as u64, "retrying hub connection");
        tokio::select! {
            _ = cancel.cancelled() => return None,
            () = tokio::time::sleep(delay) => {}
        }
    }
}

/// Delivers inbound messages for the lifetime of the session and recovers
/// from mid-session drops.
async fn run_session<C: Connector>(
    shared: &Shared<C>,
    cancel: &CancellationToken,
    mut events: mpsc::Receiver<LinkEvent>,
) {
    loop {
        let subscription = InboundSubscription::register(events, Arc::clone(&shared.conversation));
        let Some(reason) = subscription.run(cancel).await else {
            return;
        };

        let dropped = {
            let mut inner = shared.inner.lock().await;
            if cancel.is_cancelled() {
                return;
            }
            shared.set_state(ConnectionState::Reconnecting);
            inner.emit(LifecycleEvent::Reconnecting);
            inner.link.take()
        };
        warn!("{}", ConnectionError::MidSessionDrop(reason));
        if let Some(link) = dropped {
            link.close().await;
        }

        match shared.handle.reconnect(cancel).await {
            Reconnect::Restored(session) => {
                let mut inner = shared.inner.lock().await;
                if cancel.is_cancelled() {
                    drop(inner);
                    session.link.close().await;
                    return;
                }
                inner.link = Some(session.link);
                shared.set_state(ConnectionState::Connected);
                inner.emit(LifecycleEvent::Reconnected);
                events = session.events;
            }
            Reconnect::Exhausted => {
                let inner = shared.inner.lock().await;
                if cancel.is_cancelled() {
                    return;
                }
                shared.set_state(ConnectionState::Disconnected);
                inner.emit(LifecycleEvent::Closed);
                return;
            }
            Reconnect::Cancelled => return,
        }
    }
}
