//! Builds configured [`ConnectionHandle`]s.
//!
//! Construction is pure: the endpoint is validated and the reconnect
//! policy attached, but nothing touches the network until the lifecycle
//! manager starts the handle.

use std::fmt;

use tokio_tungstenite::tungstenite::http::Uri;
use tracing::Level;

use crate::error::ConnectionError;
use crate::policy::{InitialConnectPolicy, MidSessionPolicy, ReconnectPolicy};
use crate::transport::{Connector, Session};
use crate::ws_client::{WsConnector, WsError};

/// Logs at a level chosen at runtime.
macro_rules! log_at {
    ($level:expr, $($arg:tt)+) => {{
        let level: ::tracing::Level = $level;
        if level == ::tracing::Level::ERROR {
            ::tracing::error!($($arg)+)
        } else if level == ::tracing::Level::WARN {
            ::tracing::warn!($($arg)+)
        } else if level == ::tracing::Level::INFO {
            ::tracing::info!($($arg)+)
        } else if level == ::tracing::Level::DEBUG {
            ::tracing::debug!($($arg)+)
        } else {
            ::tracing::trace!($($arg)+)
        }
    }};
}
pub(crate) use log_at;

/// A validated WebSocket URL for the hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: String,
}

impl Endpoint {
    /// Validates `raw` and normalises `http`/`https` to `ws`/`wss`.
    pub fn parse(raw: &str) -> Result<Self, ConnectionError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ConnectionError::Configuration("hub URL is empty".into()));
        }

        let uri: Uri = raw
            .parse()
            .map_err(|e| ConnectionError::Configuration(format!("{raw:?}: {e}")))?;

        let scheme = match uri.scheme_str() {
            Some("ws" | "http") => "ws",
            Some("wss" | "https") => "wss",
            Some(other) => {
                return Err(ConnectionError::Configuration(format!(
                    "{raw:?}: unsupported scheme {other:?}"
                )));
            }
            None => {
                return Err(ConnectionError::Configuration(format!(
                    "{raw:?}: missing scheme"
                )));
            }
        };

        let Some(authority) = uri.authority().filter(|a| !a.host().is_empty()) else {
            return Err(ConnectionError::Configuration(format!(
                "{raw:?}: missing host"
            )));
        };

        let path = uri.path_and_query().map_or("/", |p| p.as_str());
        Ok(Self {
            url: format!("{scheme}://{authority}{path}"),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// A not-yet-started connection: endpoint, both backoff schedules, transport
/// verbosity and the connector that opens links.
///
/// Owned exclusively by the lifecycle manager once handed over.
pub struct ConnectionHandle<C: Connector = WsConnector> {
    endpoint: Endpoint,
    policy: ReconnectPolicy,
    log_level: Level,
    connector: C,
}

impl<C: Connector> ConnectionHandle<C> {
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn reconnect_policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    pub fn initial_policy(&self) -> &InitialConnectPolicy {
        &self.policy.initial
    }

    pub fn mid_session_policy(&self) -> &MidSessionPolicy {
        &self.policy.mid_session
    }

    pub fn log_level(&self) -> Level {
        self.log_level
    }

    /// One connection attempt, handshake included.
    pub(crate) async fn open(&self) -> Result<Session<C::Link>, WsError> {
        log_at!(self.log_level, endpoint = %self.endpoint, "opening hub connection");
        self.connector.connect(&self.endpoint).await
    }
}

impl<C: Connector> fmt::Debug for ConnectionHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("endpoint", &self.endpoint)
            .field("policy", &self.policy)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}

/// Creates [`ConnectionHandle`]s sharing one reconnect policy and transport
/// verbosity.
#[derive(Debug, Clone)]
pub struct HubConnectionFactory {
    policy: ReconnectPolicy,
    log_level: Level,
    client_name: String,
}

impl Default for HubConnectionFactory {
    fn default() -> Self {
        Self {
            policy: ReconnectPolicy::default(),
            log_level: Level::INFO,
            client_name: "hubchat".into(),
        }
    }
}

impl HubConnectionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_initial_policy(mut self, policy: InitialConnectPolicy) -> Self {
        self.policy.initial = policy;
        self
    }

    pub fn with_mid_session_policy(mut self, policy: MidSessionPolicy) -> Self {
        self.policy.mid_session = policy;
        self
    }

    pub fn with_log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    /// Name announced to the hub in the handshake.
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Builds a WebSocket-backed handle for `endpoint_url`.
    pub fn create_connection(
        &self,
        endpoint_url: &str,
    ) -> Result<ConnectionHandle<WsConnector>, ConnectionError> {
        self.create_connection_with(endpoint_url, WsConnector::new(self.client_name.clone()))
    }

    /// Builds a handle that opens links through `connector`.
    pub fn create_connection_with<C: Connector>(
        &self,
        endpoint_url: &str,
        connector: C,
    ) -> Result<ConnectionHandle<C>, ConnectionError> {
        let endpoint = Endpoint::parse(endpoint_url)?;
        Ok(ConnectionHandle {
            endpoint,
            policy: self.policy.clone(),
            log_level: self.log_level,
            connector,
        })
    }
}
