//! Health-tracked, circuit-protected access to a [`SerenaClient`]
//!
//! [`SerenaConnector`] owns the client the HTTP proxy serves from. It builds
//! clients through an injected [`ClientFactory`], probes them with
//! `get_current_config`, and feeds every failed connect or probe into a
//! [`CircuitBreaker`]. While the circuit is open, [`SerenaConnector::client`]
//! refuses to hand the client out.
//!
//! All methods take `&self`. State sits behind a `std::sync::Mutex` that is
//! released before any network call.

pub mod breaker;

pub use breaker::{CircuitBreaker, CircuitState};

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::config::Config;
use crate::error::{Result, SerenaError};
use crate::mcp::client::SerenaClient;

/// Connector name reported in status snapshots and circuit errors.
pub const CONNECTOR_NAME: &str = "serena";

/// Builds a fresh, unconnected client.
pub type ClientFactory = Arc<dyn Fn() -> SerenaClient + Send + Sync>;

/// Point-in-time view of a connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectorStatus {
    pub name: String,
    pub healthy: bool,
    pub circuit_state: CircuitState,
    pub base_url: String,
    pub failure_count: u32,
}

#[derive(Debug)]
struct ConnectorState {
    client: Option<Arc<SerenaClient>>,
    healthy: bool,
    breaker: CircuitBreaker,
}

/// Lifecycle, health and circuit state around one Serena endpoint.
pub struct SerenaConnector {
    name: String,
    base_url: String,
    factory: ClientFactory,
    state: Mutex<ConnectorState>,
}

impl std::fmt::Debug for SerenaConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerenaConnector")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SerenaConnector {
    /// Disconnected connector using `factory` to build clients.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        factory: ClientFactory,
        breaker: CircuitBreaker,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            factory,
            state: Mutex::new(ConnectorState {
                client: None,
                healthy: false,
                breaker,
            }),
        }
    }

    /// Connector building HTTP clients from `config`.
    pub fn from_config(config: &Config) -> Self {
        let server = config.server.clone();
        let session = config.session.clone();
        let factory: ClientFactory =
            Arc::new(move || SerenaClient::new(server.clone(), session.store()));
        Self::new(
            CONNECTOR_NAME,
            config.server.url.clone(),
            factory,
            CircuitBreaker::from_config(&config.connector),
        )
    }

    fn state(&self) -> MutexGuard<'_, ConnectorState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a client, connect it and verify it answers a status probe.
    ///
    /// On success the breaker is reset. On failure the connector is marked
    /// unhealthy, a failure is recorded and the error is returned.
    pub async fn connect(&self) -> Result<()> {
        let client = Arc::new((self.factory)());

        let outcome = async {
            client.connect().await?;
            client.get_status().await?;
            Ok::<(), anyhow::Error>(())
        }
        .await;

        match outcome {
            Ok(()) => {
                let mut state = self.state();
                state.client = Some(client);
                state.healthy = true;
                state.breaker.reset();
                tracing::info!(connector = %self.name, url = %self.base_url, "Serena connector connected");
                Ok(())
            }
            Err(e) => {
                client.close();
                self.mark_failed();
                tracing::error!(connector = %self.name, "Serena connector failed to connect: {}", e);
                Err(e)
            }
        }
    }

    /// Close the client, if any, and mark the connector unhealthy.
    pub fn disconnect(&self) {
        let client = {
            let mut state = self.state();
            state.healthy = false;
            state.client.take()
        };
        if let Some(client) = client {
            client.close();
        }
        tracing::info!(connector = %self.name, "Serena connector disconnected");
    }

    /// Probe the server. Never fails: an unreachable or erroring server
    /// returns `false` and counts against the breaker.
    ///
    /// A successful probe closes a half-open circuit. A probe that leaves
    /// the client without a session drops the client, so the next
    /// [`SerenaConnector::connect`] negotiates a fresh one.
    pub async fn check_health(&self) -> bool {
        let client = match self.state().client.clone() {
            Some(client) => client,
            None => return false,
        };

        match client.get_status().await {
            Ok(_) => {
                let mut state = self.state();
                state.healthy = true;
                if state.breaker.state() == CircuitState::HalfOpen && state.breaker.record_success()
                {
                    tracing::info!(connector = %self.name, "Circuit breaker closed after successful health check");
                }
                true
            }
            Err(e) => {
                tracing::warn!(connector = %self.name, "Health check failed: {}", e);
                let session_lost = matches!(
                    e.downcast_ref::<SerenaError>(),
                    Some(SerenaError::Session(_))
                ) || !client.is_connected();
                if session_lost {
                    self.drop_client(&client);
                }
                self.mark_failed();
                false
            }
        }
    }

    /// Forget `client` if it is still the held one, then close it.
    fn drop_client(&self, client: &Arc<SerenaClient>) {
        {
            let mut state = self.state();
            if state.client.as_ref().is_some_and(|held| Arc::ptr_eq(held, client)) {
                state.client = None;
            }
        }
        client.close();
        tracing::info!(connector = %self.name, "Session lost, client dropped");
    }

    fn mark_failed(&self) {
        let mut state = self.state();
        state.healthy = false;
        if state.breaker.record_failure() {
            tracing::warn!(
                connector = %self.name,
                "Circuit breaker opened after {} failures",
                state.breaker.failure_count()
            );
        }
    }

    /// Whether the last connect or probe succeeded and a client is held.
    pub fn healthy(&self) -> bool {
        let state = self.state();
        state.healthy && state.client.is_some()
    }

    /// Whether a client is held, healthy or not.
    pub fn has_client(&self) -> bool {
        self.state().client.is_some()
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.state().breaker.state()
    }

    /// The connected client.
    ///
    /// # Errors
    ///
    /// - [`SerenaError::CircuitOpen`] while the circuit is open
    /// - [`SerenaError::Connection`] when no client is connected
    pub fn client(&self) -> Result<Arc<SerenaClient>> {
        let mut state = self.state();
        if state.breaker.state() == CircuitState::Open {
            return Err(SerenaError::CircuitOpen(self.name.clone()).into());
        }
        state
            .client
            .clone()
            .ok_or_else(|| SerenaError::Connection("Serena not connected".to_string()).into())
    }

    pub fn status(&self) -> ConnectorStatus {
        let mut state = self.state();
        let circuit_state = state.breaker.state();
        ConnectorStatus {
            name: self.name.clone(),
            healthy: state.healthy && state.client.is_some(),
            circuit_state,
            base_url: self.base_url.clone(),
            failure_count: state.breaker.failure_count(),
        }
    }
}
