//! Connection producer: configuration state, the cached admin client and the
//! lock that serializes every operation against it.

use super::config::{ConnectionConfig, RawConfig};
use crate::client::{AdminClient, ClientFactory, Endpoint};
use crate::connection::ClientPolicy;
use crate::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::{Mutex, MutexGuard};
use tracing::Instrument;

/// Placeholder substituted for the administrative password in error text
pub const PASSWORD_PLACEHOLDER: &str = "[password]";

struct ProducerState<C> {
    raw_config: RawConfig,
    config: ConnectionConfig,
    hosts: Vec<Endpoint>,
    policy: Option<ClientPolicy>,
    initialized: bool,
    client: Option<C>,
}

impl<C> Default for ProducerState<C> {
    fn default() -> Self {
        Self {
            raw_config: RawConfig::new(),
            config: ConnectionConfig::default(),
            hosts: Vec::new(),
            policy: None,
            initialized: false,
            client: None,
        }
    }
}

/// Owns one database target's configuration and at most one live client.
///
/// Every operation runs under a single async mutex, held for its whole
/// duration. Waiting for the mutex is not bounded by any timeout.
pub struct ConnectionProducer<F: ClientFactory> {
    factory: F,
    state: Mutex<ProducerState<F::Client>>,
    secrets: RwLock<HashMap<String, String>>,
}

impl<F: ClientFactory> ConnectionProducer<F> {
    /// Create an uninitialized producer
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            state: Mutex::new(ProducerState::default()),
            secrets: RwLock::new(HashMap::new()),
        }
    }

    /// Acquire the producer lock
    pub async fn lock(&self) -> ProducerGuard<'_, F> {
        ProducerGuard {
            producer: self,
            state: self.state.lock().await,
        }
    }

    /// Apply a configuration and optionally verify it by connecting.
    ///
    /// Any cached client is closed first. On failure the producer is left
    /// uninitialized. On success the map is returned unchanged.
    pub async fn initialize(&self, raw: RawConfig, verify: bool) -> Result<RawConfig> {
        let mut guard = self.lock().await;
        guard
            .initialize(raw, verify)
            .instrument(tracing::info_span!("initialize", verify))
            .await
    }

    /// Close the cached client, if any. Idempotent.
    pub async fn close(&self) -> Result<()> {
        let mut guard = self.lock().await;
        guard.drop_client().await;
        Ok(())
    }

    /// Snapshot of secret value to placeholder, for scrubbing error text
    pub fn secret_values(&self) -> HashMap<String, String> {
        match self.secrets.read() {
            Ok(secrets) => secrets.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_secret_password(&self, password: &str) {
        let mut secrets = match self.secrets.write() {
            Ok(secrets) => secrets,
            Err(poisoned) => poisoned.into_inner(),
        };
        secrets.clear();
        if !password.is_empty() {
            secrets.insert(password.to_string(), PASSWORD_PLACEHOLDER.to_string());
        }
    }
}

/// Exclusive access to a [`ConnectionProducer`]'s state.
///
/// The producer lock is held until the guard is dropped, so getting a
/// connection and using it happen inside one critical section.
pub struct ProducerGuard<'a, F: ClientFactory> {
    producer: &'a ConnectionProducer<F>,
    state: MutexGuard<'a, ProducerState<F::Client>>,
}

impl<'a, F: ClientFactory> ProducerGuard<'a, F> {
    /// Whether the last `initialize` succeeded
    pub fn is_initialized(&self) -> bool {
        self.state.initialized
    }

    /// Current typed configuration
    pub fn config(&self) -> &ConnectionConfig {
        &self.state.config
    }

    /// Current raw configuration
    pub fn raw_config(&self) -> &RawConfig {
        &self.state.raw_config
    }

    /// Return the cached client if it is alive, otherwise replace it.
    ///
    /// A dead client is closed (best effort) before a new one is created from
    /// the stored endpoints and policy. No retry beyond that single reconnect.
    pub async fn connection(&mut self) -> Result<&mut F::Client> {
        let state = &mut *self.state;
        if !state.initialized {
            return Err(Error::NotInitialized);
        }

        let alive = state.client.as_ref().map(|client| client.is_connected());
        if alive == Some(false) {
            tracing::debug!("cached connection is dead, reconnecting");
            crate::metrics::counters::reconnect();
            if let Some(mut stale) = state.client.take() {
                stale.close().await;
            }
        }

        if state.client.is_none() {
            let policy = state.policy.as_ref().ok_or(Error::NotInitialized)?;
            match self.producer.factory.connect(policy, &state.hosts).await {
                Ok(client) => {
                    crate::metrics::counters::connection_established();
                    state.client = Some(client);
                }
                Err(e) => {
                    crate::metrics::counters::connection_failed();
                    return Err(e);
                }
            }
        }

        state.client.as_mut().ok_or(Error::NotConnected)
    }

    /// Record a new administrative password after it was set remotely.
    ///
    /// Updates the raw map, the typed config, the client policy used for future
    /// reconnects and the secrets snapshot together. Returns the updated map.
    pub fn commit_root_password(&mut self, password: String) -> RawConfig {
        let state = &mut *self.state;
        state
            .raw_config
            .insert("password".to_string(), Value::String(password.clone()));
        if let Some(policy) = state.policy.as_mut() {
            policy.password = password.clone();
        }
        self.producer.set_secret_password(&password);
        state.config.password = password;
        state.raw_config.clone()
    }

    async fn initialize(&mut self, raw: RawConfig, verify: bool) -> Result<RawConfig> {
        self.state.initialized = false;
        self.drop_client().await;

        // an undecodable map keeps the stored config and secrets of the last one
        let config = ConnectionConfig::decode(&raw)?;
        self.state.raw_config = raw.clone();
        self.producer.set_secret_password(&config.password);

        let (hosts, tls) = config.validate()?;
        let policy = config.client_policy(tls);
        tracing::debug!(hosts = hosts.len(), tls = policy.tls.is_some(), "configuration accepted");

        let state = &mut *self.state;
        state.config = config;
        state.hosts = hosts;
        state.policy = Some(policy);
        state.initialized = true;

        if verify {
            if let Err(e) = self.verify().await {
                self.state.initialized = false;
                return Err(Error::VerifyConnection(Box::new(e)));
            }
        }

        Ok(raw)
    }

    async fn verify(&mut self) -> Result<()> {
        let client = self.connection().await?;
        if client.is_connected() {
            return Ok(());
        }
        self.drop_client().await;
        Err(Error::NotConnected)
    }

    async fn drop_client(&mut self) {
        if let Some(mut client) = self.state.client.take() {
            client.close().await;
        }
    }
}
