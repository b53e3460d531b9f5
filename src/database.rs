//! Credential engine
//!
//! [`Database`] is the operation surface the control plane drives. [`Aerospike`]
//! implements it on top of a [`ConnectionProducer`]: every remote operation takes
//! the producer lock, obtains a live client and issues exactly one admin call
//! before releasing the lock.

use crate::client::{AdminClient, ClientFactory};
use crate::credentials::{CreationStatement, CredentialsProducer, SqlCredentialsProducer, Statements};
use crate::metrics::{counters, histograms, labels};
use crate::producer::{ConnectionProducer, RawConfig};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::time::{Instant, SystemTime};
use tracing::Instrument;

pub use crate::credentials::UsernameConfig;

/// Identity string the control plane routes configuration by
pub const TYPE_NAME: &str = "aerospike";

/// A username and its plaintext password
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username
    pub username: String,
    /// Plaintext password
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Existing user whose password the control plane has chosen
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StaticUserConfig {
    /// Existing username
    pub username: String,
    /// Password to set
    pub password: String,
}

impl std::fmt::Debug for StaticUserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticUserConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Operations a database credential engine offers the control plane
#[async_trait]
pub trait Database: Send + Sync {
    /// Engine identity
    fn type_name(&self) -> &'static str;

    /// Apply configuration, optionally verifying it by connecting.
    /// Returns the configuration for the caller to persist.
    async fn initialize(&self, config: RawConfig, verify_connection: bool) -> Result<RawConfig>;

    /// Create a dynamic user as described by the creation statement
    async fn create_user(
        &self,
        statements: &Statements,
        username_config: &UsernameConfig,
        expiration: SystemTime,
    ) -> Result<Credentials>;

    /// Set the password of an existing user and echo the credentials back
    async fn set_credentials(
        &self,
        statements: &Statements,
        static_user: &StaticUserConfig,
    ) -> Result<Credentials>;

    /// Extend a user's lease
    async fn renew_user(
        &self,
        statements: &Statements,
        username: &str,
        expiration: SystemTime,
    ) -> Result<()>;

    /// Drop a user
    async fn revoke_user(&self, statements: &Statements, username: &str) -> Result<()>;

    /// Rotate the administrative password and return the updated configuration
    async fn rotate_root_credentials(&self, statements: &[String]) -> Result<RawConfig>;

    /// Release the connection
    async fn close(&self) -> Result<()>;

    /// Secret value to placeholder, for scrubbing error text
    fn secret_values(&self) -> HashMap<String, String>;
}

/// Aerospike credential engine
pub struct Aerospike<F: ClientFactory, P: CredentialsProducer = SqlCredentialsProducer> {
    producer: ConnectionProducer<F>,
    credentials: P,
}

impl<F: ClientFactory> Aerospike<F> {
    /// Create an engine with the default credential policy
    pub fn new(factory: F) -> Self {
        Self::with_credentials_producer(factory, SqlCredentialsProducer::default())
    }
}

impl<F: ClientFactory, P: CredentialsProducer> Aerospike<F, P> {
    /// Create an engine with a custom credential policy
    pub fn with_credentials_producer(factory: F, credentials: P) -> Self {
        Self {
            producer: ConnectionProducer::new(factory),
            credentials,
        }
    }

    /// The engine's connection producer
    pub fn producer(&self) -> &ConnectionProducer<F> {
        &self.producer
    }

    async fn create_dynamic_user(
        &self,
        statements: &Statements,
        username_config: &UsernameConfig,
    ) -> Result<Credentials> {
        let statements = statements.clone().normalized();
        let roles = CreationStatement::parse(&statements)?;

        let mut guard = self.producer.lock().await;
        let client = guard.connection().await?;

        let username = self.credentials.generate_username(username_config)?;
        let password = self.credentials.generate_password()?;

        client.create_user(&username, &password, &roles).await?;
        tracing::info!(%username, ?roles, "user created");
        Ok(Credentials { username, password })
    }

    async fn set_password(&self, static_user: &StaticUserConfig) -> Result<Credentials> {
        let mut guard = self.producer.lock().await;
        let client = guard.connection().await?;

        client
            .change_password(&static_user.username, &static_user.password)
            .await?;
        tracing::info!(username = %static_user.username, "password set");
        Ok(static_user_credentials(static_user))
    }

    async fn drop_user(&self, username: &str) -> Result<()> {
        let mut guard = self.producer.lock().await;
        let client = guard.connection().await?;

        client.drop_user(username).await?;
        tracing::info!(%username, "user dropped");
        Ok(())
    }

    /// Set a fresh password for the administrative user, then record it.
    /// Nothing is recorded unless the remote change succeeded.
    async fn rotate_root(&self) -> Result<RawConfig> {
        let mut guard = self.producer.lock().await;

        let username = guard.config().username.clone();
        if username.is_empty() || guard.config().password.is_empty() {
            return Err(Error::RotationPrerequisiteMissing);
        }

        let client = guard.connection().await?;
        let password = self.credentials.generate_password()?;
        client.change_password(&username, &password).await?;

        tracing::info!(%username, "root credentials rotated");
        Ok(guard.commit_root_password(password))
    }
}

fn static_user_credentials(static_user: &StaticUserConfig) -> Credentials {
    Credentials {
        username: static_user.username.clone(),
        password: static_user.password.clone(),
    }
}

/// Time, count and log one engine operation
async fn observe<T, Fut>(operation: &'static str, fut: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    let started = Instant::now();
    let result = fut
        .instrument(tracing::info_span!("operation", operation))
        .await;

    histograms::operation_duration(operation, started.elapsed().as_millis() as u64);
    counters::operation_completed(operation, result.is_ok());
    if let Err(e) = &result {
        let category = e.category();
        counters::operation_error(operation, category);
        tracing::debug!(operation, category = category.as_str(), "operation failed");
    }
    result
}

#[async_trait]
impl<F: ClientFactory, P: CredentialsProducer> Database for Aerospike<F, P> {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    async fn initialize(&self, config: RawConfig, verify_connection: bool) -> Result<RawConfig> {
        observe(
            labels::OP_INITIALIZE,
            self.producer.initialize(config, verify_connection),
        )
        .await
    }

    async fn create_user(
        &self,
        statements: &Statements,
        username_config: &UsernameConfig,
        _expiration: SystemTime,
    ) -> Result<Credentials> {
        observe(
            labels::OP_CREATE_USER,
            self.create_dynamic_user(statements, username_config),
        )
        .await
    }

    async fn set_credentials(
        &self,
        _statements: &Statements,
        static_user: &StaticUserConfig,
    ) -> Result<Credentials> {
        observe(labels::OP_SET_CREDENTIALS, self.set_password(static_user)).await
    }

    async fn renew_user(
        &self,
        _statements: &Statements,
        _username: &str,
        _expiration: SystemTime,
    ) -> Result<()> {
        // users carry no expiry on the server side
        observe(labels::OP_RENEW_USER, std::future::ready(Ok(()))).await
    }

    async fn revoke_user(&self, _statements: &Statements, username: &str) -> Result<()> {
        observe(labels::OP_REVOKE_USER, self.drop_user(username)).await
    }

    async fn rotate_root_credentials(&self, _statements: &[String]) -> Result<RawConfig> {
        let result = observe(labels::OP_ROTATE_ROOT, self.rotate_root()).await;
        counters::root_rotation(result.is_ok());
        result
    }

    async fn close(&self) -> Result<()> {
        observe(labels::OP_CLOSE, self.producer.close()).await
    }

    fn secret_values(&self) -> HashMap<String, String> {
        self.producer.secret_values()
    }
}
