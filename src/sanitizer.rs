//! Error-sanitizing decorator

use crate::credentials::Statements;
use crate::database::{Credentials, Database, StaticUserConfig, UsernameConfig};
use crate::producer::RawConfig;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::SystemTime;

/// Wraps a [`Database`] and scrubs secret values out of every error it returns.
///
/// The secrets snapshot is taken after the wrapped call completes, so a
/// password introduced by that very call (a new configuration, a rotated
/// root password) is already covered.
pub struct ErrorSanitizer<D> {
    inner: D,
}

impl<D: Database> ErrorSanitizer<D> {
    /// Wrap `inner`
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    /// The wrapped engine
    pub fn inner(&self) -> &D {
        &self.inner
    }

    fn sanitize<T>(&self, result: Result<T>) -> Result<T> {
        result.map_err(|e| e.redact(&self.inner.secret_values()))
    }
}

#[async_trait]
impl<D: Database> Database for ErrorSanitizer<D> {
    fn type_name(&self) -> &'static str {
        self.inner.type_name()
    }

    async fn initialize(&self, config: RawConfig, verify_connection: bool) -> Result<RawConfig> {
        let result = self.inner.initialize(config, verify_connection).await;
        self.sanitize(result)
    }

    async fn create_user(
        &self,
        statements: &Statements,
        username_config: &UsernameConfig,
        expiration: SystemTime,
    ) -> Result<Credentials> {
        let result = self
            .inner
            .create_user(statements, username_config, expiration)
            .await;
        self.sanitize(result)
    }

    async fn set_credentials(
        &self,
        statements: &Statements,
        static_user: &StaticUserConfig,
    ) -> Result<Credentials> {
        let result = self.inner.set_credentials(statements, static_user).await;
        self.sanitize(result)
    }

    async fn renew_user(
        &self,
        statements: &Statements,
        username: &str,
        expiration: SystemTime,
    ) -> Result<()> {
        let result = self.inner.renew_user(statements, username, expiration).await;
        self.sanitize(result)
    }

    async fn revoke_user(&self, statements: &Statements, username: &str) -> Result<()> {
        let result = self.inner.revoke_user(statements, username).await;
        self.sanitize(result)
    }

    async fn rotate_root_credentials(&self, statements: &[String]) -> Result<RawConfig> {
        let result = self.inner.rotate_root_credentials(statements).await;
        self.sanitize(result)
    }

    async fn close(&self) -> Result<()> {
        let result = self.inner.close().await;
        self.sanitize(result)
    }

    fn secret_values(&self) -> HashMap<String, String> {
        self.inner.secret_values()
    }
}
