//! Administrative client seam and its Aerospike implementation

use super::host_spec::Endpoint;
use super::password::hash_password_blocking;
use crate::connection::{Auth, ClientPolicy, Connection, Session};
use crate::protocol::AdminRequest;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// User-management operations the credential engine needs from a database
/// client.
///
/// Passwords are plaintext at this boundary; implementations decide how they
/// travel to the server.
#[async_trait]
pub trait AdminClient: Send + Sync {
    /// Whether the client can still carry commands
    fn is_connected(&self) -> bool;

    /// Release the client's resources. Errors are swallowed.
    async fn close(&mut self);

    /// Create `user` with `password` and `roles`
    async fn create_user(&mut self, user: &str, password: &str, roles: &[String]) -> Result<()>;

    /// Drop `user`
    async fn drop_user(&mut self, user: &str) -> Result<()>;

    /// Set `user`'s password
    async fn change_password(&mut self, user: &str, password: &str) -> Result<()>;
}

/// Opens [`AdminClient`]s
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// Client type produced
    type Client: AdminClient;

    /// Connect to the first reachable endpoint of `hosts` using `policy`
    async fn connect(&self, policy: &ClientPolicy, hosts: &[Endpoint]) -> Result<Self::Client>;
}

/// Last session issued by the cluster, shared by a factory and its clients
#[derive(Default)]
struct SessionCache {
    inner: Mutex<Option<(Session, Option<Instant>)>>,
}

impl SessionCache {
    fn get(&self, user: &str) -> Option<Session> {
        let mut inner = self.inner.lock().ok()?;
        let expired = match &*inner {
            Some((session, expires_at)) if session.user == user => {
                expires_at.map_or(false, |at| Instant::now() >= at)
            }
            _ => return None,
        };
        if expired {
            *inner = None;
            return None;
        }
        inner.as_ref().map(|(session, _)| session.clone())
    }

    fn store(&self, session: Session) {
        let expires_at = session
            .ttl
            .filter(|ttl| !ttl.is_zero())
            .map(|ttl| Instant::now() + ttl);
        if let Ok(mut inner) = self.inner.lock() {
            *inner = Some((session, expires_at));
        }
    }

    fn clear(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            *inner = None;
        }
    }
}

/// Opens [`AerospikeClient`]s over the admin protocol
#[derive(Default, Clone)]
pub struct AerospikeClientFactory {
    sessions: Arc<SessionCache>,
}

impl AerospikeClientFactory {
    /// Create a factory with an empty session cache
    pub fn new() -> Self {
        Self::default()
    }

    async fn open(
        &self,
        endpoint: &Endpoint,
        policy: &ClientPolicy,
        credential: &mut Option<String>,
    ) -> Result<Connection> {
        if let Some(session) = self.sessions.get(&policy.user) {
            match Connection::open(endpoint, policy, Auth::Session(&session)).await {
                Ok((conn, _)) => return Ok(conn),
                Err(Error::Authentication(reason)) => {
                    tracing::debug!(%reason, "cached session rejected, logging in");
                    self.sessions.clear();
                }
                Err(e) => return Err(e),
            }
        }

        if credential.is_none() {
            *credential = Some(hash_password_blocking(&policy.password).await?);
        }
        let credential = credential.as_deref().unwrap_or_default();
        let (conn, session) =
            Connection::open(endpoint, policy, Auth::Credential(credential)).await?;
        if let Some(session) = session {
            self.sessions.store(session);
        }
        Ok(conn)
    }
}

#[async_trait]
impl ClientFactory for AerospikeClientFactory {
    type Client = AerospikeClient;

    async fn connect(&self, policy: &ClientPolicy, hosts: &[Endpoint]) -> Result<AerospikeClient> {
        let mut credential = None;
        let mut failures = Vec::with_capacity(hosts.len());

        for endpoint in hosts {
            match self.open(endpoint, policy, &mut credential).await {
                Ok(conn) => {
                    tracing::info!(%endpoint, "connected");
                    return Ok(AerospikeClient {
                        conn,
                        endpoint: endpoint.clone(),
                        user: policy.user.clone(),
                        password: policy.password.clone(),
                        sessions: self.sessions.clone(),
                    });
                }
                Err(e) => {
                    tracing::warn!(%endpoint, error = %e, "endpoint unavailable");
                    failures.push(format!("{}: {}", endpoint, e));
                }
            }
        }

        if failures.is_empty() {
            return Err(Error::Connect("no hosts configured".into()));
        }
        Err(Error::Connect(failures.join("; ")))
    }
}

/// Admin client holding one authenticated connection
pub struct AerospikeClient {
    conn: Connection,
    endpoint: Endpoint,
    user: String,
    password: String,
    sessions: Arc<SessionCache>,
}

impl AerospikeClient {
    /// Endpoint this client is connected to
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl std::fmt::Debug for AerospikeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AerospikeClient")
            .field("endpoint", &self.endpoint)
            .field("user", &self.user)
            .field("conn", &self.conn)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AdminClient for AerospikeClient {
    fn is_connected(&self) -> bool {
        self.conn.is_alive()
    }

    async fn close(&mut self) {
        if let Err(e) = self.conn.close().await {
            tracing::debug!(error = %e, "error closing connection");
        }
    }

    async fn create_user(&mut self, user: &str, password: &str, roles: &[String]) -> Result<()> {
        let password_hash = hash_password_blocking(password).await?;
        self.conn
            .execute(&AdminRequest::CreateUser {
                user: user.to_string(),
                password_hash,
                roles: roles.to_vec(),
            })
            .await?;
        Ok(())
    }

    async fn drop_user(&mut self, user: &str) -> Result<()> {
        self.conn
            .execute(&AdminRequest::DropUser {
                user: user.to_string(),
            })
            .await?;
        Ok(())
    }

    async fn change_password(&mut self, user: &str, password: &str) -> Result<()> {
        let password_hash = hash_password_blocking(password).await?;

        if user != self.user {
            self.conn
                .execute(&AdminRequest::SetPassword {
                    user: user.to_string(),
                    password_hash,
                })
                .await?;
            return Ok(());
        }

        let old_password_hash = hash_password_blocking(&self.password).await?;
        self.conn
            .execute(&AdminRequest::ChangePassword {
                user: user.to_string(),
                old_password_hash,
                password_hash,
            })
            .await?;
        self.password = password.to_string();
        self.sessions.clear();
        Ok(())
    }
}
