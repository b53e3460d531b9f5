//! Core connection type

use super::state::ConnectionState;
use super::tls::TlsConfig;
use super::transport::Transport;
use crate::client::Endpoint;
use crate::protocol::constants::result_codes;
use crate::protocol::{decode_response, encode_request, AdminRequest, AdminResponse};
use crate::{Error, Result};
use bytes::{Buf, Bytes, BytesMut};
use std::io;
use std::time::Duration;
use tracing::Instrument;

/// Default bound on opening a connection (TCP, TLS handshake and login)
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on a single admin command round trip
pub const DEFAULT_ADMIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Everything needed to open an authenticated admin connection
///
/// Use `ClientPolicy::builder()` to set TLS and timeouts.
#[derive(Clone)]
pub struct ClientPolicy {
    /// Administrative user
    pub user: String,
    /// Administrative password (plaintext; hashed before it hits the wire)
    pub password: String,
    /// TLS material; `None` means plain TCP
    pub tls: Option<TlsConfig>,
    /// Bound on TCP connect, TLS handshake and login
    pub connect_timeout: Duration,
    /// Bound on each admin command round trip
    pub admin_timeout: Duration,
}

impl ClientPolicy {
    /// Create a policy with default timeouts and no TLS
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self::builder(user, password).build()
    }

    /// Create a builder
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let policy = ClientPolicy::builder("admin", "secret")
    ///     .tls(Some(tls))
    ///     .connect_timeout(Duration::from_secs(5))
    ///     .build();
    /// ```
    pub fn builder(user: impl Into<String>, password: impl Into<String>) -> ClientPolicyBuilder {
        ClientPolicyBuilder {
            user: user.into(),
            password: password.into(),
            tls: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            admin_timeout: DEFAULT_ADMIN_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for ClientPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientPolicy")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("tls", &self.tls)
            .field("connect_timeout", &self.connect_timeout)
            .field("admin_timeout", &self.admin_timeout)
            .finish()
    }
}

/// Builder for [`ClientPolicy`]
pub struct ClientPolicyBuilder {
    user: String,
    password: String,
    tls: Option<TlsConfig>,
    connect_timeout: Duration,
    admin_timeout: Duration,
}

impl ClientPolicyBuilder {
    /// Set TLS material
    pub fn tls(mut self, tls: Option<TlsConfig>) -> Self {
        self.tls = tls;
        self
    }

    /// Set the connect timeout
    ///
    /// Default: 30 seconds
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = duration;
        self
    }

    /// Set the admin command timeout
    ///
    /// Default: 1 second
    pub fn admin_timeout(mut self, duration: Duration) -> Self {
        self.admin_timeout = duration;
        self
    }

    /// Build the policy
    pub fn build(self) -> ClientPolicy {
        ClientPolicy {
            user: self.user,
            password: self.password,
            tls: self.tls,
            connect_timeout: self.connect_timeout,
            admin_timeout: self.admin_timeout,
        }
    }
}

/// Session issued by a successful login
#[derive(Clone)]
pub struct Session {
    /// User the session belongs to
    pub user: String,
    /// Opaque token accepted by AUTHENTICATE
    pub token: Bytes,
    /// Lifetime reported by the server, if any
    pub ttl: Option<Duration>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// How a new socket proves who it is
#[derive(Clone, Copy)]
pub enum Auth<'a> {
    /// LOGIN with the bcrypt-hashed password
    Credential(&'a str),
    /// AUTHENTICATE with the token of an earlier login
    Session(&'a Session),
}

impl std::fmt::Debug for Auth<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Credential(_) => f.write_str("Auth::Credential(<redacted>)"),
            Auth::Session(session) => f.debug_tuple("Auth::Session").field(session).finish(),
        }
    }
}

/// Admin connection to a single Aerospike node
pub struct Connection {
    transport: Transport,
    state: ConnectionState,
    read_buf: BytesMut,
    admin_timeout: Duration,
}

impl Connection {
    /// Create connection from transport
    pub fn new(transport: Transport, admin_timeout: Duration) -> Self {
        Self {
            transport,
            state: ConnectionState::Initial,
            read_buf: BytesMut::with_capacity(1024),
            admin_timeout,
        }
    }

    /// Open a transport to `endpoint` and authenticate it.
    ///
    /// Bounded as a whole by `policy.connect_timeout`. Returns the session
    /// the socket is now authenticated under, if the server issued one.
    pub async fn open(
        endpoint: &Endpoint,
        policy: &ClientPolicy,
        auth: Auth<'_>,
    ) -> Result<(Self, Option<Session>)> {
        tokio::time::timeout(
            policy.connect_timeout,
            Self::connect_and_authenticate(endpoint, policy, auth),
        )
        .instrument(tracing::info_span!(
            "connect",
            endpoint = %endpoint,
            tls = policy.tls.is_some()
        ))
        .await
        .map_err(|_| Error::ConnectTimeout {
            endpoint: endpoint.to_string(),
        })?
    }

    async fn connect_and_authenticate(
        endpoint: &Endpoint,
        policy: &ClientPolicy,
        auth: Auth<'_>,
    ) -> Result<(Self, Option<Session>)> {
        let transport = match &policy.tls {
            Some(tls) => {
                Transport::connect_tls(&endpoint.name, endpoint.port, endpoint.server_name(), tls)
                    .await?
            }
            None => Transport::connect_tcp(&endpoint.name, endpoint.port).await?,
        };

        let mut conn = Connection::new(transport, policy.admin_timeout);
        let session = match auth {
            Auth::Credential(credential) => conn.login(&policy.user, credential).await?,
            Auth::Session(session) => {
                conn.authenticate(session).await?;
                Some(session.clone())
            }
        };
        Ok((conn, session))
    }

    /// Get current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the connection can carry another admin command
    pub fn is_alive(&self) -> bool {
        self.state.is_alive()
    }

    /// Log in with a hashed credential.
    ///
    /// Returns the session issued by the server, or `None` when the server runs
    /// without security and accepts every command unauthenticated.
    pub async fn login(&mut self, user: &str, credential: &str) -> Result<Option<Session>> {
        let buf = encode(&AdminRequest::Login {
            user: user.to_string(),
            credential: credential.to_string(),
        })?;
        self.state.transition(ConnectionState::Authenticating)?;

        let response = match self.round_trip(&buf).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail(e)),
        };

        match response.result_code {
            result_codes::OK => {
                let session = response.session_token().map(|token| Session {
                    user: user.to_string(),
                    token: token.clone(),
                    ttl: response
                        .session_ttl()
                        .map(|secs| Duration::from_secs(u64::from(secs))),
                });
                self.state.transition(ConnectionState::Ready)?;
                tracing::debug!(user, session = session.is_some(), "login complete");
                Ok(session)
            }
            result_codes::SECURITY_NOT_ENABLED => {
                self.state.transition(ConnectionState::Ready)?;
                tracing::debug!("security not enabled on server, continuing unauthenticated");
                Ok(None)
            }
            code => Err(self.fail(Error::Authentication(
                result_codes::describe(code).to_string(),
            ))),
        }
    }

    /// Authenticate with the token of an earlier session
    pub async fn authenticate(&mut self, session: &Session) -> Result<()> {
        let buf = encode(&AdminRequest::Authenticate {
            user: session.user.clone(),
            session_token: session.token.clone(),
        })?;
        self.state.transition(ConnectionState::Authenticating)?;

        let response = match self.round_trip(&buf).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail(e)),
        };

        match response.result_code {
            result_codes::OK | result_codes::SECURITY_NOT_ENABLED => {
                self.state.transition(ConnectionState::Ready)?;
                Ok(())
            }
            code => Err(self.fail(Error::Authentication(
                result_codes::describe(code).to_string(),
            ))),
        }
    }

    /// Execute one admin command.
    ///
    /// A non-zero result code is returned as [`Error::Server`] and leaves the
    /// connection usable, as does a request that cannot be encoded
    /// ([`Error::InvalidRequest`]). Transport failures and timeouts leave it broken.
    pub async fn execute(&mut self, request: &AdminRequest) -> Result<AdminResponse> {
        let command = request.name();
        self.execute_inner(request)
            .instrument(tracing::debug_span!("admin_command", command))
            .await
    }

    async fn execute_inner(&mut self, request: &AdminRequest) -> Result<AdminResponse> {
        let buf = encode(request)?;
        self.state.transition(ConnectionState::CommandInProgress)?;

        let response = match tokio::time::timeout(self.admin_timeout, self.round_trip(&buf)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(self.fail(e)),
            Err(_) => return Err(self.fail(Error::Timeout("admin command"))),
        };

        self.state.transition(ConnectionState::Ready)?;

        if response.result_code != result_codes::OK {
            tracing::debug!(result_code = response.result_code, "command rejected");
            return Err(Error::Server {
                code: response.result_code,
                message: result_codes::describe(response.result_code).to_string(),
            });
        }
        Ok(response)
    }

    /// Close the connection
    pub async fn close(&mut self) -> Result<()> {
        if self.state == ConnectionState::Closed {
            return Ok(());
        }
        self.state.transition(ConnectionState::Closed)?;
        self.transport.shutdown().await
    }

    async fn round_trip(&mut self, buf: &[u8]) -> Result<AdminResponse> {
        self.transport.write_all(buf).await?;
        self.transport.flush().await?;
        self.receive_response().await
    }

    async fn receive_response(&mut self) -> Result<AdminResponse> {
        loop {
            match decode_response(&self.read_buf) {
                Ok((response, consumed)) => {
                    self.read_buf.advance(consumed);
                    return Ok(response);
                }
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {}
                Err(e) => return Err(Error::Protocol(e.to_string())),
            }

            // Need more data
            let n = self.transport.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
        }
    }

    /// Mark the connection unusable and hand back the error
    fn fail(&mut self, error: Error) -> Error {
        if self.state.can_transition_to(ConnectionState::Broken) {
            self.state = ConnectionState::Broken;
        }
        tracing::debug!(error = %error, "connection broken");
        error
    }
}

/// Encode before touching connection state so a rejected request leaves it as it was
fn encode(request: &AdminRequest) -> Result<BytesMut> {
    encode_request(request).map_err(|e| Error::InvalidRequest(e.to_string()))
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("transport", &self.transport)
            .field("state", &self.state)
            .finish()
    }
}
