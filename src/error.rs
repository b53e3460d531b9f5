//! Error types for the credential broker
//!
//! Every fallible operation in the crate returns [`Result`]. Variants are grouped
//! into four categories (see [`ErrorCategory`]) that decide how a caller should
//! react: configuration errors are terminal, connection errors are retried by the
//! next call reconnecting once, remote errors are never retried, and invariant
//! errors are local precondition failures raised before any remote call.

use std::collections::HashMap;
use std::io;
use std::num::ParseIntError;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Broker error
#[derive(Debug, Error)]
pub enum Error {
    /// A required configuration field was empty or missing
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// The host spec string was empty
    #[error("host cannot be empty")]
    EmptyHost,

    /// A host entry had more than three colon-delimited components
    #[error("too many components for host #{index}")]
    InvalidHostSpec {
        /// 1-based index of the offending entry
        index: usize,
    },

    /// A host entry's port did not parse as a port number
    #[error("invalid port number for host #{index}: {source}")]
    InvalidPort {
        /// 1-based index of the offending entry
        index: usize,
        /// Underlying parse failure
        #[source]
        source: ParseIntError,
    },

    /// `tls_ca` contained no usable certificate
    #[error("failed to append CA to client policy")]
    InvalidCaCertificate,

    /// `tls_certificate_key` could not be loaded as a certificate + private key
    #[error("unable to load tls_certificate_key_data: {0}")]
    InvalidClientCertificate(String),

    /// Configuration could not be decoded or is otherwise invalid
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An operation ran before a successful `initialize`
    #[error("connection has not been initialized")]
    NotInitialized,

    /// `initialize(verify = true)` could not establish a live connection
    #[error("error verifying connection: {0}")]
    VerifyConnection(#[source] Box<Error>),

    /// The client reported itself not connected right after being created
    #[error("not connected")]
    NotConnected,

    /// I/O error on the transport
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The server closed the connection
    #[error("connection closed")]
    ConnectionClosed,

    /// No endpoint accepted a connection
    #[error("unable to connect to any host: {0}")]
    Connect(String),

    /// TLS handshake failed
    #[error("TLS handshake failed: {0}")]
    Tls(String),

    /// Malformed or unexpected wire data
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Login was rejected by the server
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Connection state machine violation
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// Expected state
        expected: String,
        /// Actual state
        actual: String,
    },

    /// A bounded step did not finish in time
    #[error("{0} timed out")]
    Timeout(&'static str),

    /// Opening a connection to an endpoint did not finish in time
    #[error("connect to {endpoint} timed out")]
    ConnectTimeout {
        /// Endpoint that did not answer
        endpoint: String,
    },

    /// The server rejected an admin command
    #[error("{message} (result code {code})")]
    Server {
        /// Aerospike result code
        code: u8,
        /// Human-readable meaning of the code
        message: String,
    },

    /// An admin request could not be encoded; nothing was sent
    #[error("invalid admin request: {0}")]
    InvalidRequest(String),

    /// No creation statement was supplied
    #[error("empty creation statements")]
    EmptyCreationStatement,

    /// The creation statement was not valid JSON
    #[error("invalid creation statement: {0}")]
    MalformedStatement(#[source] serde_json::Error),

    /// The creation statement named no roles
    #[error("roles array is required in creation statement")]
    RolesRequired,

    /// Root rotation needs a configured username and password
    #[error("username and password are required to rotate")]
    RotationPrerequisiteMissing,

    /// Username or password generation failed
    #[error("failed to generate credentials: {0}")]
    CredentialGeneration(String),

    /// An error whose text had secret values scrubbed from it
    #[error("{message}")]
    Redacted {
        /// Category of the error before scrubbing
        category: ErrorCategory,
        /// Scrubbed message
        message: String,
    },
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad or missing configuration; terminal for the `initialize` call
    Configuration,
    /// Endpoint unreachable, handshake or transport failure
    Connection,
    /// The database rejected the requested change
    RemoteOperation,
    /// Local precondition failed before any remote call
    Invariant,
}

impl ErrorCategory {
    /// Label used for metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Connection => "connection",
            Self::RemoteOperation => "remote_operation",
            Self::Invariant => "invariant",
        }
    }
}

impl Error {
    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::EmptyField(_)
            | Error::EmptyHost
            | Error::InvalidHostSpec { .. }
            | Error::InvalidPort { .. }
            | Error::InvalidCaCertificate
            | Error::InvalidClientCertificate(_)
            | Error::Config(_) => ErrorCategory::Configuration,

            Error::VerifyConnection(_)
            | Error::NotConnected
            | Error::Io(_)
            | Error::ConnectionClosed
            | Error::Connect(_)
            | Error::Tls(_)
            | Error::Protocol(_)
            | Error::Authentication(_)
            | Error::InvalidState { .. }
            | Error::Timeout(_)
            | Error::ConnectTimeout { .. } => ErrorCategory::Connection,

            Error::Server { .. } => ErrorCategory::RemoteOperation,

            Error::Redacted { category, .. } => *category,

            Error::NotInitialized
            | Error::EmptyCreationStatement
            | Error::MalformedStatement(_)
            | Error::RolesRequired
            | Error::RotationPrerequisiteMissing
            | Error::CredentialGeneration(_)
            | Error::InvalidRequest(_) => ErrorCategory::Invariant,
        }
    }

    /// Scrub secret values out of this error's message.
    ///
    /// `secrets` maps plaintext secrets to their placeholders. Errors whose message
    /// contains none of the secrets are returned unchanged, so their variant survives.
    pub fn redact(self, secrets: &HashMap<String, String>) -> Error {
        let message = self.to_string();
        let mut scrubbed = message.clone();
        for (secret, placeholder) in secrets {
            if secret.is_empty() {
                continue;
            }
            scrubbed = scrubbed.replace(secret.as_str(), placeholder);
        }

        if scrubbed == message {
            self
        } else {
            Error::Redacted {
                category: self.category(),
                message: scrubbed,
            }
        }
    }
}
