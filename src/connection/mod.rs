//! Connection management
//!
//! This module handles:
//! * Transport abstraction (plain TCP vs TLS)
//! * Connection lifecycle (open, login, admin command execution, close)
//! * State machine enforcement
//! * TLS material loading

mod conn;
#[cfg(test)]
pub(crate) mod mock_server;
mod state;
mod tls;
mod transport;

pub use conn::{
    Auth, ClientPolicy, ClientPolicyBuilder, Connection, Session, DEFAULT_ADMIN_TIMEOUT,
    DEFAULT_CONNECT_TIMEOUT,
};
pub use state::ConnectionState;
pub use tls::{parse_server_name, TlsConfig, TlsConfigBuilder};
pub use transport::Transport;
