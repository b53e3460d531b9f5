//! Host spec parsing
//!
//! A host spec is a comma-separated list of entries, each of the form
//! `host`, `host:port` or `host:tls_name:port`. Entries are not trimmed.

use crate::{Error, Result};
use std::fmt;

/// Port used when an entry names none
pub const DEFAULT_PORT: u16 = 3000;

/// One seed endpoint of the cluster
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Host name or address
    pub name: String,
    /// Name the server certificate must match, when it differs from `name`
    pub tls_name: Option<String>,
    /// TCP port
    pub port: u16,
}

impl Endpoint {
    /// Create an endpoint without a TLS name
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            tls_name: None,
            port,
        }
    }

    /// Name used for SNI and certificate verification
    pub fn server_name(&self) -> &str {
        self.tls_name.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tls_name {
            Some(tls_name) => write!(f, "{}:{}:{}", self.name, tls_name, self.port),
            None => write!(f, "{}:{}", self.name, self.port),
        }
    }
}

/// Parse a host spec into endpoints, in order.
///
/// # Errors
///
/// - [`Error::EmptyHost`] for an empty spec
/// - [`Error::InvalidHostSpec`] when an entry has more than three components
/// - [`Error::InvalidPort`] when an entry's port is not a number in `0..=65535`
///
/// Indexes in errors are 1-based.
///
/// # Examples
///
/// ```
/// use aerospike_creds::client::parse_hosts;
///
/// let hosts = parse_hosts("db1:3001,db2:tls-db2:4333").unwrap();
/// assert_eq!(hosts[0].port, 3001);
/// assert_eq!(hosts[1].server_name(), "tls-db2");
/// ```
pub fn parse_hosts(spec: &str) -> Result<Vec<Endpoint>> {
    if spec.is_empty() {
        return Err(Error::EmptyHost);
    }

    spec.split(',')
        .enumerate()
        .map(|(i, entry)| parse_entry(i + 1, entry))
        .collect()
}

fn parse_entry(index: usize, entry: &str) -> Result<Endpoint> {
    let parts: Vec<&str> = entry.split(':').collect();

    let (name, tls_name, port) = match parts.as_slice() {
        [name] => (*name, None, None),
        [name, port] => (*name, None, Some(*port)),
        [name, tls_name, port] => (*name, Some(*tls_name), Some(*port)),
        _ => return Err(Error::InvalidHostSpec { index }),
    };

    let port = match port {
        Some(port) => port
            .parse::<u16>()
            .map_err(|source| Error::InvalidPort { index, source })?,
        None => DEFAULT_PORT,
    };

    Ok(Endpoint {
        name: name.to_string(),
        tls_name: tls_name.map(str::to_string),
        port,
    })
}
