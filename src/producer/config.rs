//! Connection configuration decoding and validation
//!
//! The control plane hands over a loosely typed JSON object. Decoding is
//! lenient about value shapes (numbers where strings are expected, PEM as a
//! string or as an array of bytes); validation is strict and ordered.

use crate::client::{parse_hosts, Endpoint};
use crate::connection::{ClientPolicy, TlsConfig, DEFAULT_ADMIN_TIMEOUT, DEFAULT_CONNECT_TIMEOUT};
use crate::{Error, Result};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Configuration map as received from the control plane
pub type RawConfig = serde_json::Map<String, Value>;

/// Typed view of a [`RawConfig`]
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Comma-separated host spec
    #[serde(deserialize_with = "loose_string")]
    pub host: String,

    /// Administrative user
    #[serde(deserialize_with = "loose_string")]
    pub username: String,

    /// Administrative password
    #[serde(deserialize_with = "loose_string")]
    pub password: String,

    /// PEM CA bundle; enables TLS when non-empty
    #[serde(deserialize_with = "loose_bytes")]
    pub tls_ca: Vec<u8>,

    /// PEM client certificate followed by its private key; enables mutual TLS
    #[serde(deserialize_with = "loose_bytes")]
    pub tls_certificate_key: Vec<u8>,

    /// Bound on connection establishment
    #[serde(deserialize_with = "loose_seconds")]
    pub connect_timeout: Option<Duration>,

    /// Bound on a single admin round trip
    #[serde(deserialize_with = "loose_seconds")]
    pub admin_timeout: Option<Duration>,
}

impl ConnectionConfig {
    /// Decode a raw configuration map. Unknown keys are ignored.
    pub fn decode(raw: &RawConfig) -> Result<Self> {
        serde_json::from_value(Value::Object(raw.clone())).map_err(|e| Error::Config(e.to_string()))
    }

    /// Validate the configuration and load its derived material.
    ///
    /// Checks run in order: host present, host spec parses, username present,
    /// password present, TLS material loads.
    pub fn validate(&self) -> Result<(Vec<Endpoint>, Option<TlsConfig>)> {
        if self.host.is_empty() {
            return Err(Error::EmptyHost);
        }
        let hosts = parse_hosts(&self.host)?;

        if self.username.is_empty() {
            return Err(Error::EmptyField("username"));
        }
        if self.password.is_empty() {
            return Err(Error::EmptyField("password"));
        }

        let tls = TlsConfig::from_pem(
            Some(self.tls_ca.as_slice()),
            Some(self.tls_certificate_key.as_slice()),
        )?;
        Ok((hosts, tls))
    }

    /// Client policy for this configuration
    pub fn client_policy(&self, tls: Option<TlsConfig>) -> ClientPolicy {
        ClientPolicy::builder(self.username.clone(), self.password.clone())
            .tls(tls)
            .connect_timeout(self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT))
            .admin_timeout(self.admin_timeout.unwrap_or(DEFAULT_ADMIN_TIMEOUT))
            .build()
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("tls_ca", &format_args!("{} bytes", self.tls_ca.len()))
            .field(
                "tls_certificate_key",
                &format_args!("{} bytes", self.tls_certificate_key.len()),
            )
            .field("connect_timeout", &self.connect_timeout)
            .field("admin_timeout", &self.admin_timeout)
            .finish()
    }
}

/// Strings, numbers and booleans all decode to a string; null to empty
fn loose_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(if b { "1" } else { "0" }.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a string, got {}",
            kind(&other)
        ))),
    }
}

/// A PEM string or an array of byte values; null to empty
fn loose_bytes<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(s.into_bytes()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or_else(|| de::Error::custom("expected an array of byte values"))
            })
            .collect(),
        other => Err(de::Error::custom(format!(
            "expected PEM data, got {}",
            kind(&other)
        ))),
    }
}

/// Whole seconds as a number or numeric string; null or empty string to unset
fn loose_seconds<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_u64(),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        other => {
            return Err(de::Error::custom(format!(
                "expected seconds, got {}",
                kind(&other)
            )))
        }
    };

    secs.map(|secs| Some(Duration::from_secs(secs)))
        .ok_or_else(|| de::Error::custom("expected a non-negative whole number of seconds"))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
