//! TLS configuration for secure connections to Aerospike.
//!
//! TLS is enabled only when a CA certificate is supplied; the CA becomes the
//! sole trust anchor. An optional PEM blob holding a client certificate followed
//! by its unencrypted private key turns on mutual TLS.

use crate::{Error, Result};
use rustls::ClientConfig;
use rustls::RootCertStore;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use std::sync::Arc;

/// Validated TLS material: trust anchors plus an optional client keypair.
///
/// # Examples
///
/// ```ignore
/// use aerospike_creds::connection::TlsConfig;
///
/// // TLS disabled
/// assert!(TlsConfig::from_pem(None, None)?.is_none());
///
/// // Server verification against a private CA
/// let tls = TlsConfig::builder().ca_pem(ca_bytes).build()?;
///
/// // Mutual TLS
/// let tls = TlsConfig::builder()
///     .ca_pem(ca_bytes)
///     .certificate_key_pem(cert_and_key_bytes)
///     .build()?;
/// ```
#[derive(Clone)]
pub struct TlsConfig {
    /// Number of trust anchors loaded from the CA bundle
    ca_count: usize,
    /// Whether a client certificate is presented
    client_auth: bool,
    /// Compiled rustls ClientConfig
    client_config: Arc<ClientConfig>,
}

impl TlsConfig {
    /// Create a new TLS configuration builder.
    pub fn builder() -> TlsConfigBuilder {
        TlsConfigBuilder::default()
    }

    /// Build TLS material from raw PEM bytes.
    ///
    /// Returns `Ok(None)` when no CA is supplied (TLS disabled). Empty byte
    /// slices count as absent.
    pub fn from_pem(ca: Option<&[u8]>, certificate_key: Option<&[u8]>) -> Result<Option<Self>> {
        let Some(ca) = ca.filter(|ca| !ca.is_empty()) else {
            return Ok(None);
        };

        let mut builder = Self::builder().ca_pem(ca);
        if let Some(certificate_key) = certificate_key.filter(|ck| !ck.is_empty()) {
            builder = builder.certificate_key_pem(certificate_key);
        }
        builder.build().map(Some)
    }

    /// Get the rustls ClientConfig for this TLS configuration.
    pub fn client_config(&self) -> Arc<ClientConfig> {
        self.client_config.clone()
    }

    /// Whether a client certificate will be presented (mutual TLS).
    pub fn has_client_auth(&self) -> bool {
        self.client_auth
    }

    /// Number of trusted CA certificates.
    pub fn ca_count(&self) -> usize {
        self.ca_count
    }
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("ca_count", &self.ca_count)
            .field("client_auth", &self.client_auth)
            .field("client_config", &"<ClientConfig>")
            .finish()
    }
}

/// Builder for TLS configuration.
#[derive(Default)]
pub struct TlsConfigBuilder {
    ca_pem: Vec<u8>,
    certificate_key_pem: Option<Vec<u8>>,
}

impl TlsConfigBuilder {
    /// Set the PEM-encoded CA bundle used as trust anchor.
    pub fn ca_pem(mut self, pem: impl AsRef<[u8]>) -> Self {
        self.ca_pem = pem.as_ref().to_vec();
        self
    }

    /// Set the PEM blob holding the client certificate and its private key.
    pub fn certificate_key_pem(mut self, pem: impl AsRef<[u8]>) -> Self {
        self.certificate_key_pem = Some(pem.as_ref().to_vec());
        self
    }

    /// Build the TLS configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCaCertificate`] if the CA bundle holds no usable certificate
    /// - [`Error::InvalidClientCertificate`] if the client blob is malformed, lacks a
    ///   certificate or key, or the key is unsupported
    pub fn build(self) -> Result<TlsConfig> {
        let (root_store, ca_count) = load_roots(&self.ca_pem)?;

        let builder = ClientConfig::builder().with_root_certificates(root_store);

        let (client_config, client_auth) = match &self.certificate_key_pem {
            Some(pem) => {
                let (certs, key) = load_certificate_key(pem)?;
                let config = builder
                    .with_client_auth_cert(certs, key)
                    .map_err(|e| Error::InvalidClientCertificate(e.to_string()))?;
                (config, true)
            }
            None => (builder.with_no_client_auth(), false),
        };

        Ok(TlsConfig {
            ca_count,
            client_auth,
            client_config: Arc::new(client_config),
        })
    }
}

/// Parse every certificate in the CA bundle into a root store.
fn load_roots(pem: &[u8]) -> Result<(RootCertStore, usize)> {
    let mut reader = std::io::Cursor::new(pem);
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| Error::InvalidCaCertificate)?;

    let mut root_store = RootCertStore::empty();
    let (added, ignored) = root_store.add_parsable_certificates(certs);
    if ignored > 0 {
        tracing::warn!(ignored, "skipped unparsable CA certificates");
    }
    if added == 0 {
        return Err(Error::InvalidCaCertificate);
    }

    Ok((root_store, added))
}

/// Read the certificate chain and private key out of one PEM blob.
fn load_certificate_key(
    pem: &[u8],
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
    let mut reader = std::io::Cursor::new(pem);
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| Error::InvalidClientCertificate(format!("reading certificate: {}", e)))?;
    if certs.is_empty() {
        return Err(Error::InvalidClientCertificate(
            "no certificate found".to_string(),
        ));
    }

    let mut reader = std::io::Cursor::new(pem);
    let key = rustls_pemfile::private_key(&mut reader)
        .map_err(|e| Error::InvalidClientCertificate(format!("reading private key: {}", e)))?
        .ok_or_else(|| Error::InvalidClientCertificate("no private key found".to_string()))?;

    Ok((certs, key))
}

/// Validate the name presented for TLS SNI and certificate verification.
///
/// # Arguments
///
/// * `hostname` - Hostname or TLS name override (without port)
///
/// # Errors
///
/// Returns an error if the name is empty, too long, or contains characters that
/// cannot appear in a DNS name or IP address.
pub fn parse_server_name(hostname: &str) -> Result<String> {
    // Remove trailing dot if present
    let hostname = hostname.trim_end_matches('.');

    if hostname.is_empty() || hostname.len() > 253 {
        return Err(Error::Config(format!(
            "invalid hostname for TLS: '{}'",
            hostname
        )));
    }

    if !hostname
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | ':'))
    {
        return Err(Error::Config(format!(
            "invalid hostname for TLS: '{}'",
            hostname
        )));
    }

    Ok(hostname.to_string())
}
