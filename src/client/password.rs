//! Credential hashing for the admin protocol
//!
//! The server never sees plaintext passwords: every password field carries a
//! bcrypt hash computed with a fixed, protocol-mandated salt and cost.

use crate::protocol::constants::{CREDENTIAL_COST, CREDENTIAL_SALT};
use crate::{Error, Result};
use base64::alphabet;
use base64::engine::{general_purpose::GeneralPurpose, DecodePaddingMode, GeneralPurposeConfig};
use base64::Engine;
use bcrypt::Version;

const BCRYPT_B64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::BCRYPT,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

/// Hash a password the way the server expects it.
///
/// bcrypt is deliberately slow; call [`hash_password_blocking`] from async code.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = decode_salt()?;
    let parts = bcrypt::hash_with_salt(password, CREDENTIAL_COST, salt)
        .map_err(|e| Error::CredentialGeneration(format!("hashing password: {}", e)))?;
    Ok(parts.format_for_version(Version::TwoA))
}

/// Hash a password on the blocking thread pool
pub async fn hash_password_blocking(password: &str) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| Error::CredentialGeneration(format!("hashing task failed: {}", e)))?
}

fn decode_salt() -> Result<[u8; 16]> {
    let bytes = BCRYPT_B64
        .decode(CREDENTIAL_SALT)
        .map_err(|e| Error::CredentialGeneration(format!("decoding salt: {}", e)))?;
    bytes
        .get(..16)
        .and_then(|salt| salt.try_into().ok())
        .ok_or_else(|| Error::CredentialGeneration("salt shorter than 16 bytes".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_uses_fixed_salt() {
        let hash = hash_password("admin").unwrap();
        assert!(hash.starts_with("$2a$10$7EqJtq98hPqEX7fNZaFWoO"));
        assert_eq!(hash.len(), 60);
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_password("secret").unwrap(), hash_password("secret").unwrap());
        assert_ne!(hash_password("secret").unwrap(), hash_password("other").unwrap());
    }

    #[tokio::test]
    async fn test_hash_blocking_matches() {
        let hash = hash_password_blocking("admin").await.unwrap();
        assert_eq!(hash, hash_password("admin").unwrap());
    }
}
