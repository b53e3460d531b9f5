//! Username and password generation

use crate::{Error, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Length of the random part of usernames and passwords
const RANDOM_LEN: usize = 20;

/// Fixed password prefix guaranteeing upper, lower, digit and symbol classes
const PASSWORD_PREFIX: &str = "A1a-";

/// Names the control plane supplies for a dynamic user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsernameConfig {
    /// Display name of the requesting token or entity
    pub display_name: String,
    /// Name of the role the credentials are issued for
    pub role_name: String,
}

/// Policy for synthesizing credentials
pub trait CredentialsProducer: Send + Sync {
    /// Generate a unique username
    fn generate_username(&self, config: &UsernameConfig) -> Result<String>;

    /// Generate a random password
    fn generate_password(&self) -> Result<String>;
}

/// `v-<display>-<role>-<random>-<unix seconds>` usernames, truncated to a limit
///
/// Limits count UTF-8 bytes; truncation never splits a character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlCredentialsProducer {
    /// Maximum bytes kept from the display name
    pub display_name_len: usize,
    /// Maximum bytes kept from the role name
    pub role_name_len: usize,
    /// Maximum username length in bytes
    pub username_len: usize,
    /// Separator between username parts
    pub separator: String,
}

impl Default for SqlCredentialsProducer {
    /// Limits matching Aerospike's identifier rules
    fn default() -> Self {
        Self {
            display_name_len: 15,
            role_name_len: 15,
            username_len: 63,
            separator: "-".to_string(),
        }
    }
}

impl CredentialsProducer for SqlCredentialsProducer {
    fn generate_username(&self, config: &UsernameConfig) -> Result<String> {
        let mut username = String::from("v");

        for (part, limit) in [
            (&config.display_name, self.display_name_len),
            (&config.role_name, self.role_name_len),
        ] {
            if !part.is_empty() {
                username.push_str(&self.separator);
                username.push_str(truncate_bytes(part, limit));
            }
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| Error::CredentialGeneration(format!("system clock: {}", e)))?;

        username.push_str(&self.separator);
        username.push_str(&random_alphanumeric(RANDOM_LEN));
        username.push_str(&self.separator);
        username.push_str(&now.as_secs().to_string());

        Ok(truncate_bytes(&username, self.username_len).to_string())
    }

    fn generate_password(&self) -> Result<String> {
        Ok(format!("{}{}", PASSWORD_PREFIX, random_alphanumeric(RANDOM_LEN)))
    }
}

/// Longest prefix of `s` that fits in `max` bytes and ends on a char boundary
fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let end = s
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= max)
        .last()
        .unwrap_or(0);
    &s[..end]
}

fn random_alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
