//! Protocol message types

use super::constants::fields;
use bytes::Bytes;

/// Admin request (client → server)
///
/// Password-like fields carry bcrypt hashes, never plaintext.
#[derive(Clone)]
pub enum AdminRequest {
    /// Log in with a hashed credential
    Login {
        /// User name
        user: String,
        /// Hashed credential
        credential: String,
    },

    /// Authenticate the socket with a session token from a previous login
    Authenticate {
        /// User name
        user: String,
        /// Session token
        session_token: Bytes,
    },

    /// Create a user with the given roles
    CreateUser {
        /// User name
        user: String,
        /// Hashed password
        password_hash: String,
        /// Roles to grant
        roles: Vec<String>,
    },

    /// Drop a user
    DropUser {
        /// User name
        user: String,
    },

    /// Set another user's password
    SetPassword {
        /// User name
        user: String,
        /// Hashed new password
        password_hash: String,
    },

    /// Change the authenticated user's own password
    ChangePassword {
        /// User name
        user: String,
        /// Hashed current password
        old_password_hash: String,
        /// Hashed new password
        password_hash: String,
    },
}

impl AdminRequest {
    /// Short name used in logs and spans
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::Authenticate { .. } => "authenticate",
            Self::CreateUser { .. } => "create_user",
            Self::DropUser { .. } => "drop_user",
            Self::SetPassword { .. } => "set_password",
            Self::ChangePassword { .. } => "change_password",
        }
    }
}

impl std::fmt::Debug for AdminRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateUser { user, roles, .. } => f
                .debug_struct("CreateUser")
                .field("user", user)
                .field("roles", roles)
                .finish_non_exhaustive(),
            Self::Login { user, .. }
            | Self::Authenticate { user, .. }
            | Self::DropUser { user }
            | Self::SetPassword { user, .. }
            | Self::ChangePassword { user, .. } => f
                .debug_struct(self.name())
                .field("user", user)
                .finish_non_exhaustive(),
        }
    }
}

/// Admin response (server → client)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminResponse {
    /// Result code from the admin header
    pub result_code: u8,
    /// Fields following the header, in wire order
    pub fields: Vec<(u8, Bytes)>,
}

impl AdminResponse {
    /// First field with the given id
    pub fn field(&self, id: u8) -> Option<&Bytes> {
        self.fields
            .iter()
            .find(|(field_id, _)| *field_id == id)
            .map(|(_, data)| data)
    }

    /// Session token returned by a login
    pub fn session_token(&self) -> Option<&Bytes> {
        self.field(fields::SESSION_TOKEN)
    }

    /// Session TTL in seconds returned by a login
    pub fn session_ttl(&self) -> Option<u32> {
        let data = self.field(fields::SESSION_TTL)?;
        let bytes: [u8; 4] = data.as_ref().try_into().ok()?;
        Some(u32::from_be_bytes(bytes))
    }
}
