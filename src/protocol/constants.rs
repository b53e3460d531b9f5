//! Aerospike admin protocol constants

/// Proto header version
pub const MSG_VERSION: u8 = 2;

/// Proto header message type for admin (security) commands
pub const MSG_TYPE_ADMIN: u8 = 2;

/// Proto header size: version (1) + type (1) + body size (6)
pub const PROTO_HEADER_SIZE: usize = 8;

/// Admin header size following the proto header
pub const ADMIN_HEADER_SIZE: usize = 16;

/// Field header size: length (4) + id (1)
pub const FIELD_HEADER_SIZE: usize = 5;

/// Offset of the result code within the admin header of a response
pub const RESULT_CODE_OFFSET: usize = 1;

/// Offset of the command byte within the admin header of a request
pub const COMMAND_OFFSET: usize = 2;

/// Offset of the field count within the admin header
pub const FIELD_COUNT_OFFSET: usize = 3;

/// Fixed bcrypt salt mandated by the protocol for credential hashing
pub const CREDENTIAL_SALT: &str = "7EqJtq98hPqEX7fNZaFWoO";

/// bcrypt cost used with [`CREDENTIAL_SALT`]
pub const CREDENTIAL_COST: u32 = 10;

/// Admin command codes
pub mod commands {
    /// Authenticate a socket with a session token or credential
    pub const AUTHENTICATE: u8 = 0;

    /// Create a user with roles
    pub const CREATE_USER: u8 = 1;

    /// Drop a user
    pub const DROP_USER: u8 = 2;

    /// Set another user's password (administrator)
    pub const SET_PASSWORD: u8 = 3;

    /// Change one's own password (requires the old credential)
    pub const CHANGE_PASSWORD: u8 = 4;

    /// Log in and obtain a session token
    pub const LOGIN: u8 = 20;
}

/// Admin field identifiers
pub mod fields {
    /// User name
    pub const USER: u8 = 0;

    /// Hashed password
    pub const PASSWORD: u8 = 1;

    /// Previous hashed password
    pub const OLD_PASSWORD: u8 = 2;

    /// Hashed credential used for login
    pub const CREDENTIAL: u8 = 3;

    /// Session token returned by login
    pub const SESSION_TOKEN: u8 = 5;

    /// Session time-to-live in seconds
    pub const SESSION_TTL: u8 = 6;

    /// Role list
    pub const ROLES: u8 = 10;
}

/// Result codes returned in admin responses
pub mod result_codes {
    /// Success
    pub const OK: u8 = 0;
    /// Security functionality not supported by connected server
    pub const SECURITY_NOT_SUPPORTED: u8 = 51;
    /// Security functionality not enabled by connected server
    pub const SECURITY_NOT_ENABLED: u8 = 52;
    /// Security scheme not supported
    pub const SECURITY_SCHEME_NOT_SUPPORTED: u8 = 53;
    /// Administration command is invalid
    pub const INVALID_COMMAND: u8 = 54;
    /// Administration field is invalid
    pub const INVALID_FIELD: u8 = 55;
    /// Security protocol not followed
    pub const ILLEGAL_STATE: u8 = 56;
    /// User name is invalid
    pub const INVALID_USER: u8 = 60;
    /// User was previously created
    pub const USER_ALREADY_EXISTS: u8 = 61;
    /// Password is invalid
    pub const INVALID_PASSWORD: u8 = 62;
    /// Password has expired
    pub const EXPIRED_PASSWORD: u8 = 63;
    /// Forbidden password (e.g. recently used)
    pub const FORBIDDEN_PASSWORD: u8 = 64;
    /// Security credential is invalid
    pub const INVALID_CREDENTIAL: u8 = 65;
    /// Login session expired
    pub const EXPIRED_SESSION: u8 = 66;
    /// Role name is invalid
    pub const INVALID_ROLE: u8 = 70;
    /// Role already exists
    pub const ROLE_ALREADY_EXISTS: u8 = 71;
    /// Privilege is invalid
    pub const INVALID_PRIVILEGE: u8 = 72;
    /// User must be authenticated before performing database operations
    pub const NOT_AUTHENTICATED: u8 = 80;
    /// User does not possess the required role
    pub const ROLE_VIOLATION: u8 = 81;
    /// Client address is not allowed
    pub const NOT_WHITELISTED: u8 = 82;
    /// Quota exceeded
    pub const QUOTA_EXCEEDED: u8 = 83;

    /// Human-readable description of a result code
    pub fn describe(code: u8) -> &'static str {
        match code {
            OK => "ok",
            SECURITY_NOT_SUPPORTED => "security not supported",
            SECURITY_NOT_ENABLED => "security not enabled",
            SECURITY_SCHEME_NOT_SUPPORTED => "security scheme not supported",
            INVALID_COMMAND => "invalid command",
            INVALID_FIELD => "invalid field",
            ILLEGAL_STATE => "illegal state",
            INVALID_USER => "invalid user",
            USER_ALREADY_EXISTS => "user already exists",
            INVALID_PASSWORD => "invalid password",
            EXPIRED_PASSWORD => "expired password",
            FORBIDDEN_PASSWORD => "forbidden password",
            INVALID_CREDENTIAL => "invalid credential",
            EXPIRED_SESSION => "expired session",
            INVALID_ROLE => "invalid role",
            ROLE_ALREADY_EXISTS => "role already exists",
            INVALID_PRIVILEGE => "invalid privilege",
            NOT_AUTHENTICATED => "not authenticated",
            ROLE_VIOLATION => "role violation",
            NOT_WHITELISTED => "client address not allowed",
            QUOTA_EXCEEDED => "quota exceeded",
            _ => "server error",
        }
    }
}
