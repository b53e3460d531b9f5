//! Metric label names and values

/// Engine operation label
pub const OPERATION: &str = "operation";
/// Outcome label
pub const STATUS: &str = "status";
/// Error category label
pub const CATEGORY: &str = "category";

/// Successful outcome
pub const STATUS_OK: &str = "ok";
/// Failed outcome
pub const STATUS_ERROR: &str = "error";

/// `initialize` operation
pub const OP_INITIALIZE: &str = "initialize";
/// `create_user` operation
pub const OP_CREATE_USER: &str = "create_user";
/// `set_credentials` operation
pub const OP_SET_CREDENTIALS: &str = "set_credentials";
/// `renew_user` operation
pub const OP_RENEW_USER: &str = "renew_user";
/// `revoke_user` operation
pub const OP_REVOKE_USER: &str = "revoke_user";
/// `rotate_root_credentials` operation
pub const OP_ROTATE_ROOT: &str = "rotate_root_credentials";
/// `close` operation
pub const OP_CLOSE: &str = "close";
