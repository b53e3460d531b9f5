//! Aerospike admin wire protocol
//!
//! Only the security subset needed for user management is implemented:
//! login/authenticate, create user, drop user, set password and change password.

pub mod constants;
pub mod decode;
pub mod encode;
pub mod message;

pub use decode::decode_response;
pub use encode::encode_request;
pub use message::{AdminRequest, AdminResponse};
