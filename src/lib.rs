//! Credential lifecycle broker for Aerospike
//!
//! Creates, rotates and revokes Aerospike users on behalf of a secrets-management
//! control plane, over a single lazily (re)established admin connection.
//!
//! # Layout
//!
//! * [`client`]: host spec parsing and the admin client seam
//! * [`connection`]: transport, TLS material, login and admin round trips
//! * [`protocol`]: the admin wire protocol
//! * [`producer`]: configuration and the shared, lock-guarded connection
//! * [`credentials`]: username/password policy and creation statements
//! * [`database`]: the credential engine
//! * [`sanitizer`]: secret scrubbing for outgoing errors
//!
//! # Example
//!
//! ```no_run
//! use aerospike_creds::client::AerospikeClientFactory;
//! use aerospike_creds::database::Database;
//! use serde_json::json;
//!
//! # async fn example() -> aerospike_creds::Result<()> {
//! let db = aerospike_creds::new(AerospikeClientFactory::new());
//!
//! let config = match json!({
//!     "host": "aerospike-1:3000,aerospike-2:3000",
//!     "username": "admin",
//!     "password": "admin",
//! }) {
//!     serde_json::Value::Object(map) => map,
//!     _ => unreachable!(),
//! };
//! db.initialize(config, true).await?;
//! db.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod connection;
pub mod credentials;
pub mod database;
pub mod error;
pub mod metrics;
pub mod producer;
pub mod protocol;
pub mod sanitizer;

pub use database::{Aerospike, Database, TYPE_NAME};
pub use error::{Error, ErrorCategory, Result};
pub use sanitizer::ErrorSanitizer;

/// Build the engine the way the control plane loads it: an [`Aerospike`]
/// engine behind an [`ErrorSanitizer`].
pub fn new<F: client::ClientFactory>(factory: F) -> ErrorSanitizer<Aerospike<F>> {
    ErrorSanitizer::new(Aerospike::new(factory))
}
