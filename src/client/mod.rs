//! Database client layer
//!
//! * Host spec parsing into seed endpoints
//! * The [`AdminClient`] / [`ClientFactory`] seam the credential engine is written against
//! * The Aerospike implementation of that seam

mod admin;
mod host_spec;
pub mod password;

pub use admin::{AdminClient, AerospikeClient, AerospikeClientFactory, ClientFactory};
pub use host_spec::{parse_hosts, Endpoint, DEFAULT_PORT};
