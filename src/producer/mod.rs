//! Connection producer
//!
//! Turns a raw configuration map into endpoints, TLS material and a client
//! policy, and hands out the single cached admin client under a lock.

mod config;
mod connection_producer;

pub use config::{ConnectionConfig, RawConfig};
pub use connection_producer::{ConnectionProducer, ProducerGuard, PASSWORD_PLACEHOLDER};
