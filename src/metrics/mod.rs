//! Metrics for the credential engine
//!
//! Recorded through the `metrics` facade; installing an exporter is left to
//! the embedding process.
//!
//! * `aerospike_creds_operations_total{operation,status}`
//! * `aerospike_creds_operation_errors_total{operation,category}`
//! * `aerospike_creds_operation_duration_ms{operation}`
//! * `aerospike_creds_connections_total{status}`
//! * `aerospike_creds_reconnects_total`
//! * `aerospike_creds_root_rotations_total{status}`

pub mod counters;
pub mod histograms;
pub mod labels;
