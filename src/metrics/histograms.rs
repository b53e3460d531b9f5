//! Histogram metrics

use super::labels;

/// Record how long an engine operation took, lock wait included
pub fn operation_duration(operation: &'static str, duration_ms: u64) {
    metrics::histogram!(
        "aerospike_creds_operation_duration_ms",
        labels::OPERATION => operation
    )
    .record(duration_ms as f64);
}
