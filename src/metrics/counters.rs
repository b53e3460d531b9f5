//! Counter metrics

use super::labels;
use crate::ErrorCategory;

/// Record the outcome of an engine operation
pub fn operation_completed(operation: &'static str, ok: bool) {
    let status = if ok {
        labels::STATUS_OK
    } else {
        labels::STATUS_ERROR
    };
    metrics::counter!(
        "aerospike_creds_operations_total",
        labels::OPERATION => operation,
        labels::STATUS => status
    )
    .increment(1);
}

/// Record a failed engine operation by error category
pub fn operation_error(operation: &'static str, category: ErrorCategory) {
    metrics::counter!(
        "aerospike_creds_operation_errors_total",
        labels::OPERATION => operation,
        labels::CATEGORY => category.as_str()
    )
    .increment(1);
}

/// A new admin client was connected
pub fn connection_established() {
    metrics::counter!(
        "aerospike_creds_connections_total",
        labels::STATUS => labels::STATUS_OK
    )
    .increment(1);
}

/// Connecting an admin client failed
pub fn connection_failed() {
    metrics::counter!(
        "aerospike_creds_connections_total",
        labels::STATUS => labels::STATUS_ERROR
    )
    .increment(1);
}

/// A dead cached client is being replaced
pub fn reconnect() {
    metrics::counter!("aerospike_creds_reconnects_total").increment(1);
}

/// Record the outcome of a root credential rotation
pub fn root_rotation(ok: bool) {
    let status = if ok {
        labels::STATUS_OK
    } else {
        labels::STATUS_ERROR
    };
    metrics::counter!(
        "aerospike_creds_root_rotations_total",
        labels::STATUS => status
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_without_recorder() {
        // no recorder installed: recording is a no-op and must not panic
        operation_completed(labels::OP_CREATE_USER, true);
        operation_error(labels::OP_REVOKE_USER, ErrorCategory::RemoteOperation);
        connection_established();
        connection_failed();
        reconnect();
        root_rotation(false);
    }
}
