//! Host device metrics.
//!
//! All metrics follow Prometheus naming conventions (`_total` suffix for counters).
//! No exporter is installed here; without a recorder the macros are no-ops.

use metrics::{counter, describe_counter};

/// Register all host device metrics with descriptions.
pub fn register_metrics() {
    describe_counter!(
        "hostdev_addresses_allocated_total",
        "Total number of addresses popped from a pool (by pool)"
    );
    describe_counter!(
        "hostdev_pool_exhausted_total",
        "Total number of allocations that found an empty pool (by pool)"
    );
    describe_counter!(
        "hostdev_descriptors_built_total",
        "Total number of host device descriptors built (by kind)"
    );
    describe_counter!(
        "hostdev_count_mismatch_total",
        "Total number of builds rejected because built and requested counts differ (by kind)"
    );
}

pub fn record_allocation(pool: &'static str) {
    counter!("hostdev_addresses_allocated_total", "pool" => pool).increment(1);
}

pub fn record_pool_exhausted(pool: &'static str) {
    counter!("hostdev_pool_exhausted_total", "pool" => pool).increment(1);
}

pub fn record_descriptors_built(kind: &'static str, count: usize) {
    counter!("hostdev_descriptors_built_total", "kind" => kind).increment(count as u64);
}

pub fn record_count_mismatch(kind: &'static str) {
    counter!("hostdev_count_mismatch_total", "kind" => kind).increment(1);
}
