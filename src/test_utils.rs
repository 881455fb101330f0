//! Test utilities for machineview tests
//!
//! Small builders for records and metric names so unit tests and the
//! integration tests in `tests/` can describe telemetry rows in one line.

use crate::datamodel::{MachineDateTime, MachineDateTimeExt, MetricName, MetricRecord};
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Builds a metric name, panicking on invalid names.
pub fn metric(name: &str) -> MetricName {
    MetricName::new(name).unwrap_or_else(|e| panic!("invalid test metric name: {}", e))
}

/// Builds a record at `datetime` with the given metric values.
pub fn record_at(id: i64, datetime: OffsetDateTime, values: &[(&str, f64)]) -> MetricRecord {
    let values: BTreeMap<MetricName, f64> = values
        .iter()
        .map(|(name, value)| (metric(name), *value))
        .collect();
    MetricRecord::new(id, MachineDateTime::from_offset_datetime(&datetime), values)
}

/// Hourly records for a single metric, starting at `start`.
pub fn hourly_records(start: OffsetDateTime, metric_name: &str, values: &[f64]) -> Vec<MetricRecord> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            record_at(
                i as i64,
                start + time::Duration::hours(i as i64),
                &[(metric_name, *value)],
            )
        })
        .collect()
}
