use super::machine_datetime::{MachineDateTime, MachineDateTimeExt};
use crate::error::{MachineViewError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Keys of a backend row that are never metric channels.
pub const RESERVED_KEYS: [&str; 6] = ["id", "ID", "Timestamp", "timestamp", "Date", "date"];

/// Name of a numeric telemetry channel, such as `G19` or `MISFAT_3_G10f`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MetricName(String);

impl MetricName {
    pub fn new(name: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(MachineViewError::invalid_metric_name(name, "empty name"));
        }
        if name.chars().any(char::is_control) {
            return Err(MachineViewError::invalid_metric_name(
                name,
                "contains control characters",
            ));
        }
        if RESERVED_KEYS.contains(&name) {
            return Err(MachineViewError::invalid_metric_name(name, "reserved key"));
        }
        Ok(MetricName(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MetricName {
    type Err = MachineViewError;

    fn from_str(s: &str) -> Result<Self> {
        MetricName::new(s)
    }
}

impl TryFrom<String> for MetricName {
    type Error = MachineViewError;

    fn try_from(value: String) -> Result<Self> {
        MetricName::new(&value)
    }
}

impl From<MetricName> for String {
    fn from(value: MetricName) -> Self {
        value.0
    }
}

impl AsRef<str> for MetricName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One timestamped row of machine telemetry.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub id: i64,
    pub timestamp: MachineDateTime,
    values: BTreeMap<MetricName, f64>,
}

impl MetricRecord {
    /// Non-finite values are dropped, they cannot take part in any aggregate.
    pub fn new(id: i64, timestamp: MachineDateTime, values: BTreeMap<MetricName, f64>) -> Self {
        let values = values
            .into_iter()
            .filter(|(_, value)| value.is_finite())
            .collect();
        Self {
            id,
            timestamp,
            values,
        }
    }

    pub fn value(&self, metric: &MetricName) -> Option<f64> {
        self.values.get(metric).copied()
    }

    pub fn values(&self) -> &BTreeMap<MetricName, f64> {
        &self.values
    }

    pub fn metric_names(&self) -> impl Iterator<Item = &MetricName> {
        self.values.keys()
    }

    pub fn unix_milliseconds(&self) -> i64 {
        self.timestamp.to_unix_milliseconds_i64()
    }
}

/// Indices of `records` ordered by timestamp, most recent first.
///
/// The sort is stable, so records sharing a timestamp keep their input order.
pub fn indices_newest_first(records: &[MetricRecord]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..records.len()).collect();
    indices.sort_by_key(|&i| std::cmp::Reverse(records[i].unix_milliseconds()));
    indices
}

/// The record with the greatest timestamp, the last one on ties.
pub fn latest_record(records: &[MetricRecord]) -> Option<&MetricRecord> {
    records
        .iter()
        .enumerate()
        .max_by_key(|(index, record)| (record.unix_milliseconds(), *index))
        .map(|(_, record)| record)
}
