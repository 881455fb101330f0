#![allow(dead_code)]

use machineview::datamodel::{MachineDateTime, MachineDateTimeExt, MetricRecord};
use machineview::parsing::parse_machine_data;
use time::{OffsetDateTime, UtcOffset};

pub mod fixtures;

/// Parses a JSON array payload at UTC, panicking on failure.
pub fn parse_json(payload: &str) -> Vec<MetricRecord> {
    parse_machine_data(payload.as_bytes(), UtcOffset::UTC)
        .expect("payload should parse")
        .records
}

pub fn instant(datetime: OffsetDateTime) -> MachineDateTime {
    MachineDateTime::from_offset_datetime(&datetime)
}
