use super::{ParseRecords, ParsedRecords};
use crate::datamodel::machine_datetime::parse_machine_datetime;
use crate::datamodel::metric_record::RESERVED_KEYS;
use crate::datamodel::{MetricName, MetricRecord};
use crate::error::{MachineViewError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use time::UtcOffset;
use tracing::{debug, warn};

/// Parser for the `/api/machine-data` response: a JSON array of row objects.
pub struct MachineDataParser;

/// Same rows, one JSON object per line.
pub struct MachineDataLinesParser;

impl ParseRecords for MachineDataParser {
    fn parse_records(&self, data: &[u8], offset: UtcOffset) -> Result<ParsedRecords> {
        let rows: Value = serde_json::from_slice(data)?;
        let Value::Array(rows) = rows else {
            return Err(MachineViewError::invalid_payload(
                "expected a JSON array of machine data rows",
            ));
        };

        let mut parsed = ParsedRecords::default();
        for (position, row) in rows.iter().enumerate() {
            let Value::Object(row) = row else {
                return Err(MachineViewError::invalid_payload(&format!(
                    "row {} is not a JSON object",
                    position
                )));
            };
            push_row(&mut parsed, row, position, offset);
        }

        debug!(
            "Parsed {} machine data rows, skipped {}",
            parsed.records.len(),
            parsed.skipped
        );
        Ok(parsed)
    }
}

impl ParseRecords for MachineDataLinesParser {
    fn parse_records(&self, data: &[u8], offset: UtcOffset) -> Result<ParsedRecords> {
        let text = std::str::from_utf8(data)
            .map_err(|e| MachineViewError::invalid_payload(&e.to_string()))?;

        let mut parsed = ParsedRecords::default();
        for (position, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row: Value = serde_json::from_str(line)?;
            let Value::Object(row) = row else {
                return Err(MachineViewError::invalid_payload(&format!(
                    "line {} is not a JSON object",
                    position + 1
                )));
            };
            push_row(&mut parsed, &row, position, offset);
        }
        Ok(parsed)
    }
}

fn push_row(parsed: &mut ParsedRecords, row: &Map<String, Value>, position: usize, offset: UtcOffset) {
    match row_to_record(row, position, offset) {
        Ok(record) => parsed.records.push(record),
        Err(err) => {
            warn!("Skipping machine data row {}: {}", position, err);
            parsed.skipped += 1;
        }
    }
}

/// Converts one backend row into a record.
///
/// Rows without a usable timestamp are rejected. Metric fields that are not
/// numeric are left out of the record rather than failing the row.
pub fn row_to_record(
    row: &Map<String, Value>,
    position: usize,
    offset: UtcOffset,
) -> Result<MetricRecord> {
    let timestamp = row
        .get("Timestamp")
        .or_else(|| row.get("timestamp"))
        .ok_or_else(|| MachineViewError::invalid_timestamp("", "missing Timestamp field"))?;
    let timestamp = match timestamp {
        Value::String(value) => parse_machine_datetime(value, offset)?,
        other => {
            return Err(MachineViewError::invalid_timestamp(
                &other.to_string(),
                "timestamp is not a string",
            ));
        }
    };

    let id = row
        .get("id")
        .or_else(|| row.get("ID"))
        .and_then(Value::as_i64)
        .unwrap_or(position as i64);

    let mut values = BTreeMap::new();
    for (key, value) in row {
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }
        let Some(number) = numeric_value(value) else {
            continue;
        };
        match MetricName::new(key) {
            Ok(name) => {
                values.insert(name, number);
            }
            Err(err) => debug!("Ignoring field: {}", err),
        }
    }

    Ok(MetricRecord::new(id, timestamp, values))
}

/// Numbers and numeric strings are accepted; everything else is not a reading.
fn numeric_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::MachineDateTimeExt;

    const PAYLOAD: &str = r#"[
        {"id": 3, "Timestamp": "2024-01-15T10:00:00", "G19": 12.5, "G26": "7.25", "MISFAT_3_G10f": null},
        {"id": 2, "Timestamp": "Mon, 15 Jan 2024 09:00:00 GMT", "G19": 11.0, "G26": "n/a"},
        {"id": 1, "Timestamp": "not a date", "G19": 10.0}
    ]"#;

    #[test]
    fn test_parse_machine_data() {
        let parsed = MachineDataParser
            .parse_records(PAYLOAD.as_bytes(), UtcOffset::UTC)
            .unwrap();
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.skipped, 1);

        let g19 = MetricName::new("G19").unwrap();
        let g26 = MetricName::new("G26").unwrap();
        let first = &parsed.records[0];
        assert_eq!(first.id, 3);
        assert_eq!(first.unix_milliseconds(), 1705312800000);
        assert_eq!(first.value(&g19), Some(12.5));
        assert_eq!(first.value(&g26), Some(7.25));
        assert_eq!(first.values().len(), 2);

        let second = &parsed.records[1];
        assert_eq!(second.timestamp.to_unix_milliseconds_i64(), 1705309200000);
        assert_eq!(second.value(&g26), None);
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let err = MachineDataParser
            .parse_records(br#"{"error": "db down"}"#, UtcOffset::UTC)
            .unwrap_err();
        assert!(matches!(err, MachineViewError::InvalidPayload { .. }));

        assert!(matches!(
            MachineDataParser.parse_records(b"[1, 2]", UtcOffset::UTC),
            Err(MachineViewError::InvalidPayload { .. })
        ));
        assert!(matches!(
            MachineDataParser.parse_records(b"not json", UtcOffset::UTC),
            Err(MachineViewError::Json(_))
        ));
    }

    #[test]
    fn test_parse_empty_array() {
        let parsed = MachineDataParser
            .parse_records(b"[]", UtcOffset::UTC)
            .unwrap();
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.skipped, 0);
    }

    #[test]
    fn test_missing_id_uses_position() {
        let parsed = MachineDataParser
            .parse_records(
                br#"[{"timestamp": "2024-01-15T10:00:00Z", "G19": 1}]"#,
                UtcOffset::UTC,
            )
            .unwrap();
        assert_eq!(parsed.records[0].id, 0);
    }

    #[test]
    fn test_parse_lines() {
        let data = "{\"id\": 1, \"Timestamp\": \"2024-01-15T10:00:00Z\", \"G19\": 1.5}\n\n{\"id\": 2, \"Timestamp\": \"2024-01-15T11:00:00Z\", \"G19\": 2.5}\n";
        let parsed = MachineDataLinesParser
            .parse_records(data.as_bytes(), UtcOffset::UTC)
            .unwrap();
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[1].id, 2);
    }
}
