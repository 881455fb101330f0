use crate::datamodel::MetricRecord;
use crate::error::{MachineViewError, Result};
use time::UtcOffset;

pub mod machine_data;

pub trait ParseRecords: Send + Sync {
    fn parse_records(&self, data: &[u8], offset: UtcOffset) -> Result<ParsedRecords>;
}

/// Records decoded from a payload, with the number of rows that were dropped.
#[derive(Debug, Default)]
pub struct ParsedRecords {
    pub records: Vec<MetricRecord>,
    pub skipped: usize,
}

/// Parses a `/api/machine-data` JSON array.
pub fn parse_machine_data(data: &[u8], offset: UtcOffset) -> Result<ParsedRecords> {
    machine_data::MachineDataParser.parse_records(data, offset)
}

pub fn get_parser_from_name(name: &str) -> Result<Box<dyn ParseRecords>> {
    match name {
        "machine_data_json" | "json" => Ok(Box::new(machine_data::MachineDataParser)),
        "machine_data_jsonl" | "jsonl" => Ok(Box::new(machine_data::MachineDataLinesParser)),
        _ => Err(MachineViewError::Configuration(format!(
            "Unsupported parser: {}",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_parser_from_name() {
        assert!(get_parser_from_name("machine_data_json").is_ok());
        assert!(get_parser_from_name("jsonl").is_ok());
        assert!(get_parser_from_name("senml").is_err());
    }

    #[test]
    fn test_parse_machine_data() {
        let parsed = parse_machine_data(
            br#"[{"id": 1, "Timestamp": "2024-01-15T10:00:00Z", "G19": 4.5}]"#,
            UtcOffset::UTC,
        )
        .unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.records[0].id, 1);
    }
}
