use super::machine_datetime::{MachineDateTime, MachineDateTimeExt, parse_machine_datetime};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;
use time::UtcOffset;

/// Operating state of a machine, normalized from the backend's French labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineState {
    Running,
    Stopped,
    Warning,
    Unknown,
}

impl MachineState {
    pub fn from_backend(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "en fonctionnement" => MachineState::Running,
            "arrêté" | "arrete" => MachineState::Stopped,
            "avertissement" => MachineState::Warning,
            _ => MachineState::Unknown,
        }
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MachineState::Running => "running",
            MachineState::Stopped => "stopped",
            MachineState::Warning => "warning",
            MachineState::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Body of `/api/machine-status`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MachineStatusResponse {
    pub machines: BTreeMap<String, String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineStatus {
    pub machine_name: String,
    pub status: MachineState,
    /// Label as the backend sent it.
    pub status_display: String,
    pub last_updated: String,
}

impl MachineStatusResponse {
    /// One status per machine, sorted by machine name.
    pub fn statuses(&self) -> Vec<MachineStatus> {
        self.machines
            .iter()
            .map(|(machine_name, label)| MachineStatus {
                machine_name: machine_name.clone(),
                status: MachineState::from_backend(label),
                status_display: label.clone(),
                last_updated: self.timestamp.clone(),
            })
            .collect()
    }
}

/// A stop period. `end_time` is absent while the machine is still stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineStop {
    #[serde(alias = "machine")]
    pub machine_name: String,
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub duration_hours: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StopsPayload {
    List(Vec<MachineStop>),
    Indexed(BTreeMap<String, MachineStop>),
}

/// Parses `/api/machine-stops`, either a JSON array or an object keyed by index.
pub fn parse_machine_stops(data: &[u8]) -> Result<Vec<MachineStop>> {
    Ok(match serde_json::from_slice(data)? {
        StopsPayload::List(stops) => stops,
        StopsPayload::Indexed(stops) => {
            let mut indexed: Vec<(String, MachineStop)> = stops.into_iter().collect();
            indexed.sort_by_key(|(index, _)| index.parse::<u64>().unwrap_or(u64::MAX));
            indexed.into_iter().map(|(_, stop)| stop).collect()
        }
    })
}

fn format_hours(hours: f64) -> String {
    let total_minutes = (hours.max(0.0) * 60.0).round() as u64;
    let (h, m) = (total_minutes / 60, total_minutes % 60);
    if h > 0 {
        format!("{}h {}m", h, m)
    } else {
        format!("{}m", m)
    }
}

impl MachineStop {
    pub fn started_at(&self, offset: UtcOffset) -> Option<MachineDateTime> {
        parse_machine_datetime(&self.start_time, offset).ok()
    }

    pub fn is_ongoing(&self) -> bool {
        self.end_time.is_none()
    }

    /// `"2h 15m"`, or `"45m"` under an hour.
    ///
    /// A reported `duration_hours` wins. Without it, an ongoing stop is
    /// measured from its start to `now` and marked `(ongoing)`. Anything else
    /// is `"Unknown"`.
    pub fn format_duration(&self, now: MachineDateTime, offset: UtcOffset) -> String {
        if let Some(hours) = self.duration_hours {
            return format_hours(hours);
        }
        match (self.is_ongoing(), self.started_at(offset)) {
            (true, Some(start)) => {
                let elapsed_ms = now.to_unix_milliseconds_i64() - start.to_unix_milliseconds_i64();
                format!("{} (ongoing)", format_hours(elapsed_ms as f64 / 3_600_000.0))
            }
            _ => "Unknown".to_string(),
        }
    }
}

/// Stops of `machine`, most recent start first. Stops with an unreadable
/// start time come last.
pub fn stop_history_for_machine<'a>(
    stops: &'a [MachineStop],
    machine: &str,
    offset: UtcOffset,
) -> Vec<&'a MachineStop> {
    let mut history: Vec<&MachineStop> = stops
        .iter()
        .filter(|stop| stop.machine_name == machine)
        .collect();
    history.sort_by_key(|stop| {
        Reverse(
            stop.started_at(offset)
                .map(|start| start.to_unix_milliseconds_i64()),
        )
    });
    history
}

pub fn latest_stop_for_machine<'a>(
    stops: &'a [MachineStop],
    machine: &str,
    offset: UtcOffset,
) -> Option<&'a MachineStop> {
    stop_history_for_machine(stops, machine, offset)
        .into_iter()
        .next()
}

/// Row of the machine status table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineOverview {
    #[serde(flatten)]
    pub status: MachineStatus,
    pub latest_stop: Option<MachineStop>,
    pub latest_stop_duration: Option<String>,
    pub stop_count: usize,
}

pub fn machine_overview(
    response: &MachineStatusResponse,
    stops: &[MachineStop],
    now: MachineDateTime,
    offset: UtcOffset,
) -> Vec<MachineOverview> {
    response
        .statuses()
        .into_iter()
        .map(|status| {
            let history = stop_history_for_machine(stops, &status.machine_name, offset);
            let latest_stop = history.first().map(|stop| (*stop).clone());
            MachineOverview {
                latest_stop_duration: latest_stop
                    .as_ref()
                    .map(|stop| stop.format_duration(now, offset)),
                latest_stop,
                stop_count: history.len(),
                status,
            }
        })
        .collect()
}

/// State of the backend's periodic anomaly monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitoringState {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringStatus {
    pub status: MonitoringState,
    pub message: String,
}

/// Body of `/api/start-monitoring`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringRequest {
    pub frequence_minutes: u32,
}

impl Default for MonitoringRequest {
    fn default() -> Self {
        Self {
            frequence_minutes: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn stop(machine: &str, start: &str, end: Option<&str>, hours: Option<f64>) -> MachineStop {
        MachineStop {
            machine_name: machine.to_string(),
            start_time: start.to_string(),
            end_time: end.map(str::to_string),
            duration_hours: hours,
        }
    }

    fn now() -> MachineDateTime {
        MachineDateTime::from_offset_datetime(&datetime!(2024-01-20 12:00:00 UTC))
    }

    #[test]
    fn test_state_from_backend() {
        assert_eq!(MachineState::from_backend("En fonctionnement"), MachineState::Running);
        assert_eq!(MachineState::from_backend("arrêté"), MachineState::Stopped);
        assert_eq!(MachineState::from_backend("ARRETE"), MachineState::Stopped);
        assert_eq!(MachineState::from_backend("avertissement"), MachineState::Warning);
        assert_eq!(MachineState::from_backend("maintenance"), MachineState::Unknown);
        assert_eq!(MachineState::Stopped.to_string(), "stopped");
    }

    #[test]
    fn test_statuses_keep_backend_label() {
        let response: MachineStatusResponse = serde_json::from_str(
            r#"{"machines": {"G26": "arrêté", "G19": "en fonctionnement"},
                "timestamp": "2024-01-20T12:00:00"}"#,
        )
        .unwrap();
        let statuses = response.statuses();
        assert_eq!(statuses[0].machine_name, "G19");
        assert_eq!(statuses[0].status, MachineState::Running);
        assert_eq!(statuses[1].status, MachineState::Stopped);
        assert_eq!(statuses[1].status_display, "arrêté");
        assert_eq!(statuses[1].last_updated, "2024-01-20T12:00:00");
    }

    #[test]
    fn test_parse_stops_from_list_and_indexed_object() {
        let list = parse_machine_stops(
            br#"[{"machine": "G19", "start_time": "2024-01-15T10:00:00",
                  "end_time": null, "duration_hours": 1.5}]"#,
        )
        .unwrap();
        assert_eq!(list[0].machine_name, "G19");
        assert!(list[0].is_ongoing());

        let indexed = parse_machine_stops(
            br#"{"1": {"machine": "G26", "start_time": "2024-01-16T10:00:00",
                       "end_time": "2024-01-16T11:00:00", "duration_hours": 1.0},
                 "0": {"machine": "G19", "start_time": "2024-01-15T10:00:00",
                       "end_time": null}}"#,
        )
        .unwrap();
        assert_eq!(indexed.len(), 2);
        assert_eq!(indexed[0].machine_name, "G19");
        assert_eq!(indexed[0].duration_hours, None);

        assert!(parse_machine_stops(b"42").is_err());
    }

    #[test]
    fn test_stop_history_newest_first() {
        let stops = vec![
            stop("G19", "2024-01-10T08:00:00", Some("2024-01-10T09:00:00"), Some(1.0)),
            stop("G26", "2024-01-19T08:00:00", None, None),
            stop("G19", "not a date", None, None),
            stop("G19", "2024-01-18T08:00:00", Some("2024-01-18T08:30:00"), Some(0.5)),
        ];
        let history = stop_history_for_machine(&stops, "G19", UtcOffset::UTC);
        let starts: Vec<&str> = history.iter().map(|s| s.start_time.as_str()).collect();
        assert_eq!(
            starts,
            vec!["2024-01-18T08:00:00", "2024-01-10T08:00:00", "not a date"]
        );

        let latest = latest_stop_for_machine(&stops, "G19", UtcOffset::UTC).unwrap();
        assert_eq!(latest.start_time, "2024-01-18T08:00:00");
        assert!(latest_stop_for_machine(&stops, "G31", UtcOffset::UTC).is_none());
    }

    #[test]
    fn test_format_duration() {
        let utc = UtcOffset::UTC;
        let reported = stop("G19", "2024-01-18T08:00:00", Some("x"), Some(2.25));
        assert_eq!(reported.format_duration(now(), utc), "2h 15m");

        let short = stop("G19", "2024-01-18T08:00:00", Some("x"), Some(0.75));
        assert_eq!(short.format_duration(now(), utc), "45m");

        let ongoing = stop("G19", "2024-01-20T09:30:00", None, None);
        assert_eq!(ongoing.format_duration(now(), utc), "2h 30m (ongoing)");

        let recent = stop("G19", "2024-01-20T11:50:00", None, None);
        assert_eq!(recent.format_duration(now(), utc), "10m (ongoing)");

        let finished = stop("G19", "2024-01-20T09:30:00", Some("2024-01-20T10:00:00"), None);
        assert_eq!(finished.format_duration(now(), utc), "Unknown");
    }

    #[test]
    fn test_machine_overview() {
        let response = MachineStatusResponse {
            machines: BTreeMap::from([
                ("G19".to_string(), "arrete".to_string()),
                ("G26".to_string(), "en fonctionnement".to_string()),
            ]),
            timestamp: "2024-01-20T12:00:00".to_string(),
        };
        let stops = vec![
            stop("G19", "2024-01-20T11:00:00", None, None),
            stop("G19", "2024-01-12T11:00:00", Some("2024-01-12T12:00:00"), Some(1.0)),
        ];
        let overview = machine_overview(&response, &stops, now(), UtcOffset::UTC);
        assert_eq!(overview[0].stop_count, 2);
        assert_eq!(overview[0].latest_stop_duration.as_deref(), Some("1h 0m (ongoing)"));
        assert_eq!(overview[1].status.status, MachineState::Running);
        assert!(overview[1].latest_stop.is_none());

        let json = serde_json::to_value(&overview[0]).unwrap();
        assert_eq!(json["status"], "stopped");
        assert_eq!(json["machine_name"], "G19");
    }

    #[test]
    fn test_monitoring_models() {
        let status: MonitoringStatus =
            serde_json::from_str(r#"{"status": "active", "message": "running every 60 minutes"}"#)
                .unwrap();
        assert_eq!(status.status, MonitoringState::Active);
        assert_eq!(
            serde_json::to_value(MonitoringRequest::default()).unwrap(),
            serde_json::json!({"frequence_minutes": 60})
        );
    }
}
