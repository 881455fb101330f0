use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One point flagged by the backend anomaly detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPoint {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(default)]
    pub score: f64,
    /// Machine readings captured alongside the score.
    #[serde(flatten)]
    pub readings: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineAnomalyResult {
    #[serde(default)]
    pub anomalies: Vec<AnomalyPoint>,
    #[serde(default)]
    pub anomalies_count: u64,
    #[serde(default)]
    pub mean_score: f64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub total_points: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnomalySummary {
    pub anomalies_found: bool,
    pub machines_count: u64,
    pub machines_processed: u64,
    pub timestamp: String,
}

/// Response of `/api/detect-anomalies` and `/api/historical-anomalies`.
///
/// The backend mixes the summary and per-machine results in one object, the
/// summary living under the `summary` key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnomalyReport {
    #[serde(default)]
    pub summary: AnomalySummary,
    #[serde(flatten)]
    pub machines: BTreeMap<String, MachineAnomalyResult>,
}

impl AnomalyReport {
    pub fn for_machine(&self, machine: &str) -> Option<&MachineAnomalyResult> {
        self.machines.get(machine)
    }

    /// Anomaly points of a machine, empty when the machine is absent.
    pub fn points_for(&self, machine: &str) -> &[AnomalyPoint] {
        self.for_machine(machine)
            .map(|result| result.anomalies.as_slice())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_deserialization() {
        let json = r#"{
            "summary": {"anomalies_found": true, "machines_count": 7, "machines_processed": 1, "timestamp": "2024-01-15T10:00:00"},
            "G19": {
                "anomalies": [
                    {"Timestamp": "2024-01-14T08:00:00", "score": -0.9, "G19": 412.5}
                ],
                "anomalies_count": 1,
                "mean_score": -0.9,
                "status": "success",
                "total_points": 240
            }
        }"#;
        let report: AnomalyReport = serde_json::from_str(json).unwrap();
        assert!(report.summary.anomalies_found);
        assert_eq!(report.machines.len(), 1);

        let points = report.points_for("G19");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].score, -0.9);
        assert_eq!(points[0].readings["G19"], serde_json::json!(412.5));
        assert!(report.points_for("G26").is_empty());
    }

    #[test]
    fn test_empty_report() {
        let report: AnomalyReport = serde_json::from_str("{}").unwrap();
        assert!(!report.summary.anomalies_found);
        assert!(report.machines.is_empty());
    }
}
