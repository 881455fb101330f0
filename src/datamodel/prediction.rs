use super::metric_record::{MetricName, MetricRecord, latest_record};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Body of `/api/predict-consumption`: current consumption per machine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionRequest(pub BTreeMap<MetricName, f64>);

impl PredictionRequest {
    /// Builds the request from the most recent record.
    pub fn from_latest(records: &[MetricRecord]) -> Self {
        match latest_record(records) {
            Some(record) => PredictionRequest(record.values().clone()),
            None => PredictionRequest::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachinePrediction {
    pub current_value: Option<f64>,
    pub predicted_value: Option<f64>,
    pub status: PredictionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increase,
    Decrease,
    Neutral,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trend::Increase => "increase",
            Trend::Decrease => "decrease",
            Trend::Neutral => "neutral",
        };
        write!(f, "{}", s)
    }
}

impl MachinePrediction {
    /// Relative change from the current to the predicted value, in percent.
    ///
    /// Only defined for successful predictions with a strictly positive
    /// current value.
    pub fn percent_change(&self) -> Option<f64> {
        if self.status != PredictionStatus::Success {
            return None;
        }
        match (self.current_value, self.predicted_value) {
            (Some(current), Some(predicted)) if current > 0.0 => {
                Some((predicted - current) / current * 100.0)
            }
            _ => None,
        }
    }

    pub fn trend(&self) -> Option<Trend> {
        self.percent_change().map(|change| {
            if change > 0.0 {
                Trend::Increase
            } else if change < 0.0 {
                Trend::Decrease
            } else {
                Trend::Neutral
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub predictions: BTreeMap<String, MachinePrediction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableModelsResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub models: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::machine_datetime::{MachineDateTime, MachineDateTimeExt};

    fn prediction(current: Option<f64>, predicted: Option<f64>) -> MachinePrediction {
        MachinePrediction {
            current_value: current,
            predicted_value: predicted,
            status: PredictionStatus::Success,
            message: None,
        }
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(prediction(Some(100.0), Some(110.0)).percent_change(), Some(10.0));
        assert_eq!(prediction(Some(200.0), Some(150.0)).percent_change(), Some(-25.0));
        assert_eq!(prediction(Some(0.0), Some(10.0)).percent_change(), None);
        assert_eq!(prediction(Some(10.0), None).percent_change(), None);

        let mut failed = prediction(Some(100.0), Some(110.0));
        failed.status = PredictionStatus::Error;
        assert_eq!(failed.percent_change(), None);
    }

    #[test]
    fn test_trend() {
        assert_eq!(prediction(Some(100.0), Some(110.0)).trend(), Some(Trend::Increase));
        assert_eq!(prediction(Some(100.0), Some(90.0)).trend(), Some(Trend::Decrease));
        assert_eq!(prediction(Some(100.0), Some(100.0)).trend(), Some(Trend::Neutral));
        assert_eq!(prediction(None, Some(100.0)).trend(), None);
    }

    #[test]
    fn test_request_from_latest_record() {
        assert!(PredictionRequest::from_latest(&[]).is_empty());

        let g19 = MetricName::new("G19").unwrap();
        let older = MetricRecord::new(
            1,
            MachineDateTime::from_unix_milliseconds_i64(1_000),
            BTreeMap::from([(g19.clone(), 1.0)]),
        );
        let newer = MetricRecord::new(
            2,
            MachineDateTime::from_unix_milliseconds_i64(2_000),
            BTreeMap::from([(g19.clone(), 2.0)]),
        );
        let request = PredictionRequest::from_latest(&[newer, older]);
        assert_eq!(request.0.get(&g19), Some(&2.0));
        assert_eq!(serde_json::to_string(&request).unwrap(), r#"{"G19":2.0}"#);
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{
            "status": "success",
            "predictions": {
                "G19": {"current_value": 100.0, "predicted_value": 120.0, "status": "success"},
                "G26": {"current_value": 50.0, "predicted_value": null, "status": "error", "message": "model missing"}
            }
        }"#;
        let response: PredictionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.predictions["G19"].percent_change(), Some(20.0));
        assert_eq!(
            response.predictions["G26"].message.as_deref(),
            Some("model missing")
        );
    }
}
