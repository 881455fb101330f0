use super::metric_record::MetricName;
use crate::error::{MachineViewError, Result};
use serde::Serialize;

/// Values of one metric, index-aligned with their labels.
///
/// A `None` value is a gap: the source record had no numeric value for the
/// metric. Charts render gaps as breaks in the line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSeries {
    pub name: MetricName,
    labels: Vec<String>,
    values: Vec<Option<f64>>,
}

impl MetricSeries {
    pub fn new(name: MetricName, labels: Vec<String>, values: Vec<Option<f64>>) -> Result<Self> {
        if labels.len() != values.len() {
            return Err(MachineViewError::SeriesLengthMismatch {
                name: name.to_string(),
                labels: labels.len(),
                values: values.len(),
            });
        }
        Ok(Self {
            name,
            labels,
            values,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_parts(self) -> (MetricName, Vec<String>, Vec<Option<f64>>) {
        (self.name, self.labels, self.values)
    }
}
