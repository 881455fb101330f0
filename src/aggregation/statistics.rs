use crate::datamodel::metric_record::latest_record;
use crate::datamodel::{MetricName, MetricRecord};
use serde::Serialize;

/// Summary card values for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MetricSummary {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub count: usize,
}

impl MetricSummary {
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for value in values {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }
        if count == 0 {
            return MetricSummary::default();
        }
        MetricSummary {
            min,
            max,
            avg: sum / count as f64,
            count,
        }
    }
}

/// Min, max and mean of a metric over the records carrying it. All zeros when
/// no record has a value.
pub fn summarize(records: &[MetricRecord], metric: &MetricName) -> MetricSummary {
    MetricSummary::from_values(records.iter().filter_map(|record| record.value(metric)))
}

/// Trailing moving average. Near the start the window shrinks to the values
/// available so far, so the output has the input's length.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut averages = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, value) in values.iter().enumerate() {
        sum += value;
        if i >= window {
            sum -= values[i - window];
        }
        let len = (i + 1).min(window);
        averages.push(sum / len as f64);
    }
    averages
}

/// Latest value of each metric, taken from the most recent record. Metrics
/// missing from that record are absent from the result.
pub fn latest_values(records: &[MetricRecord], metrics: &[MetricName]) -> Vec<(MetricName, f64)> {
    let Some(latest) = latest_record(records) else {
        return Vec::new();
    };
    metrics
        .iter()
        .filter_map(|metric| latest.value(metric).map(|value| (metric.clone(), value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{hourly_records, metric, record_at};
    use time::macros::datetime;

    #[test]
    fn test_summarize() {
        let records = hourly_records(datetime!(2024-01-15 00:00:00 UTC), "G19", &[4.0, -2.0, 10.0]);
        let summary = summarize(&records, &metric("G19"));
        assert_eq!(summary.min, -2.0);
        assert_eq!(summary.max, 10.0);
        assert_eq!(summary.avg, 4.0);
        assert_eq!(summary.count, 3);

        assert_eq!(summarize(&records, &metric("G26")), MetricSummary::default());
    }

    #[test]
    fn test_moving_average() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(moving_average(&values, 3), vec![1.0, 1.5, 2.0, 3.0, 4.0]);
        assert_eq!(moving_average(&values, 1), values.to_vec());
        assert_eq!(moving_average(&values, 0), values.to_vec());
        assert_eq!(moving_average(&[2.0, 4.0], 7), vec![2.0, 3.0]);
        assert!(moving_average(&[], 7).is_empty());
    }

    #[test]
    fn test_latest_values() {
        let records = vec![
            record_at(2, datetime!(2024-01-15 12:00:00 UTC), &[("G19", 5.0), ("G26", 7.0)]),
            record_at(1, datetime!(2024-01-15 11:00:00 UTC), &[("G19", 1.0)]),
            record_at(3, datetime!(2024-01-15 13:00:00 UTC), &[("G19", 9.0)]),
        ];
        let latest = latest_values(&records, &[metric("G19"), metric("G26")]);
        assert_eq!(latest, vec![(metric("G19"), 9.0)]);
        assert!(latest_values(&[], &[metric("G19")]).is_empty());
    }
}
