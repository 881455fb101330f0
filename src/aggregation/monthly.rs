use super::bucket::AggregationBucket;
use crate::datamodel::{MachineDateTimeExt, MetricName, MetricRecord};
use crate::error::Result;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use time::UtcOffset;

/// Median of `values`; 0 for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    } else {
        sorted[middle]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    pub year: i32,
    pub month: u8,
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyMedians {
    pub month: MonthKey,
    pub medians: BTreeMap<MetricName, f64>,
}

impl MonthlyMedians {
    /// Median of a metric for the month, 0 when it had no values.
    pub fn median_of(&self, metric: &MetricName) -> f64 {
        self.medians.get(metric).copied().unwrap_or(0.0)
    }
}

/// Median of each selected metric per local calendar month.
///
/// Months appear in the order they are first met in `records`. A metric
/// without any value in a month gets a median of 0.
pub fn monthly_medians(
    records: &[MetricRecord],
    metrics: &[MetricName],
    offset: UtcOffset,
) -> Result<Vec<MonthlyMedians>> {
    let mut order: Vec<MonthKey> = Vec::new();
    let mut groups: HashMap<MonthKey, Vec<Option<AggregationBucket>>> = HashMap::new();

    for record in records {
        let local = record.timestamp.to_local(offset)?;
        let key = MonthKey {
            year: local.year(),
            month: local.month() as u8,
        };
        let buckets = groups.entry(key).or_insert_with(|| {
            order.push(key);
            vec![None; metrics.len()]
        });
        for (bucket, metric) in buckets.iter_mut().zip(metrics) {
            if let Some(value) = record.value(metric) {
                AggregationBucket::accumulate(bucket, value);
            }
        }
    }

    Ok(order
        .into_iter()
        .map(|month| {
            let buckets = &groups[&month];
            let medians = metrics
                .iter()
                .zip(buckets)
                .map(|(metric, bucket)| {
                    let value = bucket.as_ref().map_or(0.0, |b| median(b.values()));
                    (metric.clone(), value)
                })
                .collect();
            MonthlyMedians { month, medians }
        })
        .collect())
}
