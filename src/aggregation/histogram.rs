use crate::datamodel::{MetricName, MetricRecord};
use serde::Serialize;
use std::num::NonZeroUsize;

/// Bin count of the dashboard distribution chart.
pub const DEFAULT_BIN_COUNT: NonZeroUsize = NonZeroUsize::MIN.saturating_add(9);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.bins.iter().map(|bin| bin.count).sum()
    }

    pub fn counts(&self) -> Vec<usize> {
        self.bins.iter().map(|bin| bin.count).collect()
    }
}

/// Equal-width histogram between the smallest and largest value.
///
/// The maximum lands in the last bin. When all values are equal the range is
/// zero and every value is counted in the first bin. Non-finite values are
/// ignored.
pub fn histogram(values: &[f64], bin_count: NonZeroUsize) -> Histogram {
    let bin_count = bin_count.get();
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();

    let (min, max) = if finite.is_empty() {
        (0.0, 0.0)
    } else {
        finite
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            })
    };
    // Work at half scale when the span overflows f64.
    let scale = if (max - min).is_finite() { 1.0 } else { 0.5 };
    let (low, high) = (min * scale, max * scale);
    let bin_size = (high - low) / bin_count as f64;

    let mut counts = vec![0usize; bin_count];
    for value in &finite {
        let index = if bin_size > 0.0 {
            (((value * scale - low) / bin_size).floor() as usize).min(bin_count - 1)
        } else {
            0
        };
        counts[index] += 1;
    }

    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let lower = (low + i as f64 * bin_size) / scale;
            let upper = if i + 1 == bin_count {
                max
            } else {
                (low + (i + 1) as f64 * bin_size) / scale
            };
            HistogramBin {
                lower,
                upper,
                label: format!("{:.1} - {:.1}", lower, upper),
                count,
            }
        })
        .collect();

    Histogram { min, max, bins }
}

/// Histogram of one metric over the records that carry it.
pub fn metric_histogram(
    records: &[MetricRecord],
    metric: &MetricName,
    bin_count: NonZeroUsize,
) -> Histogram {
    let values: Vec<f64> = records
        .iter()
        .filter_map(|record| record.value(metric))
        .collect();
    histogram(&values, bin_count)
}
