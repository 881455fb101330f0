use super::date_range::{AnalysisWindow, serialize_date};
use super::statistics::moving_average;
use crate::datamodel::machine_datetime::parse_machine_datetime;
use crate::datamodel::{AnomalyPoint, MachineDateTimeExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use time::{Date, UtcOffset};
use tracing::warn;

/// Days averaged by the anomaly trend line.
pub const TREND_AVERAGE_DAYS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Severity of an anomaly score relative to the detection threshold.
    /// Only the magnitude of the score counts.
    pub fn classify(score: f64, threshold: f64) -> Self {
        let magnitude = score.abs();
        if magnitude > threshold * 2.0 {
            Severity::Critical
        } else if magnitude > threshold * 1.5 {
            Severity::High
        } else if magnitude > threshold * 1.25 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SeverityLevels {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl SeverityLevels {
    pub fn from_points(points: &[AnomalyPoint], threshold: f64) -> Self {
        let mut levels = SeverityLevels::default();
        for point in points {
            levels.add(Severity::classify(point.score, threshold));
        }
        levels
    }

    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Low => self.low += 1,
            Severity::Medium => self.medium += 1,
            Severity::High => self.high += 1,
            Severity::Critical => self.critical += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high + self.critical
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAnomalyCount {
    #[serde(serialize_with = "serialize_date")]
    pub date: Date,
    pub count: usize,
    pub moving_average: f64,
}

/// Anomalies per day over `window`, days without anomalies included as 0.
///
/// Timestamps without an offset are read as UTC, then bucketed by their date
/// at `offset`. Points with an unreadable timestamp or outside the window are
/// left out.
pub fn daily_anomaly_trend(
    points: &[AnomalyPoint],
    window: &AnalysisWindow,
    offset: UtcOffset,
    average_days: usize,
) -> Vec<DailyAnomalyCount> {
    let mut counts: BTreeMap<Date, usize> = window.days().map(|day| (day, 0)).collect();

    for point in points {
        let date = match parse_machine_datetime(&point.timestamp, UtcOffset::UTC)
            .and_then(|timestamp| timestamp.to_local(offset))
        {
            Ok(local) => local.date(),
            Err(err) => {
                warn!("Skipping anomaly point: {}", err);
                continue;
            }
        };
        if let Some(count) = counts.get_mut(&date) {
            *count += 1;
        }
    }

    let daily: Vec<f64> = counts.values().map(|count| *count as f64).collect();
    let averages = moving_average(&daily, average_days);
    counts
        .into_iter()
        .zip(averages)
        .map(|((date, count), moving_average)| DailyAnomalyCount {
            date,
            count,
            moving_average,
        })
        .collect()
}
