use super::bucket::AggregationBucket;
use crate::aggregation::color::Rgba;
use crate::datamodel::{MachineDateTimeExt, MetricName, MetricRecord};
use crate::error::Result;
use serde::Serialize;
use time::UtcOffset;

pub const DAYS_PER_WEEK: usize = 7;
pub const HOURS_PER_DAY: usize = 24;

/// Mean metric value per local weekday (rows, Sunday first) and hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub metric: MetricName,
    pub cells: [[f64; HOURS_PER_DAY]; DAYS_PER_WEEK],
}

impl Heatmap {
    pub fn cell(&self, weekday: usize, hour: usize) -> Option<f64> {
        self.cells.get(weekday)?.get(hour).copied()
    }

    /// Largest cell, never below 1 so it can divide color ratios.
    pub fn max_value(&self) -> f64 {
        self.cells
            .iter()
            .flatten()
            .copied()
            .fold(1.0, f64::max)
    }
}

pub fn heatmap(records: &[MetricRecord], metric: &MetricName, offset: UtcOffset) -> Result<Heatmap> {
    let mut buckets: [[Option<AggregationBucket>; HOURS_PER_DAY]; DAYS_PER_WEEK] =
        std::array::from_fn(|_| std::array::from_fn(|_| None));

    for record in records {
        let Some(value) = record.value(metric) else {
            continue;
        };
        let local = record.timestamp.to_local(offset)?;
        let day = local.weekday().number_days_from_sunday() as usize;
        let hour = local.hour() as usize;
        AggregationBucket::accumulate(&mut buckets[day][hour], value);
    }

    let cells = std::array::from_fn(|day| {
        std::array::from_fn(|hour| buckets[day][hour].as_ref().map_or(0.0, AggregationBucket::mean))
    });

    Ok(Heatmap {
        metric: metric.clone(),
        cells,
    })
}

/// Blue gradient for a heatmap cell: light for low values, saturated and
/// more opaque toward `max`.
pub fn heatmap_cell_color(value: f64, max: f64) -> Rgba {
    let ratio = if max > 0.0 {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let channel = (200.0 * (1.0 - ratio)).round() as u8;
    Rgba {
        r: channel,
        g: channel,
        b: 255,
        a: 0.7 + ratio * 0.3,
    }
}
