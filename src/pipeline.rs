//! Assembles every chart of a view from one batch of records.
//!
//! Each stage runs once per call and the derived structures are returned
//! together, so a renderer never recomputes an aggregate inside a draw loop.

use crate::aggregation::{
    AnalysisWindow, ColorPalette, DailyAnomalyCount, DateRange, Heatmap, Histogram,
    MetricSummary, MonthlyMedians, Rgb, SeverityLevels, WeekTieBreak, WeekdayPoint,
    daily_anomaly_trend, decimate_series, decimation_factor, filter_by_date_range, heatmap,
    latest_values, metric_histogram, monthly_medians, summarize, weekday_name, weekday_series,
};
use crate::config::MachineViewConfig;
use crate::datamodel::machine_datetime::machine_datetime_to_local_rfc3339;
use crate::datamodel::{
    AnomalyReport, MachineDateTime, MetricName, MetricRecord, MetricSelection, MetricSeries,
};
use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use time::UtcOffset;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardParams {
    pub range: DateRange,
    pub metrics: MetricSelection,
    /// Metrics of the latest-value bar chart, every available metric when
    /// loaded from configuration.
    pub comparison_metrics: MetricSelection,
    /// Single-metric charts fall back to the first selected metric.
    pub heatmap_metric: Option<MetricName>,
    pub distribution_metric: Option<MetricName>,
    pub weekday_metric: Option<MetricName>,
    pub weekday: u8,
    pub tie_break: WeekTieBreak,
    pub offset: UtcOffset,
    pub max_points: usize,
    pub histogram_bins: NonZeroUsize,
}

impl DashboardParams {
    pub fn new(metrics: MetricSelection) -> Self {
        Self {
            range: DateRange::Last30Days,
            comparison_metrics: metrics.clone(),
            metrics,
            heatmap_metric: None,
            distribution_metric: None,
            weekday_metric: None,
            weekday: 1,
            tie_break: WeekTieBreak::default(),
            offset: UtcOffset::UTC,
            max_points: 1000,
            histogram_bins: crate::aggregation::histogram::DEFAULT_BIN_COUNT,
        }
    }

    pub fn from_config(config: &MachineViewConfig) -> Result<Self> {
        let mut params = Self::new(config.metric_selection()?);
        params.range = config.date_range();
        params.weekday = config.weekday()?;
        params.tie_break = config.tie_break()?;
        params.offset = config.utc_offset()?;
        params.max_points = config.max_render_points;
        params.histogram_bins = config.histogram_bins()?;
        Ok(params)
    }

    fn chart_metric<'a>(&'a self, choice: &'a Option<MetricName>) -> Option<&'a MetricName> {
        choice.as_ref().or_else(|| self.metrics.first())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonBar {
    pub metric: MetricName,
    pub value: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdaySeries {
    pub metric: MetricName,
    pub weekday: u8,
    pub weekday_name: &'static str,
    pub points: Vec<WeekdayPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub range: DateRange,
    pub record_count: usize,
    pub decimation_factor: usize,
    pub time_series: Vec<MetricSeries>,
    pub comparison: Vec<ComparisonBar>,
    pub monthly: Vec<MonthlyMedians>,
    pub distribution: Option<Histogram>,
    pub heatmap: Option<Heatmap>,
    pub weekday: Option<WeekdaySeries>,
    pub summary: BTreeMap<MetricName, MetricSummary>,
    pub colors: ColorPalette,
}

/// Records sorted oldest first; ties keep their input order.
fn chronological(records: &[MetricRecord]) -> Vec<&MetricRecord> {
    let mut sorted: Vec<&MetricRecord> = records.iter().collect();
    sorted.sort_by_key(|record| record.unix_milliseconds());
    sorted
}

/// One series per metric over the chronologically sorted records, decimated
/// with a shared factor so every series stays aligned with the labels.
pub fn time_series(
    records: &[MetricRecord],
    metrics: &[MetricName],
    offset: UtcOffset,
    max_points: usize,
) -> Result<(Vec<MetricSeries>, usize)> {
    let sorted = chronological(records);
    let factor = decimation_factor(sorted.len(), max_points);
    let labels = sorted
        .iter()
        .map(|record| machine_datetime_to_local_rfc3339(&record.timestamp, offset))
        .collect::<Result<Vec<String>>>()?;

    let series = metrics
        .iter()
        .map(|metric| {
            let values = sorted.iter().map(|record| record.value(metric)).collect();
            let series = MetricSeries::new(metric.clone(), labels.clone(), values)?;
            decimate_series(series, factor)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((series, factor))
}

pub fn build_dashboard(
    records: &[MetricRecord],
    params: &DashboardParams,
    now: MachineDateTime,
) -> Result<DashboardView> {
    let filtered = filter_by_date_range(records, params.range, now, params.offset)?;
    info!(
        "Building dashboard for {} of {} records ({})",
        filtered.len(),
        records.len(),
        params.range
    );

    let colors =
        ColorPalette::for_metrics(params.metrics.iter().chain(&params.comparison_metrics));
    let (time_series, factor) =
        time_series(&filtered, &params.metrics, params.offset, params.max_points)?;
    if factor > 1 {
        debug!("Decimating time series by a factor of {}", factor);
    }

    let comparison = latest_values(&filtered, &params.comparison_metrics)
        .into_iter()
        .map(|(metric, value)| ComparisonBar {
            color: colors.color_for(&metric),
            metric,
            value,
        })
        .collect();

    let monthly = monthly_medians(&filtered, &params.metrics, params.offset)?;

    let distribution = params
        .chart_metric(&params.distribution_metric)
        .map(|metric| metric_histogram(&filtered, metric, params.histogram_bins));

    let heatmap = params
        .chart_metric(&params.heatmap_metric)
        .map(|metric| heatmap(&filtered, metric, params.offset))
        .transpose()?;

    let weekday = params
        .chart_metric(&params.weekday_metric)
        .map(|metric| -> Result<WeekdaySeries> {
            Ok(WeekdaySeries {
                metric: metric.clone(),
                weekday: params.weekday,
                weekday_name: weekday_name(params.weekday)?,
                points: weekday_series(
                    &filtered,
                    params.weekday,
                    metric,
                    params.tie_break,
                    params.offset,
                )?,
            })
        })
        .transpose()?;

    let summary = params
        .metrics
        .iter()
        .map(|metric| (metric.clone(), summarize(&filtered, metric)))
        .collect();

    Ok(DashboardView {
        range: params.range,
        record_count: filtered.len(),
        decimation_factor: factor,
        time_series,
        comparison,
        monthly,
        distribution,
        heatmap,
        weekday,
        summary,
        colors,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisParams {
    pub machine: String,
    pub metrics: MetricSelection,
    /// Defaults to the window of `range` ending today.
    pub window: Option<AnalysisWindow>,
    pub range: DateRange,
    pub offset: UtcOffset,
    pub max_points: usize,
    pub anomaly_threshold: f64,
    pub average_days: usize,
}

impl AnalysisParams {
    pub fn new(machine: impl Into<String>, metrics: MetricSelection) -> Self {
        Self {
            machine: machine.into(),
            metrics,
            window: None,
            range: DateRange::Last30Days,
            offset: UtcOffset::UTC,
            max_points: 1000,
            anomaly_threshold: 0.75,
            average_days: crate::aggregation::anomaly::TREND_AVERAGE_DAYS,
        }
    }

    pub fn from_config(machine: impl Into<String>, config: &MachineViewConfig) -> Result<Self> {
        // The analysis view preselects the first three channels.
        let metrics = config.metric_selection()?.into_iter().take(3).collect();
        let mut params = Self::new(machine, metrics);
        params.range = config.date_range();
        params.offset = config.utc_offset()?;
        params.max_points = config.max_render_points;
        params.anomaly_threshold = config.anomaly_threshold()?;
        params.average_days = config.moving_average_window;
        Ok(params)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisView {
    pub machine: String,
    pub window: AnalysisWindow,
    pub record_count: usize,
    pub time_series: Vec<MetricSeries>,
    pub summary: BTreeMap<MetricName, MetricSummary>,
    pub anomaly_count: usize,
    pub severity: SeverityLevels,
    pub trend: Vec<DailyAnomalyCount>,
    pub colors: ColorPalette,
}

pub fn build_analysis(
    records: &[MetricRecord],
    report: &AnomalyReport,
    params: &AnalysisParams,
    now: MachineDateTime,
) -> Result<AnalysisView> {
    let window = match params.window {
        Some(window) => window,
        None => AnalysisWindow::for_range(params.range, now, params.offset)?,
    };
    let filtered = window.filter(records, params.offset)?;
    let points = report.points_for(&params.machine);
    info!(
        "Building analysis of {} from {} to {}: {} records, {} anomalies",
        params.machine,
        window.start,
        window.end,
        filtered.len(),
        points.len()
    );

    let (time_series, _) =
        time_series(&filtered, &params.metrics, params.offset, params.max_points)?;
    let summary = params
        .metrics
        .iter()
        .map(|metric| (metric.clone(), summarize(&filtered, metric)))
        .collect();

    Ok(AnalysisView {
        machine: params.machine.clone(),
        window,
        record_count: filtered.len(),
        time_series,
        summary,
        anomaly_count: points.len(),
        severity: SeverityLevels::from_points(points, params.anomaly_threshold),
        trend: daily_anomaly_trend(points, &window, params.offset, params.average_days),
        colors: ColorPalette::for_metrics(&params.metrics),
    })
}
