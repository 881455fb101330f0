//! Pure transformations from telemetry records to chart-ready views.

pub mod anomaly;
pub mod bucket;
pub mod color;
pub mod date_range;
pub mod decimation;
pub mod heatmap;
pub mod histogram;
pub mod monthly;
pub mod statistics;
pub mod weekday;

pub use anomaly::{DailyAnomalyCount, Severity, SeverityLevels, daily_anomaly_trend};
pub use color::{ColorPalette, Rgb, Rgba, metric_color};
pub use date_range::{AnalysisWindow, DateRange, filter_by_date_range};
pub use decimation::{decimate, decimate_series, decimation_factor};
pub use heatmap::{Heatmap, heatmap, heatmap_cell_color};
pub use histogram::{Histogram, HistogramBin, histogram, metric_histogram};
pub use monthly::{MonthKey, MonthlyMedians, median, monthly_medians};
pub use statistics::{MetricSummary, latest_values, moving_average, summarize};
pub use weekday::{WeekKey, WeekTieBreak, WeekdayPoint, weekday_name, weekday_series};
