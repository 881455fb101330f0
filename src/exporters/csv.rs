use crate::aggregation::{DailyAnomalyCount, Histogram, WeekdayPoint};
use crate::datamodel::MetricName;
use crate::datamodel::MetricRecord;
use crate::datamodel::machine_datetime::machine_datetime_to_local_rfc3339;
use anyhow::Result;
use std::fmt::Write;
use time::UtcOffset;

/// Quotes a cell when it contains a separator, a quote or a line break.
fn escape_cell(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Converter for dashboard data to CSV format
pub struct CsvConverter;

impl CsvConverter {
    /// One row per record, one column per metric. Missing values are empty cells.
    pub fn records_to_csv(
        records: &[MetricRecord],
        metrics: &[MetricName],
        offset: UtcOffset,
    ) -> Result<String> {
        let mut csv_output = String::from("timestamp");
        for metric in metrics {
            csv_output.push(',');
            csv_output.push_str(&escape_cell(metric.as_str()));
        }
        csv_output.push('\n');

        for record in records {
            csv_output.push_str(&machine_datetime_to_local_rfc3339(&record.timestamp, offset)?);
            for metric in metrics {
                csv_output.push(',');
                if let Some(value) = record.value(metric) {
                    write!(csv_output, "{}", value)?;
                }
            }
            csv_output.push('\n');
        }

        Ok(csv_output)
    }

    pub fn anomaly_trend_to_csv(trend: &[DailyAnomalyCount]) -> Result<String> {
        let mut csv_output = String::from("date,anomaly_count,moving_average\n");
        for day in trend {
            writeln!(
                csv_output,
                "{},{},{:.2}",
                day.date, day.count, day.moving_average
            )?;
        }
        Ok(csv_output)
    }

    pub fn histogram_to_csv(histogram: &Histogram) -> Result<String> {
        let mut csv_output = String::from("range,lower,upper,count\n");
        for bin in &histogram.bins {
            writeln!(
                csv_output,
                "{},{},{},{}",
                escape_cell(&bin.label),
                bin.lower,
                bin.upper,
                bin.count
            )?;
        }
        Ok(csv_output)
    }

    pub fn weekday_to_csv(points: &[WeekdayPoint]) -> Result<String> {
        let mut csv_output = String::from("week,label,value\n");
        for point in points {
            writeln!(
                csv_output,
                "{},{},{}",
                point.week_key,
                escape_cell(&point.label),
                point.value
            )?;
        }
        Ok(csv_output)
    }
}
