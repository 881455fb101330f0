use crate::datamodel::{MachineDateTime, MachineDateTimeExt, MetricRecord};
use crate::error::Result;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use time::{Date, Duration, Month, OffsetDateTime, Time, UtcOffset};
use tracing::debug;

/// Look-back window selectable on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateRange {
    #[default]
    #[serde(rename = "24h")]
    Last24Hours,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
    #[serde(rename = "1y")]
    LastYear,
}

impl DateRange {
    /// Unknown tokens fall back to the 24 hour window.
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            "24h" => DateRange::Last24Hours,
            "7d" => DateRange::Last7Days,
            "30d" => DateRange::Last30Days,
            "90d" => DateRange::Last90Days,
            "1y" => DateRange::LastYear,
            other => {
                debug!("Unknown date range '{}', using 24h", other);
                DateRange::Last24Hours
            }
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            DateRange::Last24Hours => "24h",
            DateRange::Last7Days => "7d",
            DateRange::Last30Days => "30d",
            DateRange::Last90Days => "90d",
            DateRange::LastYear => "1y",
        }
    }

    /// Oldest instant still inside the window ending at `now`.
    ///
    /// The year window steps back one calendar year in local time; a
    /// February 29 lands on March 1 of the previous year.
    pub fn cutoff(&self, now: MachineDateTime, offset: UtcOffset) -> Result<MachineDateTime> {
        let local = now.to_local(offset)?;
        let cutoff = match self {
            DateRange::Last24Hours => local - Duration::hours(24),
            DateRange::Last7Days => local - Duration::days(7),
            DateRange::Last30Days => local - Duration::days(30),
            DateRange::Last90Days => local - Duration::days(90),
            DateRange::LastYear => one_year_before(local)?,
        };
        Ok(MachineDateTime::from_offset_datetime(&cutoff))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

impl FromStr for DateRange {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(DateRange::parse(s))
    }
}

fn one_year_before(local: OffsetDateTime) -> Result<OffsetDateTime> {
    let year = local.year() - 1;
    match local.replace_year(year) {
        Ok(shifted) => Ok(shifted),
        Err(_) => Ok(local.replace_date(Date::from_calendar_date(year, Month::March, 1)?)),
    }
}

/// Records at or after the window cutoff, in their original order.
pub fn filter_by_date_range(
    records: &[MetricRecord],
    range: DateRange,
    now: MachineDateTime,
    offset: UtcOffset,
) -> Result<Vec<MetricRecord>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }
    let cutoff = range.cutoff(now, offset)?.to_unix_milliseconds_i64();
    Ok(records
        .iter()
        .filter(|record| record.unix_milliseconds() >= cutoff)
        .cloned()
        .collect())
}

/// Inclusive calendar window used by the machine analysis view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisWindow {
    #[serde(serialize_with = "serialize_date")]
    pub start: Date,
    #[serde(serialize_with = "serialize_date")]
    pub end: Date,
}

/// Writes a calendar date as `YYYY-MM-DD`.
pub(crate) fn serialize_date<S: Serializer>(
    date: &Date,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(date)
}

impl AnalysisWindow {
    pub fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }

    /// Window from `range` before `today` up to `today`. The analysis view
    /// has no year option; it treats the year token like 30 days.
    pub fn for_range(range: DateRange, now: MachineDateTime, offset: UtcOffset) -> Result<Self> {
        let local = now.to_local(offset)?;
        let start = match range {
            DateRange::Last24Hours => local - Duration::hours(24),
            DateRange::Last7Days => local - Duration::days(7),
            DateRange::Last30Days | DateRange::LastYear => local - Duration::days(30),
            DateRange::Last90Days => local - Duration::days(90),
        };
        Ok(Self {
            start: start.date(),
            end: local.date(),
        })
    }

    /// Days of the window, both ends included. Empty when `start > end`.
    pub fn days(&self) -> impl Iterator<Item = Date> + '_ {
        let end = self.end;
        std::iter::successors(Some(self.start), |day| day.next_day())
            .take_while(move |day| *day <= end)
    }

    /// Records from the start of `start` through 23:59:59 on `end`.
    pub fn filter(&self, records: &[MetricRecord], offset: UtcOffset) -> Result<Vec<MetricRecord>> {
        let from = MachineDateTime::from_offset_datetime(
            &self.start.with_time(Time::MIDNIGHT).assume_offset(offset),
        )
        .to_unix_milliseconds_i64();
        let until = MachineDateTime::from_offset_datetime(
            &self
                .end
                .with_hms(23, 59, 59)?
                .assume_offset(offset),
        )
        .to_unix_milliseconds_i64();

        Ok(records
            .iter()
            .filter(|record| {
                let ms = record.unix_milliseconds();
                ms >= from && ms <= until
            })
            .cloned()
            .collect())
    }
}
