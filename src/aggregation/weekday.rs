use super::bucket::AggregationBucket;
use crate::datamodel::metric_record::indices_newest_first;
use crate::datamodel::{MachineDateTimeExt, MetricName, MetricRecord};
use crate::error::{MachineViewError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::str::FromStr;
use time::UtcOffset;

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// How a week with several readings on the selected weekday is reduced to
/// one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekTieBreak {
    /// Value of the most recent record of that day.
    #[default]
    Latest,
    /// Value of the oldest record of that day.
    Earliest,
    /// Mean of all readings of that day.
    Mean,
}

impl FromStr for WeekTieBreak {
    type Err = MachineViewError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "latest" | "last" => Ok(WeekTieBreak::Latest),
            "earliest" | "first" => Ok(WeekTieBreak::Earliest),
            "mean" | "average" => Ok(WeekTieBreak::Mean),
            _ => Err(MachineViewError::Configuration(format!(
                "Unknown week tie break: {}",
                s
            ))),
        }
    }
}

/// ISO 8601 week, Thursday-anchored.
///
/// `iso_year` is the year of the week's Thursday, which differs from the
/// calendar year for days around new year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeekKey {
    pub iso_year: i32,
    pub week: u8,
}

impl WeekKey {
    pub fn label(&self) -> String {
        format!("{} W{:02}", self.iso_year, self.week)
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.iso_year, self.week)
    }
}

impl Serialize for WeekKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayPoint {
    pub week_key: WeekKey,
    pub label: String,
    pub value: f64,
}

pub fn weekday_name(weekday: u8) -> Result<&'static str> {
    WEEKDAY_NAMES
        .get(weekday as usize)
        .copied()
        .ok_or(MachineViewError::InvalidWeekday(weekday))
}

/// One value per ISO week for the readings taken on `weekday`
/// (0 = Sunday .. 6 = Saturday), sorted chronologically.
///
/// Records are visited newest first, so the tie break is independent of the
/// order the backend delivered them in. Records without a value for
/// `metric` are skipped.
pub fn weekday_series(
    records: &[MetricRecord],
    weekday: u8,
    metric: &MetricName,
    tie_break: WeekTieBreak,
    offset: UtcOffset,
) -> Result<Vec<WeekdayPoint>> {
    weekday_name(weekday)?;

    let mut weeks: BTreeMap<WeekKey, AggregationBucket> = BTreeMap::new();
    for index in indices_newest_first(records) {
        let record = &records[index];
        let local = record.timestamp.to_local(offset)?;
        if local.weekday().number_days_from_sunday() != weekday {
            continue;
        }
        let Some(value) = record.value(metric) else {
            continue;
        };
        let (iso_year, week, _) = local.to_iso_week_date();
        match weeks.entry(WeekKey { iso_year, week }) {
            Entry::Vacant(entry) => {
                entry.insert(AggregationBucket::new(value));
            }
            Entry::Occupied(mut entry) => entry.get_mut().push(value),
        }
    }

    Ok(weeks
        .into_iter()
        .map(|(week_key, bucket)| {
            let value = match tie_break {
                WeekTieBreak::Latest => bucket.first(),
                WeekTieBreak::Earliest => bucket.last(),
                WeekTieBreak::Mean => bucket.mean(),
            };
            WeekdayPoint {
                week_key,
                label: week_key.label(),
                value,
            }
        })
        .collect())
}
