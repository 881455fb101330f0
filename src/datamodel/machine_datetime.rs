pub type MachineDateTime = hifitime::Epoch;
use crate::error::{MachineViewError, Result};
use hifitime::{UNIX_REF_EPOCH, Unit};
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub trait MachineDateTimeExt {
    fn from_unix_milliseconds_i64(timestamp: i64) -> Self;
    fn from_offset_datetime(datetime: &OffsetDateTime) -> Self;
    fn to_unix_milliseconds_i64(&self) -> i64;
    /// Calendar view of the instant at the given UTC offset.
    fn to_local(&self, offset: UtcOffset) -> Result<OffsetDateTime>;
}

impl MachineDateTimeExt for MachineDateTime {
    fn from_unix_milliseconds_i64(timestamp: i64) -> Self {
        Self::from_utc_duration(UNIX_REF_EPOCH.to_utc_duration() + timestamp * Unit::Millisecond)
    }

    fn from_offset_datetime(datetime: &OffsetDateTime) -> Self {
        let milliseconds = datetime.unix_timestamp_nanos().div_euclid(1_000_000) as i64;
        Self::from_unix_milliseconds_i64(milliseconds)
    }

    fn to_unix_milliseconds_i64(&self) -> i64 {
        self.to_unix_milliseconds().round() as i64
    }

    fn to_local(&self, offset: UtcOffset) -> Result<OffsetDateTime> {
        let nanoseconds = self.to_unix_milliseconds_i64() as i128 * 1_000_000;
        Ok(OffsetDateTime::from_unix_timestamp_nanos(nanoseconds)?.to_offset(offset))
    }
}

pub fn machine_datetime_to_rfc3339(datetime: &MachineDateTime) -> Result<String> {
    machine_datetime_to_local_rfc3339(datetime, UtcOffset::UTC)
}

/// RFC 3339 rendering carrying the local offset, e.g. `2024-01-15T11:00:00+01:00`.
pub fn machine_datetime_to_local_rfc3339(
    datetime: &MachineDateTime,
    offset: UtcOffset,
) -> Result<String> {
    datetime
        .to_local(offset)?
        .format(&Rfc3339)
        .map_err(|e| MachineViewError::DateOutOfRange(e.to_string()))
}

/// Parses the timestamp forms the telemetry backend produces.
///
/// Accepted, in order: RFC 3339, the HTTP date Flask's `jsonify` writes
/// (`Mon, 15 Jan 2024 10:00:00 GMT`), RFC 2822, and naive ISO-8601 date
/// times with a `T` or space separator. Naive values carry no offset and are
/// read as local time at `offset`.
pub fn parse_machine_datetime(value: &str, offset: UtcOffset) -> Result<MachineDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return Err(MachineViewError::invalid_timestamp(value, "empty timestamp"));
    }

    if let Ok(datetime) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(MachineDateTime::from_offset_datetime(&datetime));
    }

    if let Ok(datetime) = PrimitiveDateTime::parse(
        value,
        format_description!(
            "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
        ),
    ) {
        return Ok(MachineDateTime::from_offset_datetime(&datetime.assume_utc()));
    }

    if let Ok(datetime) = OffsetDateTime::parse(value, &Rfc2822) {
        return Ok(MachineDateTime::from_offset_datetime(&datetime));
    }

    let normalized = value.replacen(' ', "T", 1);
    let naive = PrimitiveDateTime::parse(
        &normalized,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            &normalized,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        )
    })
    .or_else(|_| {
        PrimitiveDateTime::parse(
            &normalized,
            format_description!("[year]-[month]-[day]T[hour]:[minute]"),
        )
    })
    .or_else(|_| {
        Date::parse(&normalized, format_description!("[year]-[month]-[day]"))
            .map(|date| date.midnight())
    });

    match naive {
        Ok(datetime) => Ok(MachineDateTime::from_offset_datetime(
            &datetime.assume_offset(offset),
        )),
        Err(err) => Err(MachineViewError::invalid_timestamp(value, err)),
    }
}
