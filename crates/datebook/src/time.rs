//! Date helpers shared by the store, the expander and the bindings.
//!
//! Instants are kept as `DateTime<Utc>`. Every calendar-day question is asked
//! in a configured IANA zone, the way the browser asks it in local time.

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::error::{DatebookError, Result};

/// Parse a user or wire supplied timestamp.
///
/// Accepts RFC 3339 (offset honoured), a naive `YYYY-MM-DDTHH:MM[:SS[.fff]]`
/// or a bare `YYYY-MM-DD`. Naive forms are wall-clock time in `tz`; a bare
/// date means midnight.
pub fn parse_datetime_in(s: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(local_to_utc(naive, tz));
        }
    }
    let date = parse_date(s)?;
    Ok(local_to_utc(date.and_time(NaiveTime::MIN), tz))
}

/// [`parse_datetime_in`] with naive forms read as UTC. This is how persisted
/// values are read: the writer always emits UTC.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    parse_datetime_in(s, &Tz::UTC)
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| DatebookError::InvalidDate(format!("'{}': {}", s, e)))
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| DatebookError::InvalidTimezone(name.to_string()))
}

/// The calendar day an instant falls on in `tz`.
pub fn local_date(dt: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    dt.with_timezone(tz).date_naive()
}

/// Resolve a wall-clock time in `tz` to an instant.
///
/// Ambiguous times (clocks falling back) take the earlier instant. Times in a
/// spring-forward gap move forward by the size of the gap, keeping the wall
/// clock as close to the requested one as the zone allows.
pub fn local_to_utc(naive: NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            // Gaps are at most a couple of hours; probe forward in 15 minute
            // steps until the wall clock exists again.
            let mut probe = naive;
            for _ in 0..16 {
                probe += Duration::minutes(15);
                if let Some(dt) = tz.from_local_datetime(&probe).earliest() {
                    return dt.with_timezone(&Utc);
                }
            }
            naive.and_utc()
        }
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// Add `months` to `date`, keeping the day of month and clamping it to the
/// last day of the target month (Jan 31 + 1 month = Feb 28/29, never Mar 3).
///
/// Returns `None` only when the result leaves chrono's representable range.
pub fn add_months_clamped(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let total = date.year() as i64 * 12 + date.month0() as i64 + months as i64;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = total.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Serde adapter for instants: writes RFC 3339 UTC with millisecond
/// precision, reads anything [`parse_datetime`] accepts.
pub mod iso {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_datetime(&s).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => super::serialize(dt, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|s| crate::time::parse_datetime(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
