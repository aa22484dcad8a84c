//! UTC calendar-day bucketing
//!
//! # Example
//!
//! ```rust
//! use domain_stats::calendar::enumerate_days;
//! use chrono::{TimeZone, Utc};
//!
//! let start = Utc.with_ymd_and_hms(2009, 11, 10, 2, 1, 2).unwrap();
//! let end = Utc.with_ymd_and_hms(2009, 11, 12, 23, 2, 3).unwrap();
//!
//! let days = enumerate_days(start, end).unwrap();
//! assert_eq!(days.len(), 3);
//! assert_eq!(days[0], Utc.with_ymd_and_hms(2009, 11, 10, 0, 0, 0).unwrap());
//! ```

use crate::error::{Error, Result};

use chrono::{DateTime, Days, NaiveDate, Utc};

/// UTC midnight of the calendar day containing `time`
pub fn start_of_day(time: DateTime<Utc>) -> DateTime<Utc> {
    midnight(time.date_naive())
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// One UTC midnight per calendar day from `start` to `end`, both inclusive
///
/// Both bounds are first truncated to UTC midnight, so any two instants on
/// the same day yield that single day. Fails with `InvalidRange` when the
/// start day comes after the end day.
pub fn enumerate_days(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>> {
    let first = start.date_naive();
    let last = end.date_naive();

    if first > last {
        return Err(Error::InvalidRange {
            start: first.to_string(),
            end: last.to_string(),
        });
    }

    let span = (last - first).num_days() as usize + 1;
    let mut days = Vec::with_capacity(span);
    let mut day = first;
    loop {
        days.push(midnight(day));
        if day == last {
            break;
        }
        day = day
            .checked_add_days(Days::new(1))
            .ok_or_else(|| Error::InvalidRange {
                start: first.to_string(),
                end: last.to_string(),
            })?;
    }
    Ok(days)
}
