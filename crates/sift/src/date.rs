//! OLE Automation date encoding.
//!
//! Date ranges are stored as OLE Automation dates: the number of days since
//! 1899-12-30, with the time of day as the fractional part. Before the epoch
//! the fraction still counts forward from midnight, so 1899-12-29 06:00 is
//! `-1.25`.

use chrono::NaiveDateTime;

/// OLE Automation day number of 1970-01-01.
const UNIX_EPOCH_DAYS: i64 = 25_569;

/// Milliseconds per day.
const MILLIS_PER_DAY: i64 = 86_400_000;

/// Encodes a timestamp as an OLE Automation date, to millisecond precision.
pub fn to_oa_date(value: NaiveDateTime) -> f64 {
    let millis = value.and_utc().timestamp_millis();
    let days = millis.div_euclid(MILLIS_PER_DAY) + UNIX_EPOCH_DAYS;
    let fraction = millis.rem_euclid(MILLIS_PER_DAY) as f64 / MILLIS_PER_DAY as f64;
    if days >= 0 {
        days as f64 + fraction
    } else {
        days as f64 - fraction
    }
}

/// Encodes a timestamp as an OLE Automation date truncated toward zero.
pub fn to_oa_days(value: NaiveDateTime) -> i64 {
    to_oa_date(value).trunc() as i64
}
