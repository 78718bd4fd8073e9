//! HTTP date handling.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
const RFC_850: &str = "%A, %d-%b-%y %H:%M:%S GMT";
const ASCTIME: &str = "%a %b %e %H:%M:%S %Y";

/// Format a timestamp as an IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn format_http_date(time: DateTime<Utc>) -> String {
    time.format(IMF_FIXDATE).to_string()
}

/// Parse any of the three HTTP date formats.
pub fn parse_http_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc2822(input) {
        return Some(parsed.with_timezone(&Utc));
    }
    [RFC_850, ASCTIME]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Round a timestamp down to a multiple of `granularity` since the epoch.
///
/// A zero granularity leaves the timestamp unchanged.
pub fn quantize(time: DateTime<Utc>, granularity: Duration) -> DateTime<Utc> {
    let step = i64::try_from(granularity.as_millis()).unwrap_or(i64::MAX);
    if step == 0 {
        return time;
    }
    let millis = time.timestamp_millis();
    let floored = millis - millis.rem_euclid(step);
    Utc.timestamp_millis_opt(floored).single().unwrap_or(time)
}
