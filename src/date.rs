use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y%m%dT%H%M%S",
    "%d %B %Y %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
    "%b %d %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
];

/// Normalizes a human-readable date/time to ISO-8601.
///
/// Naive values render as `YYYY-MM-DDTHH:MM:SS` (with microseconds only when
/// non-zero); values carrying an offset keep it as `+HH:MM`. Bare dates are
/// taken as midnight.
pub fn normalize_timestamp(input: &str) -> Result<String> {
    let s = input.trim();
    if s.is_empty() {
        return Err(Error::parameter("time", "empty timestamp"));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(format!(
            "{}{}",
            render_naive(&dt.naive_local()),
            dt.format("%:z")
        ));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(render_naive(&dt));
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(render_naive(&d.and_time(Default::default())));
        }
    }

    Err(Error::parameter(
        "time",
        format!("could not parse '{}' as a date/time", s),
    ))
}

fn render_naive(dt: &NaiveDateTime) -> String {
    let micros = dt.nanosecond() / 1_000;
    if micros == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        format!("{}.{:06}", dt.format("%Y-%m-%dT%H:%M:%S"), micros)
    }
}
