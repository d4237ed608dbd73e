use chrono::{DateTime, Duration, NaiveTime, Utc};

use super::SchedulingError;

/// 24h format used for work-hour comparisons.
const TIME_OF_DAY: &str = "%H:%M";

/// Whether `point` falls inside an existing booking `[start, end]`.
///
/// Both boundaries are inclusive for a non-empty window, so a booking that
/// starts exactly when another one ends collides with it. An empty window
/// (`start == end`) contains nothing.
pub fn instant_within(start: DateTime<Utc>, end: DateTime<Utc>, point: DateTime<Utc>) -> bool {
    if point == end && point > start {
        return true;
    }
    if point == start && point < end {
        return true;
    }
    point > start && point < end
}

/// Whether a work-hour magnitude lies strictly between opening and closing.
/// Opening and closing hours themselves are outside.
pub fn magnitude_within(start: f64, end: f64, value: f64) -> bool {
    value > start && value < end
}

/// `"14:30"` -> `14.30`.
///
/// The minutes become decimal digits rather than a fraction of an hour, so
/// `"14:30"` is *not* `14.5`. Values stay ordered the same way as the clock
/// times they came from, which is all the work-hour check needs.
pub fn fractional_hours(s: &str) -> Result<f64, SchedulingError> {
    let joined = s.trim().split(':').collect::<Vec<_>>().join(".");
    match joined.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(SchedulingError::InvalidTimeOfDay(s.to_string())),
    }
}

/// Wall-clock time of an instant, e.g. `"09:05"`.
pub fn time_of_day(at: DateTime<Utc>) -> String {
    at.format(TIME_OF_DAY).to_string()
}

/// Validate a schedule boundary such as `"08:00"` (a single-digit hour is
/// accepted).
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, SchedulingError> {
    NaiveTime::parse_from_str(s.trim(), TIME_OF_DAY)
        .map_err(|_| SchedulingError::InvalidTimeOfDay(s.to_string()))
}

/// Parse durations written as `<number><unit>` pairs, e.g. `"1h"`, `"1h30m"`,
/// `"1.5h"`, `"90s"`. Units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`. A leading
/// sign is allowed and a bare `"0"` means zero.
pub fn parse_duration(input: &str) -> Result<Duration, SchedulingError> {
    let malformed = || SchedulingError::MalformedDuration(input.to_string());

    let (negative, mut s) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };
    if s == "0" {
        return Ok(Duration::zero());
    }
    if s.is_empty() {
        return Err(malformed());
    }

    let mut total: u128 = 0;
    while !s.is_empty() {
        let int_len = s.bytes().take_while(u8::is_ascii_digit).count();
        let (int_digits, rest) = s.split_at(int_len);
        let (frac_digits, rest) = match rest.strip_prefix('.') {
            Some(after) => {
                let n = after.bytes().take_while(u8::is_ascii_digit).count();
                after.split_at(n)
            }
            None => ("", rest),
        };
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(malformed());
        }

        let unit_len = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (unit, rest) = rest.split_at(unit_len);
        let scale = unit_nanos(unit).ok_or_else(malformed)?;

        let whole: u128 = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().map_err(|_| malformed())?
        };
        let mut value = whole.checked_mul(scale).ok_or_else(malformed)?;
        if !frac_digits.is_empty() {
            // Anything past nanosecond precision is dropped.
            let digits = &frac_digits[..frac_digits.len().min(18)];
            let frac: u128 = digits.parse().map_err(|_| malformed())?;
            let frac_nanos = frac.checked_mul(scale).ok_or_else(malformed)? / 10u128.pow(digits.len() as u32);
            value = value.checked_add(frac_nanos).ok_or_else(malformed)?;
        }

        total = total.checked_add(value).ok_or_else(malformed)?;
        s = rest;
    }

    let nanos = i64::try_from(total).map_err(|_| malformed())?;
    Ok(Duration::nanoseconds(if negative { -nanos } else { nanos }))
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(1_000_000_000),
        "m" => Some(60 * 1_000_000_000),
        "h" => Some(60 * 60 * 1_000_000_000),
        _ => None,
    }
}
