//! Day-window helpers shared by the attendance ledger and its query paths.
//!
//! Attendance keys records by calendar day, and range queries are inclusive
//! on both ends, so every boundary is expanded to a full day before any
//! comparison happens.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Truncates a timestamp to 00:00:00.000 of its UTC calendar day.
pub fn start_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
}

/// Expands a timestamp to 23:59:59.999 of its UTC calendar day.
pub fn end_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.date_naive()
        .and_hms_milli_opt(23, 59, 59, 999)
        .expect("end of day is always a valid time")
        .and_utc()
}

/// Elapsed time between two instants, in hours, rounded to two decimals.
pub fn elapsed_hours(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let diff_ms = (to - from).num_milliseconds() as f64;
    let hours = diff_ms / (1000.0 * 60.0 * 60.0);
    (hours * 100.0).round() / 100.0
}

/// Full-day window covering the calendar month containing `now`.
///
/// Used as the default range for self-history queries when the caller
/// supplies no bounds.
pub fn current_month_range(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .expect("first of month is always valid");
    let first_of_next = if now.month() == 12 {
        NaiveDate::from_ymd_opt(now.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(now.year(), now.month() + 1, 1)
    }
    .expect("first of next month is always valid");
    let last = first_of_next - Duration::days(1);

    (
        start_of_day(first.and_hms_opt(0, 0, 0).unwrap().and_utc()),
        end_of_day(last.and_hms_opt(0, 0, 0).unwrap().and_utc()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn start_and_end_of_day_bracket_the_same_date() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap();
        let start = start_of_day(ts);
        let end = end_of_day(ts);

        assert_eq!(start.to_rfc3339(), "2026-03-14T00:00:00+00:00");
        assert_eq!(end.timestamp_millis() - start.timestamp_millis(), 86_399_999);
    }

    #[test]
    fn elapsed_hours_rounds_to_two_decimals() {
        let punch_in = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        let punch_out = Utc.with_ymd_and_hms(2026, 3, 14, 17, 30, 0).unwrap();
        assert_eq!(elapsed_hours(punch_in, punch_out), 8.50);

        let twenty_min = Utc.with_ymd_and_hms(2026, 3, 14, 9, 20, 0).unwrap();
        assert_eq!(elapsed_hours(punch_in, twenty_min), 0.33);
    }

    #[test]
    fn current_month_range_covers_first_to_last_day() {
        let now = Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap();
        let (start, end) = current_month_range(now);
        assert_eq!(start.to_rfc3339(), "2026-02-01T00:00:00+00:00");
        // 2026 is not a leap year.
        assert!(end.to_rfc3339().starts_with("2026-02-28T23:59:59"));
    }

    #[test]
    fn current_month_range_handles_december() {
        let now = Utc.with_ymd_and_hms(2025, 12, 25, 8, 0, 0).unwrap();
        let (start, end) = current_month_range(now);
        assert_eq!(start.to_rfc3339(), "2025-12-01T00:00:00+00:00");
        assert!(end.to_rfc3339().starts_with("2025-12-31T23:59:59"));
    }
}
