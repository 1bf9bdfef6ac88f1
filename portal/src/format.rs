//! Display formatting for dates, times and prices.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};

/// Long British date, e.g. `Saturday 4 January 2025`.
#[must_use]
pub fn long_date(date: NaiveDate) -> String {
    date.format("%A %-d %B %Y").to_string()
}

/// 24-hour time, e.g. `19:00`.
#[must_use]
pub fn clock_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Time range chip, e.g. `19:00 - 21:00`.
#[must_use]
pub fn time_range(start: NaiveTime, end: NaiveTime) -> String {
    format!("{} - {}", clock_time(start), clock_time(end))
}

/// Year a member joined, as shown under "Member Since".
#[must_use]
pub fn member_since(joined: Option<DateTime<Utc>>) -> String {
    joined.map_or_else(|| "N/A".to_string(), |at| at.year().to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn long_date_has_no_leading_zero() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 4).unwrap();
        assert_eq!(long_date(date), "Saturday 4 January 2025");
    }

    #[test]
    fn times_are_24_hour() {
        let start = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
        let end = NaiveTime::from_hms_opt(21, 30, 0).unwrap();
        assert_eq!(time_range(start, end), "09:05 - 21:30");
    }

    #[test]
    fn member_since_year_or_placeholder() {
        let joined = Utc.with_ymd_and_hms(2022, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(member_since(Some(joined)), "2022");
        assert_eq!(member_since(None), "N/A");
    }
}
