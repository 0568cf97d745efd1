//! Date parsing for temporal columns.

use chrono::NaiveDate;

/// Accepted date layouts, tried in order.
pub const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%d-%m-%Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%b %d, %Y",
    "%d %b %Y",
    "%A, %b %d %Y",
];

/// Parse `raw` under the first matching layout in [`DATE_FORMATS`].
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Seconds since the Unix epoch at midnight UTC of the parsed date.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    parse_date(raw)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

/// Parse a number that is usable in threshold comparisons.
///
/// NaN and infinities are rejected.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a raw value as a number, falling back to a date timestamp.
#[must_use]
pub fn parse_comparable(raw: &str) -> Option<f64> {
    parse_number(raw).or_else(|| parse_timestamp(raw).map(|ts| ts as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_date() {
        assert_eq!(parse_date("2023-01-05"), NaiveDate::from_ymd_opt(2023, 1, 5));
    }

    #[test]
    fn day_first_dashes() {
        assert_eq!(parse_date("05-01-2023"), NaiveDate::from_ymd_opt(2023, 1, 5));
    }

    #[test]
    fn month_first_slashes() {
        assert_eq!(parse_date("01/05/2023"), NaiveDate::from_ymd_opt(2023, 1, 5));
    }

    #[test]
    fn textual_month() {
        assert_eq!(parse_date("Jan 2, 2006"), NaiveDate::from_ymd_opt(2006, 1, 2));
        assert_eq!(parse_date("02 Jan 2006"), NaiveDate::from_ymd_opt(2006, 1, 2));
    }

    #[test]
    fn weekday_layout() {
        assert_eq!(
            parse_date("Monday, Jan 2 2006"),
            NaiveDate::from_ymd_opt(2006, 1, 2)
        );
    }

    #[test]
    fn not_a_date() {
        assert!(parse_date("Sunny").is_none());
        assert!(parse_date("2023-13-45").is_none());
    }

    #[test]
    fn epoch_is_zero() {
        assert_eq!(parse_timestamp("1970-01-01"), Some(0));
        assert_eq!(parse_timestamp("1970-01-02"), Some(86_400));
    }

    #[test]
    fn number_rejects_non_finite() {
        assert_eq!(parse_number(" 3.5 "), Some(3.5));
        assert!(parse_number("NaN").is_none());
        assert!(parse_number("inf").is_none());
        assert!(parse_number("abc").is_none());
    }

    #[test]
    fn comparable_prefers_number() {
        assert_eq!(parse_comparable("42"), Some(42.0));
        assert_eq!(parse_comparable("1970-01-02"), Some(86_400.0));
        assert!(parse_comparable("High").is_none());
    }
}
