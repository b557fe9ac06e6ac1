//! Date helper functions

use chrono::{Local, NaiveDateTime, TimeZone, Utc};

use crate::content::parse_date_string;

/// Format a post date string with a chrono format, or return it unchanged
pub fn format_date(date: &str, format: &str) -> String {
    match parse_date_string(date) {
        Some(dt) => dt.format(format).to_string(),
        None => date.to_string(),
    }
}

/// Format date in full format (like "January 5, 2024")
pub fn full_date(date: &str) -> String {
    format_date(date, "%B %-d, %Y")
}

/// Format date in short format (like "Jan 5, 2024")
pub fn short_date(date: &str) -> String {
    format_date(date, "%b %-d, %Y")
}

/// RFC 2822 timestamp for feeds; naive dates are taken as UTC
pub fn rfc2822(date: &str) -> Option<String> {
    parse_date_string(date).map(|dt| utc(dt).to_rfc2822())
}

/// Today's date as `YYYY-MM-DD`
pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// A leading `YYYY-MM-DD` in a slug such as `2024-03-15-notes`
pub fn date_prefix(slug: &str) -> Option<String> {
    let prefix = slug.get(..10)?;
    parse_date_string(prefix).map(|_| prefix.to_string())
}

fn utc(dt: NaiveDateTime) -> chrono::DateTime<Utc> {
    Utc.from_utc_datetime(&dt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_and_short_date() {
        assert_eq!(full_date("2024-01-05"), "January 5, 2024");
        assert_eq!(short_date("2025-10-14"), "Oct 14, 2025");
        assert_eq!(full_date("someday"), "someday");
    }

    #[test]
    fn test_rfc2822() {
        assert_eq!(
            rfc2822("2024-03-15").as_deref(),
            Some("Fri, 15 Mar 2024 00:00:00 +0000")
        );
        assert!(rfc2822("nope").is_none());
    }

    #[test]
    fn test_date_prefix() {
        assert_eq!(date_prefix("2024-03-15-notes").as_deref(), Some("2024-03-15"));
        assert_eq!(date_prefix("2024-03-15").as_deref(), Some("2024-03-15"));
        assert!(date_prefix("notes").is_none());
        assert!(date_prefix("energy-monitoring").is_none());
    }

    #[test]
    fn test_today_shape() {
        let today = today();
        assert_eq!(today.len(), 10);
        assert!(parse_date_string(&today).is_some());
    }
}
