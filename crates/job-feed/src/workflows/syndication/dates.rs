use chrono::{DateTime, NaiveDate, TimeZone, Utc};

const RFC_822_FORMAT: &str = "%a, %d %b %Y %H:%M:%S +0000";

// Month-first before day-first: the portal renders US-style dates for `en`.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%d-%b-%Y",
];

/// Interprets the free-form posting date shown on a job card. Dates without a
/// time of day are anchored at midnight UTC.
pub fn parse_posted_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// RSS 2.0 date representation, always expressed in UTC.
pub fn format_rfc822(timestamp: DateTime<Utc>) -> String {
    timestamp.format(RFC_822_FORMAT).to_string()
}
