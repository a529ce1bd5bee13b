//! Email date normalization to a calendar date.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

/// Datetime layouts seen in real-world `Date:` headers and Outlook exports.
const DATETIME_FORMATS: &[&str] = &[
    "%d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M %z",
    "%b %d %H:%M:%S %Y",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Parse an email date header into a calendar date.
///
/// Tries RFC 2822, RFC 3339, a list of common variants (day-of-week
/// stripped, named time zones replaced) and finally a bare leading
/// `YYYY-MM-DD`. Returns `None` if nothing matches.
pub fn parse_email_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    let no_dow = strip_day_of_week(trimmed);
    let candidates = [no_dow.clone(), replace_named_tz(&no_dow)];
    for candidate in &candidates {
        for fmt in DATETIME_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(candidate, fmt) {
                return Some(dt.date_naive());
            }
            if let Ok(ndt) = NaiveDateTime::parse_from_str(candidate, fmt) {
                return Some(ndt.date());
            }
        }
    }

    // Outlook exports often start with an ISO date: "2024-03-15 09:12:44+01:00"
    if let Some(prefix) = trimmed.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }

    debug!(date = trimmed, "Could not parse date");
    None
}

/// Parse `raw`, falling back to today's date.
pub fn normalize_date(raw: Option<&str>) -> NaiveDate {
    raw.and_then(parse_email_date)
        .unwrap_or_else(|| chrono::Local::now().date_naive())
}

/// Strip a leading day-of-week prefix (`"Thu, "` or `"Thu "`).
fn strip_day_of_week(s: &str) -> String {
    let days = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    for day in days {
        if let Some(rest) = s.strip_prefix(day) {
            if rest.starts_with(',') || rest.starts_with(' ') {
                return rest.trim_start_matches(',').trim().to_string();
            }
        }
    }
    s.to_string()
}

/// Replace well-known time zone abbreviations with numeric offsets.
fn replace_named_tz(s: &str) -> String {
    let tzs = [
        ("UT", "+0000"),
        ("GMT", "+0000"),
        ("UTC", "+0000"),
        ("EST", "-0500"),
        ("EDT", "-0400"),
        ("CST", "-0600"),
        ("CDT", "-0500"),
        ("PST", "-0800"),
        ("PDT", "-0700"),
        ("CET", "+0100"),
        ("CEST", "+0200"),
    ];
    let mut parts: Vec<&str> = s.split_whitespace().collect();
    // Drop trailing comments such as "(UTC)"
    if parts.last().is_some_and(|p| p.starts_with('(')) {
        parts.pop();
    }
    if let Some(last) = parts.last_mut() {
        if let Some((_, offset)) = tzs.iter().find(|(name, _)| last.eq_ignore_ascii_case(name)) {
            *last = *offset;
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_rfc2822() {
        assert_eq!(
            parse_email_date("Fri, 15 Mar 2024 10:00:00 +0000"),
            Some(ymd(2024, 3, 15))
        );
    }

    #[test]
    fn test_without_day_of_week_and_named_tz() {
        assert_eq!(
            parse_email_date("15 Mar 2024 10:00:00 EST"),
            Some(ymd(2024, 3, 15))
        );
        assert_eq!(
            parse_email_date("Fri, 15 Mar 2024 10:00:00 +0100 (CET)"),
            Some(ymd(2024, 3, 15))
        );
    }

    #[test]
    fn test_iso_variants() {
        assert_eq!(parse_email_date("2024-03-15T08:30:00Z"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_email_date("2024-03-15 08:30:00"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_email_date("2024-03-15"), Some(ymd(2024, 3, 15)));
    }

    #[test]
    fn test_european_layout() {
        assert_eq!(parse_email_date("15/03/2024 08:30"), Some(ymd(2024, 3, 15)));
    }

    #[test]
    fn test_garbage() {
        assert_eq!(parse_email_date("not a date"), None);
        assert_eq!(parse_email_date(""), None);
    }

    #[test]
    fn test_normalize_falls_back_to_today() {
        let today = chrono::Local::now().date_naive();
        assert_eq!(normalize_date(None), today);
        assert_eq!(normalize_date(Some("31/31/31")), today);
        assert_eq!(normalize_date(Some("2023-12-01")), ymd(2023, 12, 1));
    }
}
