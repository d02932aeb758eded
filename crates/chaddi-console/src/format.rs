//! Display formatters shared by the console views and reports.
//!
//! All functions are pure and total: missing input yields a fixed fallback
//! instead of an error.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use std::fmt::Display;

/// Avatar palette; a name always maps to the same entry.
pub const USER_PALETTE: [&str; 10] = [
    "#007bff", "#28a745", "#17a2b8", "#ffc107", "#dc3545", "#6610f2", "#e83e8c", "#fd7e14",
    "#20c997", "#6f42c1",
];

/// Color used when there is no name to hash.
pub const NEUTRAL_COLOR: &str = "#6c757d";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parses a server timestamp. Zone-less values are taken as local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // "2024-01-05 14:30:00+05:30", as the version endpoint reports it
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS.iter().find_map(|fmt| {
        let naive = NaiveDateTime::parse_from_str(raw, fmt).ok()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

/// Groups an integer with commas: `1234567` -> `"1,234,567"`. `None` is `"0"`.
pub fn format_number(value: Option<i64>) -> String {
    let Some(value) = value else {
        return "0".to_string();
    };
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Relative age of `ts` as seen at `now`.
pub fn format_relative_at(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = now.signed_duration_since(ts).num_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{}d ago", days);
    }
    absolute_short(&ts.with_timezone(&Local))
}

/// Relative age of a raw server timestamp; `""` when missing or unparseable.
pub fn format_relative(raw: Option<&str>, now: DateTime<Utc>) -> String {
    raw.and_then(parse_timestamp)
        .map(|ts| format_relative_at(ts, now))
        .unwrap_or_default()
}

/// Day-granular age used in the group list: Today, Yesterday, N days ago, M/D/YYYY.
pub fn format_day_at(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = now.signed_duration_since(ts).num_days().abs();
    match days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => format!("{} days ago", days),
        _ => calendar_date(&ts.with_timezone(&Local)),
    }
}

pub fn format_day(raw: Option<&str>, now: DateTime<Utc>) -> String {
    raw.and_then(parse_timestamp)
        .map(|ts| format_day_at(ts, now))
        .unwrap_or_default()
}

/// `"Jan 5, 2024, 02:30 PM"` in local time.
pub fn format_date_time(raw: Option<&str>) -> String {
    raw.and_then(parse_timestamp)
        .map(|ts| long_date_time(&ts.with_timezone(&Local)))
        .unwrap_or_default()
}

/// `"01/05/2024, 02:30 PM"` in local time.
pub fn format_short_date_time(raw: Option<&str>) -> String {
    raw.and_then(parse_timestamp)
        .map(|ts| numeric_date_time(&ts.with_timezone(&Local)))
        .unwrap_or_default()
}

/// `"1/5/2024"` in local time.
pub fn format_date(raw: Option<&str>) -> String {
    raw.and_then(parse_timestamp)
        .map(|ts| calendar_date(&ts.with_timezone(&Local)))
        .unwrap_or_default()
}

pub(crate) fn absolute_short<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    ts.format("%b %-d, %I:%M %p").to_string()
}

pub(crate) fn long_date_time<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    ts.format("%b %-d, %Y, %I:%M %p").to_string()
}

pub(crate) fn numeric_date_time<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    ts.format("%m/%d/%Y, %I:%M %p").to_string()
}

pub(crate) fn calendar_date<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    ts.format("%-m/%-d/%Y").to_string()
}

/// Up to two uppercase initials: first and last word. Blank names give `"?"`.
pub fn initials(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    let first_char = |word: &str| word.chars().next().map(|c| c.to_uppercase().to_string());
    match words.as_slice() {
        [] => "?".to_string(),
        [only] => first_char(*only).unwrap_or_else(|| "?".to_string()),
        [first, .., last] => {
            let mut out = first_char(*first).unwrap_or_default();
            out.push_str(&first_char(*last).unwrap_or_default());
            out
        }
    }
}

/// The browser's `hash = c + ((hash << 5) - hash)` over UTF-16 code units,
/// with the shift performed on the 32-bit truncation of the running value.
fn name_hash(name: &str) -> i64 {
    name.encode_utf16().fold(0i64, |hash, unit| {
        let shifted = (hash as i32).wrapping_shl(5) as i64;
        unit as i64 + (shifted - hash)
    })
}

/// Index into [`USER_PALETTE`] for a name.
pub fn color_index(name: &str) -> usize {
    (name_hash(name).unsigned_abs() % USER_PALETTE.len() as u64) as usize
}

/// Stable avatar color for a user name; [`NEUTRAL_COLOR`] for an empty name.
pub fn color_for_user(name: &str) -> &'static str {
    if name.is_empty() {
        return NEUTRAL_COLOR;
    }
    USER_PALETTE[color_index(name)]
}

/// Escapes text the way a DOM text node serializes: `&`, `<`, `>` and NBSP.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

/// First 8 characters of a git commit id.
pub fn short_commit(commit: &str) -> String {
    commit.chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(None), "0");
        assert_eq!(format_number(Some(0)), "0");
        assert_eq!(format_number(Some(999)), "999");
        assert_eq!(format_number(Some(1000)), "1,000");
        assert_eq!(format_number(Some(1234567)), "1,234,567");
        assert_eq!(format_number(Some(-45210)), "-45,210");
    }

    #[test]
    fn test_relative_buckets() {
        let now = at("2024-06-10T12:00:00Z");
        assert_eq!(format_relative_at(now - Duration::seconds(30), now), "Just now");
        assert_eq!(format_relative_at(now - Duration::seconds(90), now), "1m ago");
        assert_eq!(format_relative_at(now - Duration::minutes(59), now), "59m ago");
        assert_eq!(format_relative_at(now - Duration::minutes(60), now), "1h ago");
        assert_eq!(format_relative_at(now - Duration::hours(23), now), "23h ago");
        assert_eq!(format_relative_at(now - Duration::hours(24), now), "1d ago");
        assert_eq!(format_relative_at(now - Duration::days(6), now), "6d ago");
        // future timestamps collapse into the first bucket
        assert_eq!(format_relative_at(now + Duration::minutes(5), now), "Just now");
    }

    #[test]
    fn test_relative_missing_input() {
        let now = Utc::now();
        assert_eq!(format_relative(None, now), "");
        assert_eq!(format_relative(Some("not a date"), now), "");
    }

    #[test]
    fn test_relative_from_raw_string() {
        let now = at("2024-06-10T12:00:00Z");
        assert_eq!(format_relative(Some("2024-06-10T11:58:00Z"), now), "2m ago");
        assert_eq!(
            format_relative(Some("2024-06-10 14:30:00+05:30"), now),
            "3h ago"
        );
    }

    #[test]
    fn test_absolute_formats() {
        let ts = at("2024-01-05T14:30:00Z");
        assert_eq!(absolute_short(&ts), "Jan 5, 02:30 PM");
        assert_eq!(long_date_time(&ts), "Jan 5, 2024, 02:30 PM");
        assert_eq!(numeric_date_time(&ts), "01/05/2024, 02:30 PM");
        assert_eq!(calendar_date(&ts), "1/5/2024");
    }

    #[test]
    fn test_format_day() {
        let now = at("2024-06-10T12:00:00Z");
        assert_eq!(format_day_at(now - Duration::hours(3), now), "Today");
        assert_eq!(format_day_at(now - Duration::hours(30), now), "Yesterday");
        assert_eq!(format_day_at(now - Duration::days(4), now), "4 days ago");
        assert_eq!(format_day(None, now), "");
    }

    #[test]
    fn test_parse_naive_timestamp_is_local() {
        let naive = NaiveDateTime::parse_from_str("2024-02-01 08:15:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        let expected = Local
            .from_local_datetime(&naive)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(parse_timestamp("2024-02-01T08:15:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-02-01T08:15:00.000123"),
            Some(expected + Duration::microseconds(123))
        );
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials(""), "?");
        assert_eq!(initials("   "), "?");
        assert_eq!(initials("chaddi"), "C");
        assert_eq!(initials("ravi kumar"), "RK");
        assert_eq!(initials("  ravi   kumar sharma "), "RS");
    }

    #[test]
    fn test_color_is_deterministic() {
        let first = color_for_user("Bakchod Supreme");
        for _ in 0..10 {
            assert_eq!(color_for_user("Bakchod Supreme"), first);
        }
        assert_eq!(color_for_user(""), NEUTRAL_COLOR);
    }

    #[test]
    fn test_color_hash_matches_browser_values() {
        // "a" -> 97, "ab" -> 98 + (97 * 31) = 3105
        assert_eq!(name_hash("a"), 97);
        assert_eq!(name_hash("ab"), 3105);
        assert_eq!(color_index("a"), 7);
        assert_eq!(color_index("ab"), 5);
    }

    #[test]
    fn test_color_hash_long_names_do_not_overflow() {
        let name = "x".repeat(10_000);
        assert!(color_index(&name) < USER_PALETTE.len());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(""), "");
        assert_eq!(
            escape_html("<b>Tom & \"Jerry\"</b>"),
            "&lt;b&gt;Tom &amp; \"Jerry\"&lt;/b&gt;"
        );
        assert_eq!(escape_html("a\u{a0}b"), "a&nbsp;b");
    }

    #[test]
    fn test_short_commit() {
        assert_eq!(short_commit("abcdef1234567"), "abcdef12");
        assert_eq!(short_commit("abc"), "abc");
    }
}
