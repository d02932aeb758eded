use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

static TIMESTAMP_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}[.,]\d+)").unwrap());

static LOG_LINE_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warning,
    Debug,
    Info,
    Success,
}

impl LogLevel {
    /// Keyword sniffing over the whole line, most severe first.
    pub fn detect(content: &str) -> Option<Self> {
        let lower = content.to_lowercase();
        if lower.contains("error") || lower.contains("exception") {
            Some(LogLevel::Error)
        } else if lower.contains("warn") {
            Some(LogLevel::Warning)
        } else if lower.contains("debug") {
            Some(LogLevel::Debug)
        } else if lower.contains("info") {
            Some(LogLevel::Info)
        } else if lower.contains("success") {
            Some(LogLevel::Success)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Success => "success",
        }
    }
}

/// A line from the server's log stream.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    /// Synthetic id: receive time in milliseconds plus a process-wide sequence.
    pub id: String,
    pub received_at: DateTime<Utc>,
    pub level: Option<LogLevel>,
    /// Leading `YYYY-MM-DD HH:MM:SS.fff` stamp, when the line carries one.
    pub timestamp: Option<String>,
    /// The line without its timestamp prefix.
    pub message: String,
}

impl LogLine {
    pub fn parse(content: &str, received_at: DateTime<Utc>) -> Self {
        let seq = LOG_LINE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let id = format!("log-{}-{}", received_at.timestamp_millis(), seq);
        let level = LogLevel::detect(content);

        let (timestamp, message) = match TIMESTAMP_PREFIX.captures(content) {
            Some(caps) => {
                let stamp = caps[1].to_string();
                let rest = content[caps[0].len()..].trim().to_string();
                (Some(stamp), rest)
            }
            None => (None, content.to_string()),
        };

        Self {
            id,
            received_at,
            level,
            timestamp,
            message,
        }
    }

    /// Full line as received.
    pub fn content(&self) -> String {
        match &self.timestamp {
            Some(ts) => format!("{} {}", ts, self.message),
            None => self.message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_detection_priority() {
        assert_eq!(LogLevel::detect("ERROR something"), Some(LogLevel::Error));
        assert_eq!(
            LogLevel::detect("INFO caught Exception while warning"),
            Some(LogLevel::Error)
        );
        assert_eq!(LogLevel::detect("WARNING disk"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::detect("[warn] x"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::detect("DEBUG | handler"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::detect("INFO | started"), Some(LogLevel::Info));
        assert_eq!(LogLevel::detect("job Success"), Some(LogLevel::Success));
        assert_eq!(LogLevel::detect("plain line"), None);
    }

    #[test]
    fn test_parse_splits_timestamp() {
        let line = LogLine::parse(
            "2024-06-10 12:00:01.123 | INFO | [hi] handled",
            Utc::now(),
        );
        assert_eq!(line.timestamp.as_deref(), Some("2024-06-10 12:00:01.123"));
        assert_eq!(line.message, "| INFO | [hi] handled");
        assert_eq!(line.level, Some(LogLevel::Info));
    }

    #[test]
    fn test_parse_accepts_comma_fraction() {
        let line = LogLine::parse("2024-06-10 12:00:01,5 boot", Utc::now());
        assert_eq!(line.timestamp.as_deref(), Some("2024-06-10 12:00:01,5"));
        assert_eq!(line.message, "boot");
    }

    #[test]
    fn test_parse_without_timestamp() {
        let line = LogLine::parse("no stamp here", Utc::now());
        assert_eq!(line.timestamp, None);
        assert_eq!(line.message, "no stamp here");
        assert_eq!(line.content(), "no stamp here");
    }

    #[test]
    fn test_ids_are_unique() {
        let now = Utc::now();
        let a = LogLine::parse("a", now);
        let b = LogLine::parse("a", now);
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with(&format!("log-{}-", now.timestamp_millis())));
    }
}
