//! One-shot rendering of dashboard data and message history.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use prettytable::{Cell, Row, Table};
use serde::Serialize;

use crate::dashboard::{Dashboard, Widget};
use crate::error::Result;
use crate::format::{
    color_for_user, escape_html, format_date, format_date_time, format_number, format_relative,
    format_short_date_time, initials, short_commit,
};
use crate::models::{Activity, Health, Message, Metrics, Quote, VersionInfo};

/// Output format for reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Table,
    Json,
    JsonPretty,
    Html,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Table => "table",
            Format::Json => "json",
            Format::JsonPretty => "json-pretty",
            Format::Html => "html",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(Format::Table),
            "json" => Ok(Format::Json),
            "json-pretty" | "json_pretty" => Ok(Format::JsonPretty),
            "html" => Ok(Format::Html),
            other => Err(format!(
                "unknown format '{}', expected table, json, json-pretty or html",
                other
            )),
        }
    }
}

/// Snapshot of a loaded [`Dashboard`]; failed cards are listed under `errors`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardReport {
    pub metrics: Option<Metrics>,
    pub activity: Option<Activity>,
    pub quote: Option<Quote>,
    pub version: Option<VersionInfo>,
    pub health: Option<Health>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<&'static str, String>,
}

impl DashboardReport {
    pub fn from_dashboard(dashboard: &Dashboard) -> Self {
        let mut errors = BTreeMap::new();
        fn take<T: Clone>(
            name: &'static str,
            widget: &Widget<T>,
            errors: &mut BTreeMap<&'static str, String>,
        ) -> Option<T> {
            if let Some(message) = widget.error() {
                errors.insert(name, message.to_string());
            }
            widget.ready().cloned()
        }

        Self {
            metrics: take("metrics", &dashboard.metrics, &mut errors),
            activity: take("activity", &dashboard.activity, &mut errors),
            quote: dashboard.visible_quote().cloned(),
            version: take("version", &dashboard.version, &mut errors),
            health: take("health", &dashboard.health, &mut errors),
            errors,
        }
    }
}

fn json<T: Serialize + ?Sized>(value: &T, format: Format) -> Result<String> {
    Ok(match format {
        Format::JsonPretty => serde_json::to_string_pretty(value)?,
        _ => serde_json::to_string(value)?,
    })
}

fn two_column(rows: &[(&str, String)]) -> Table {
    let mut table = Table::new();
    table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Value")]));
    for (label, value) in rows {
        table.add_row(Row::new(vec![Cell::new(label), Cell::new(value)]));
    }
    table
}

fn dashboard_rows(report: &DashboardReport) -> Vec<(&'static str, String)> {
    let mut rows = Vec::new();
    if let Some(m) = &report.metrics {
        rows.push(("Bakchods", format_number(m.bakchods_count)));
        rows.push(("Groups", format_number(m.groups_count)));
        rows.push(("Messages", format_number(m.messages_count)));
        rows.push(("Quotes", format_number(m.quotes_count)));
        rows.push(("Rolls", format_number(m.roll_count)));
        rows.push(("Jobs", format_number(m.jobs_count)));
        rows.push(("Active users (24h)", format_number(m.recent_bakchods)));
        rows.push(("Messages (24h)", format_number(m.recent_messages)));
    }
    if let Some(a) = &report.activity {
        if let Some(bakchod) = &a.most_active_bakchod {
            rows.push(("Most active user", bakchod.display_name().to_string()));
        }
        if let Some(group) = &a.most_active_group {
            rows.push(("Most active group", group.display_name().to_string()));
        }
        if a.latest_message_time.is_some() {
            rows.push((
                "Latest message",
                format_short_date_time(a.latest_message_time.as_deref()),
            ));
        }
    }
    if let Some(v) = &report.version {
        rows.push(("Version", v.semver.clone().unwrap_or_default()));
        rows.push((
            "Commit",
            short_commit(v.git_commit_id.as_deref().unwrap_or_default()),
        ));
        rows.push(("Commit time", v.git_commit_time.clone().unwrap_or_default()));
        rows.push(("Uptime", v.pretty_uptime.clone().unwrap_or_default()));
    }
    if let Some(h) = &report.health {
        rows.push(("Health", h.health.clone()));
    }
    for (card, error) in &report.errors {
        rows.push((*card, format!("failed: {}", error)));
    }
    rows
}

pub fn render_dashboard(report: &DashboardReport, format: Format) -> Result<String> {
    match format {
        Format::Table => {
            let mut out = two_column(&dashboard_rows(report)).to_string();
            if let Some(quote) = &report.quote {
                let _ = write!(
                    out,
                    "\n\"{}\"\n  - {} in {}, {}\n",
                    quote.text.as_deref().unwrap_or_default(),
                    quote.author_name(),
                    quote.group_name(),
                    format_date(quote.created.as_deref())
                );
            }
            Ok(out)
        }
        Format::Json | Format::JsonPretty => json(report, format),
        Format::Html => {
            let mut out = String::from("<dl class=\"dashboard\">\n");
            for (label, value) in dashboard_rows(report) {
                let _ = writeln!(
                    out,
                    "  <dt>{}</dt><dd>{}</dd>",
                    escape_html(label),
                    escape_html(&value)
                );
            }
            out.push_str("</dl>\n");
            if let Some(quote) = &report.quote {
                let _ = writeln!(
                    out,
                    "<blockquote class=\"quote\"><p>{}</p><footer>{} &middot; {}</footer></blockquote>",
                    escape_html(quote.text.as_deref().unwrap_or_default()),
                    escape_html(quote.author_name()),
                    escape_html(quote.group_name())
                );
            }
            Ok(out)
        }
    }
}

/// Renders messages in the order given (callers pass them oldest first).
pub fn render_messages(messages: &[Message], format: Format, now: DateTime<Utc>) -> Result<String> {
    match format {
        Format::Table => {
            let mut table = Table::new();
            table.add_row(Row::new(vec![
                Cell::new("ID"),
                Cell::new("Sent"),
                Cell::new("From"),
                Cell::new("Text"),
            ]));
            for message in messages {
                table.add_row(Row::new(vec![
                    Cell::new(&message.message_id),
                    Cell::new(&format_date_time(message.time_sent.as_deref())),
                    Cell::new(message.author_name()),
                    Cell::new(message.text_or_placeholder()),
                ]));
            }
            Ok(table.to_string())
        }
        Format::Json | Format::JsonPretty => json(messages, format),
        Format::Html => {
            let mut out = String::new();
            for message in messages {
                message_card(&mut out, message, now);
            }
            Ok(out)
        }
    }
}

fn message_card(out: &mut String, message: &Message, now: DateTime<Utc>) {
    let author = message.author_name();
    let color = color_for_user(author);
    let sent = message.time_sent.as_deref().unwrap_or_default();
    let _ = write!(
        out,
        concat!(
            "<div class=\"message-card\">\n",
            "  <div class=\"message-avatar\" style=\"background-color: {color}\">{initials}</div>\n",
            "  <div class=\"message-content\">\n",
            "    <div class=\"message-header\">\n",
            "      <span class=\"message-user-name\" style=\"color: {color}\">{author}</span>\n",
            "      <span class=\"message-chat-badge\">{chat}</span>\n",
            "      <span class=\"message-timestamp\" title=\"{sent}\">{relative}</span>\n",
            "    </div>\n",
            "    <div class=\"message-text\">{text}</div>\n",
            "    <div class=\"message-footer\"><span class=\"message-id\">#{id}</span></div>\n",
            "  </div>\n",
            "</div>\n"
        ),
        color = color,
        initials = escape_html(&initials(author)),
        author = escape_html(author),
        chat = escape_html(message.chat_title()),
        sent = escape_html(sent).replace('"', "&quot;"),
        relative = format_relative(message.time_sent.as_deref(), now),
        text = escape_html(message.text.as_deref().unwrap_or_default()),
        id = escape_html(&message.message_id),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(value: serde_json::Value) -> Message {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("table".parse::<Format>(), Ok(Format::Table));
        assert_eq!("JSON".parse::<Format>(), Ok(Format::Json));
        assert_eq!("json-pretty".parse::<Format>(), Ok(Format::JsonPretty));
        assert_eq!("html".parse::<Format>(), Ok(Format::Html));
        assert!("yaml".parse::<Format>().is_err());
    }

    #[test]
    fn test_html_escapes_user_strings() {
        let messages = vec![message(json!({
            "message_id": 1,
            "from_bakchod": { "pretty_name": "<b>Tom</b> & Co" },
            "text": "<script>alert(1)</script>",
            "update": { "message": { "chat": { "title": "a < b" } } }
        }))];
        let html = render_messages(&messages, Format::Html, Utc::now()).unwrap();
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("&lt;b&gt;Tom&lt;/b&gt; &amp; Co"));
        assert!(html.contains("a &lt; b"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("#1"));
    }

    #[test]
    fn test_messages_table_and_json() {
        let messages = vec![
            message(json!({ "message_id": 1, "text": "first" })),
            message(json!({ "message_id": 2 })),
        ];
        let table = render_messages(&messages, Format::Table, Utc::now()).unwrap();
        assert!(table.contains("first"));
        assert!(table.contains("(No text)"));
        assert!(table.find("first") < table.find("(No text)"));

        let out = render_messages(&messages, Format::Json, Utc::now()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[1]["message_id"], "2");
    }

    #[test]
    fn test_dashboard_report_collects_errors() {
        let mut dashboard = Dashboard::new();
        dashboard.metrics = Widget::Ready(Metrics {
            messages_count: Some(1234567),
            ..Metrics::default()
        });
        dashboard.activity = Widget::Failed("timeout".into());
        dashboard.quote = Widget::Ready(None);

        let report = DashboardReport::from_dashboard(&dashboard);
        assert_eq!(report.errors.get("activity").map(String::as_str), Some("timeout"));
        assert!(report.quote.is_none());

        let table = render_dashboard(&report, Format::Table).unwrap();
        assert!(table.contains("1,234,567"));
        assert!(table.contains("failed: timeout"));

        let out = render_dashboard(&report, Format::JsonPretty).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["metrics"]["messages_count"], 1234567);
        assert_eq!(parsed["errors"]["activity"], "timeout");
    }
}
