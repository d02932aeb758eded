use chaddi_console::format::{color_for_user, parse_timestamp};
use chaddi_console::{LiveActivity, LiveItem};
use chrono::Local;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Cell, HighlightSpacing, Paragraph, Row, Table, TableState},
    Frame,
};

use super::groups::render_centered;
use crate::cmd::console::widgets::formatters::{
    count_label, hex_color, level_style, status_style, truncate_message,
};

/// Renders the connection status line and the live feed
pub(crate) fn render_live_panel(
    live: &LiveActivity,
    area: Rect,
    frame: &mut Frame,
    table_state: &mut TableState,
) {
    let [status_area, feed_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(area);

    render_status_line(live, status_area, frame);

    let feed = live.feed();
    let block = Block::bordered()
        .title(format!(
            " Live Activity [{}/{}] ",
            feed.visible_count(),
            feed.max_size()
        ))
        .title(Line::from(format!(" filter: {} ", live.filter())).right_aligned())
        .border_set(border::THICK);
    let inner_area = block.inner(feed_area);
    frame.render_widget(block, feed_area);

    if feed.visible_count() == 0 {
        let message = if live.show_welcome() {
            "Waiting for messages and server logs..."
        } else if feed.is_empty() {
            "Nothing received yet"
        } else {
            "Nothing matches the current filter"
        };
        render_centered(frame, inner_area, message);
        return;
    }

    let header_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let header = Row::new(vec!["Time", "Source", "Content"])
        .style(header_style)
        .height(1);

    let content_width = (inner_area.width.saturating_sub(36) as usize).max(20);

    let rows: Vec<Row> = feed
        .visible()
        .map(|item| match item {
            LiveItem::Message(message) => {
                let author = message.author_name();
                let author_style = Style::default()
                    .fg(hex_color(color_for_user(author)))
                    .add_modifier(Modifier::BOLD);
                Row::new(vec![
                    Cell::from(short_time(message.time_sent.as_deref())),
                    Cell::from(truncate_message(author, 18)).style(author_style),
                    Cell::from(truncate_message(
                        &format!("[{}] {}", message.chat_title(), message.text_or_placeholder()),
                        content_width,
                    )),
                ])
            }
            LiveItem::Log(line) => {
                let time = match &line.timestamp {
                    Some(stamp) => clock_part(stamp),
                    None => line.received_at.format("%H:%M:%S").to_string(),
                };
                let source = line.level.map(|l| l.as_str()).unwrap_or("log");
                Row::new(vec![
                    Cell::from(time),
                    Cell::from(source),
                    Cell::from(truncate_message(&line.message, content_width)),
                ])
                .style(level_style(line.level))
            }
            LiveItem::StreamError {
                message,
                received_at,
            } => Row::new(vec![
                Cell::from(received_at.format("%H:%M:%S").to_string()),
                Cell::from("stream"),
                Cell::from(truncate_message(&format!("ERROR: {}", message), content_width)),
            ])
            .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Length(18),
        Constraint::Min(20),
    ];

    let selected_row_style = Style::default()
        .add_modifier(Modifier::REVERSED)
        .bg(Color::DarkGray);

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .row_highlight_style(selected_row_style)
        .highlight_symbol(Text::from(">"))
        .highlight_spacing(HighlightSpacing::Always);

    frame.render_stateful_widget(table, inner_area, table_state);
}

fn render_status_line(live: &LiveActivity, area: Rect, frame: &mut Frame) {
    let status = live.status();
    let mut spans: Vec<Span> = vec![
        " ● ".into(),
        Span::styled(status.to_string(), status_style(status)),
        "  ".into(),
        count_label(live.messages_received(), "message").into(),
        ", ".into(),
        count_label(live.feed().len() as u64, "item").into(),
        " in feed".into(),
    ];
    if live.dropped_while_paused() > 0 {
        spans.push(
            format!("  ({} dropped while paused)", live.dropped_while_paused()).dark_gray(),
        );
    }
    if !live.auto_scroll() {
        spans.push("  [follow off]".yellow());
    }
    if live.show_welcome() {
        spans.push("  Welcome! Live messages and server logs will appear below.".cyan());
    } else if let Some(notice) = live.stream_notice() {
        spans.push(format!("  {}", notice).green());
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Local `HH:MM:SS` of a message timestamp.
fn short_time(raw: Option<&str>) -> String {
    raw.and_then(parse_timestamp)
        .map(|ts| ts.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Log stamps are already in server time: `2024-01-05 14:30:00.123` -> `14:30:00`.
fn clock_part(stamp: &str) -> String {
    stamp
        .split_whitespace()
        .nth(1)
        .and_then(|t| t.split('.').next())
        .unwrap_or(stamp)
        .to_string()
}
