use chaddi_console::format::NEUTRAL_COLOR;
use chaddi_console::{ConnectionStatus, LogLevel};
use ratatui::style::{Color, Modifier, Style};

/// Cuts `msg` to at most `max_len` characters, marking the cut with "...".
pub(crate) fn truncate_message(msg: &str, max_len: usize) -> String {
    let single_line = msg.replace(['\n', '\r'], " ");
    if single_line.chars().count() <= max_len {
        single_line
    } else {
        let kept: String = single_line
            .chars()
            .take(max_len.saturating_sub(3))
            .collect();
        format!("{}...", kept)
    }
}

/// `#rrggbb` to a terminal color; anything else maps to the neutral gray.
pub(crate) fn hex_color(hex: &str) -> Color {
    parse_hex(hex)
        .or_else(|| parse_hex(NEUTRAL_COLOR))
        .unwrap_or(Color::Gray)
}

fn parse_hex(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(digits.get(range)?, 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

pub(crate) fn level_style(level: Option<LogLevel>) -> Style {
    match level {
        Some(LogLevel::Error) => Style::default().fg(Color::Red),
        Some(LogLevel::Warning) => Style::default().fg(Color::Yellow),
        Some(LogLevel::Debug) => Style::default().fg(Color::DarkGray),
        Some(LogLevel::Info) => Style::default().fg(Color::Cyan),
        Some(LogLevel::Success) => Style::default().fg(Color::Green),
        None => Style::default(),
    }
}

pub(crate) fn status_style(status: &ConnectionStatus) -> Style {
    let color = match status {
        ConnectionStatus::Connecting => Color::Yellow,
        ConnectionStatus::Connected => Color::Green,
        ConnectionStatus::Disconnected | ConnectionStatus::Error(_) => Color::Red,
        ConnectionStatus::Paused => Color::Blue,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Pluralized counter, e.g. "1 message" / "3 messages".
pub(crate) fn count_label(count: u64, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
