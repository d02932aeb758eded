use chaddi_console::format::{color_for_user, format_relative};
use chaddi_console::Messenger;
use chrono::Utc;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Text},
    widgets::{Block, Cell, HighlightSpacing, Row, Table, TableState},
    Frame,
};

use super::groups::render_centered;
use crate::cmd::console::widgets::formatters::{hex_color, truncate_message};

/// Renders the open conversation, oldest message first
pub(crate) fn render_messages_panel(
    messenger: &Messenger,
    area: Rect,
    frame: &mut Frame,
    table_state: &mut TableState,
    is_focused: bool,
) {
    let border_set = if is_focused {
        border::THICK
    } else {
        border::PLAIN
    };

    let Some(group) = messenger.selected() else {
        let block = Block::bordered()
            .title(" Messages ")
            .border_set(border_set);
        let inner_area = block.inner(area);
        frame.render_widget(block, area);
        render_centered(frame, inner_area, "Select a group to see its messages");
        return;
    };

    let conversation = messenger.conversation();
    let messages = messenger.messages();
    let cursor = conversation.cursor();

    let mut title = format!(" {} ", group.display_name());
    if conversation.is_loading() {
        title.push_str("(loading...) ");
    } else if cursor.has_more && !messages.is_empty() {
        title.push_str("(↑ for older) ");
    }

    let mut block = Block::bordered()
        .title(title)
        .title(
            Line::from(format!(
                " {} loaded, page {}/{} ",
                messages.len(),
                conversation.loaded_pages(),
                cursor.total_pages
            ))
            .right_aligned(),
        )
        .border_set(border_set)
        .style(if is_focused {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        });
    if let Some(error) = conversation.error() {
        let error_line = Line::from(format!(" {} ", error)).style(Style::default().fg(Color::Red));
        block = block.title_bottom(error_line);
    }

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    if messages.is_empty() {
        let message = if conversation.is_loading() {
            "Loading messages..."
        } else if conversation.error().is_some() {
            "(cannot fetch messages)"
        } else {
            "No messages in this group"
        };
        render_centered(frame, inner_area, message);
        return;
    }

    let header_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let header = Row::new(vec!["Sent", "From", "Message"])
        .style(header_style)
        .height(1);

    let text_width = (inner_area.width.saturating_sub(34) as usize).max(20);
    let now = Utc::now();

    let rows: Vec<Row> = messages
        .iter()
        .map(|message| {
            let author = message.author_name();
            let author_style = if is_focused {
                Style::default()
                    .fg(hex_color(color_for_user(author)))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(format_relative(message.time_sent.as_deref(), now)),
                Cell::from(truncate_message(author, 16)).style(author_style),
                Cell::from(truncate_message(message.text_or_placeholder(), text_width)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(14),
        Constraint::Length(16),
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
