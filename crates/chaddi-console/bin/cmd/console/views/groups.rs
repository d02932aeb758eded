use chaddi_console::format::format_day;
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

use crate::cmd::console::widgets::formatters::truncate_message;

/// Renders the paginated group list
pub(crate) fn render_groups_panel(
    messenger: &Messenger,
    area: Rect,
    frame: &mut Frame,
    table_state: &mut TableState,
    is_focused: bool,
) {
    let groups = messenger.groups();
    let loaded = groups.items().len();
    let position = table_state.selected().map_or(0, |i| (i + 1).min(loaded));
    let total = messenger
        .total_groups()
        .map(|t| t.to_string())
        .unwrap_or_else(|| loaded.to_string());

    let mut title = format!(" Groups [{}/{}] ", position, total);
    if groups.is_loading() {
        title.push_str("(loading...) ");
    }

    let border_set = if is_focused {
        border::THICK
    } else {
        border::PLAIN
    };
    let mut block = Block::bordered()
        .title(title)
        .border_set(border_set)
        .style(if is_focused {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        });
    if let Some(error) = groups.error() {
        let error_line = Line::from(format!(" {} ", error)).style(Style::default().fg(Color::Red));
        block = block.title_bottom(error_line);
    }

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    if loaded == 0 {
        let message = if groups.is_loading() {
            "Loading groups..."
        } else if groups.error().is_some() {
            "(cannot fetch groups)"
        } else {
            "No groups yet"
        };
        render_centered(frame, inner_area, message);
        return;
    }

    let header_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let header = Row::new(vec!["Name", "Updated", "ID"])
        .style(header_style)
        .height(1);

    let name_width = (inner_area.width.saturating_sub(26) as usize).max(12);
    let now = Utc::now();
    let selected_id = messenger.selected().map(|g| g.group_id.as_str());

    let rows: Vec<Row> = groups
        .items()
        .iter()
        .map(|group| {
            let is_open = selected_id == Some(group.group_id.as_str());
            let name = if is_open {
                format!("● {}", group.display_name())
            } else {
                group.display_name().to_string()
            };
            let row = Row::new(vec![
                Cell::from(truncate_message(&name, name_width)),
                Cell::from(format_day(group.updated.as_deref(), now)),
                Cell::from(group.group_id.clone()),
            ]);
            if is_open {
                row.style(Style::default().fg(Color::Cyan))
            } else {
                row
            }
        })
        .collect();

    let widths = [
        Constraint::Min(12),
        Constraint::Length(10),
        Constraint::Length(14),
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

/// Writes a dimmed message in the middle of `area`
pub(crate) fn render_centered(frame: &mut Frame, area: Rect, message: &str) {
    let message_width = message.chars().count() as u16;
    let x = area.x + (area.width.saturating_sub(message_width)) / 2;
    let y = area.y + area.height / 2;

    if x < area.x + area.width && y < area.y + area.height {
        frame
            .buffer_mut()
            .set_string(x, y, message, Style::default().fg(Color::DarkGray));
    }
}
