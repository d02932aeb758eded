use ratatui::{
    layout::Rect,
    symbols::border,
    text::Line,
    widgets::{Block, Clear, Paragraph, Wrap},
    Frame,
};

use crate::cmd::console::state::Inspected;

/// Renders a centered popup with the full text of the inspected item
pub(crate) fn render_inspect_popup(inspected: &Inspected, area: Rect, frame: &mut Frame) {
    let popup_width = (area.width as f32 * 0.8) as u16;
    let popup_height = (area.height as f32 * 0.8) as u16;
    let x = (area.width.saturating_sub(popup_width)) / 2;
    let y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, popup_area);

    let block = Block::bordered()
        .title(inspected.title.as_str())
        .border_set(border::DOUBLE);

    let inner_area = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let max_width = (inner_area.width.saturating_sub(2) as usize).max(1);
    let text_lines: Vec<Line> = inspected
        .body
        .lines()
        .flat_map(|line| wrap_chars(line, max_width))
        .collect();

    let paragraph = Paragraph::new(text_lines).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, inner_area);
}

fn wrap_chars(line: &str, max_width: usize) -> Vec<Line<'_>> {
    if line.chars().count() <= max_width {
        return vec![Line::from(line)];
    }
    let mut wrapped = Vec::new();
    let mut remaining = line;
    while !remaining.is_empty() {
        let split_at = remaining
            .char_indices()
            .nth(max_width)
            .map(|(i, _)| i)
            .unwrap_or(remaining.len());
        wrapped.push(Line::from(&remaining[..split_at]));
        remaining = &remaining[split_at..];
    }
    wrapped
}
