use ratatui::{
    layout::Rect,
    style::Stylize,
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::cmd::console::state::{Focus, Tab};

/// Renders the bottom controls bar showing context-aware keybindings
pub(crate) fn render_bottom_bar(
    frame: &mut Frame,
    area: Rect,
    tab: Tab,
    focus: Focus,
    paused: bool,
) {
    let mut spans: Vec<Span> = vec![
        " Quit ".into(),
        "<q> ".blue().bold(),
        " | Tabs ".into(),
        "<tab/1-3> ".blue().bold(),
    ];

    match (tab, focus) {
        (_, Focus::Inspect) => {
            spans.extend([
                " | Navigate ".into(),
                "<↑↓/jk> ".blue().bold(),
                " | Close ".into(),
                "<i/esc/h> ".blue().bold(),
            ]);
        }
        (Tab::Dashboard, _) => {
            spans.extend([" | Refresh ".into(), "<r> ".blue().bold()]);
        }
        (Tab::Groups, Focus::Messages) => {
            spans.extend([
                " | Navigate ".into(),
                "<←↑↓/hjk> ".blue().bold(),
                " | Older ".into(),
                "<↑ at top> ".blue().bold(),
                " | Inspect ".into(),
                "<i> ".blue().bold(),
            ]);
        }
        (Tab::Groups, _) => {
            spans.extend([
                " | Navigate ".into(),
                "<↑↓→/jkl> ".blue().bold(),
                " | Open ".into(),
                "<enter> ".blue().bold(),
                " | Reload ".into(),
                "<r> ".blue().bold(),
            ]);
        }
        (Tab::Live, _) => {
            let pause_label = if paused { " | Resume " } else { " | Pause " };
            spans.extend([
                " | Navigate ".into(),
                "<↑↓/jk> ".blue().bold(),
                pause_label.into(),
                "<p> ".blue().bold(),
                " | Clear ".into(),
                "<c> ".blue().bold(),
                " | Filter ".into(),
                "<f> ".blue().bold(),
                " | Follow ".into(),
                "<a> ".blue().bold(),
                " | Inspect ".into(),
                "<i> ".blue().bold(),
            ]);
        }
    }

    let block = Block::bordered()
        .title(" Controls ")
        .border_set(border::PLAIN);

    let paragraph = Paragraph::new(Line::from(spans)).block(block).left_aligned();

    frame.render_widget(paragraph, area);
}
