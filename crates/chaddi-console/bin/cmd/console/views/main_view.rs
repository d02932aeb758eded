use std::time::Duration;

use chaddi_console::{Dashboard, LiveActivity, Messenger};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::Line,
    widgets::{Block, Paragraph, TableState, Tabs},
    Frame,
};

use crate::cmd::console::state::{Focus, Inspected, Tab};

use super::dashboard::render_dashboard_panel;
use super::groups::render_groups_panel;
use super::inspect::render_inspect_popup;
use super::live::render_live_panel;
use super::messages::render_messages_panel;

/// Everything the main area needs for one frame, borrowed from the app.
pub(crate) struct ViewState<'a> {
    pub(crate) tab: Tab,
    pub(crate) focus: Focus,
    pub(crate) base_url: &'a str,
    pub(crate) dashboard: &'a Dashboard,
    pub(crate) messenger: &'a Messenger,
    pub(crate) live: &'a LiveActivity,
    pub(crate) groups_state: &'a mut TableState,
    pub(crate) messages_state: &'a mut TableState,
    pub(crate) live_state: &'a mut TableState,
    pub(crate) inspected: Option<&'a Inspected>,
    pub(crate) notice: Option<&'a str>,
    pub(crate) last_render_duration: Duration,
}

/// Renders the tab strip, the active tab's panels and the inspect popup
pub(crate) fn render_main_view(frame: &mut Frame, area: Rect, view: &mut ViewState) {
    let outer = Block::bordered()
        .title(Line::from(" Chaddi Console ".bold()).centered())
        .title_bottom(Line::from(format!(" {} ", view.base_url)).right_aligned())
        .border_set(border::THICK);
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let [tabs_area, notice_area, content_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(inner);

    let titles = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| format!(" {} {} ", i + 1, tab.title()));
    let tabs = Tabs::new(titles)
        .select(view.tab.index())
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        )
        .divider("|");
    frame.render_widget(tabs, tabs_area);

    render_notice_line(frame, notice_area, view);

    match view.tab {
        Tab::Dashboard => render_dashboard_panel(view.dashboard, content_area, frame),
        Tab::Groups => {
            let [groups_area, messages_area] = Layout::horizontal([
                Constraint::Percentage(35),
                Constraint::Percentage(65),
            ])
            .areas(content_area);
            let messages_focused = matches!(view.focus, Focus::Messages | Focus::Inspect);
            render_groups_panel(
                view.messenger,
                groups_area,
                frame,
                view.groups_state,
                !messages_focused,
            );
            render_messages_panel(
                view.messenger,
                messages_area,
                frame,
                view.messages_state,
                messages_focused,
            );
        }
        Tab::Live => render_live_panel(view.live, content_area, frame, view.live_state),
    }

    if view.focus == Focus::Inspect {
        if let Some(inspected) = view.inspected {
            render_inspect_popup(inspected, area, frame);
        }
    }
}

fn render_notice_line(frame: &mut Frame, area: Rect, view: &ViewState) {
    let mut spans = Vec::new();
    if let Some(notice) = view.notice {
        spans.push(format!(" {} ", notice).red().bold());
    } else if let Some(target) = view.messenger.pending_deep_link() {
        spans.push(format!(" Looking for group {}... ", target).yellow());
    }

    #[cfg(feature = "dev")]
    spans.push(format!(" render {:?} ", view.last_render_duration).dark_gray());
    #[cfg(not(feature = "dev"))]
    let _ = view.last_render_duration;

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
