use chaddi_console::format::{
    format_date, format_number, format_relative, format_short_date_time, short_commit,
};
use chaddi_console::models::{Activity, Health, Metrics, Quote, VersionInfo};
use chaddi_console::{Dashboard, Widget};
use chrono::Utc;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Paragraph, Wrap},
    Frame,
};

/// Renders the metrics, activity, server and quote cards
pub(crate) fn render_dashboard_panel(dashboard: &Dashboard, area: Rect, frame: &mut Frame) {
    let quote = dashboard.visible_quote();
    let [top, bottom] = if quote.is_some() {
        Layout::vertical([Constraint::Percentage(70), Constraint::Percentage(30)]).areas(area)
    } else {
        [area, Rect::default()]
    };

    let [metrics_area, right] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(top);
    let [activity_area, server_area] =
        Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(right);

    let metrics = card_lines(&dashboard.metrics, metrics_lines);
    render_card(frame, metrics_area, " Metrics ", metrics);
    let activity = card_lines(&dashboard.activity, activity_lines);
    render_card(frame, activity_area, " Activity ", activity);

    let mut server = card_lines(&dashboard.health, health_lines);
    server.push(Line::from(""));
    server.extend(card_lines(&dashboard.version, version_lines));
    render_card(frame, server_area, " Server ", server);

    if let Some(quote) = quote {
        render_card(frame, bottom, " Random Quote ", quote_lines(quote));
    }
}

fn render_card(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line>) {
    let block = Block::bordered()
        .title(title)
        .border_set(border::PLAIN);
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn card_lines<T>(widget: &Widget<T>, ready: fn(&T) -> Vec<Line<'static>>) -> Vec<Line<'static>> {
    match widget {
        Widget::Loading => vec![Line::from("Loading...").dark_gray()],
        Widget::Failed(error) => vec![
            Line::from("Failed to load").red().bold(),
            Line::from(error.clone()).red(),
        ],
        Widget::Ready(value) => ready(value),
    }
}

fn field(label: &str, value: String) -> Line<'static> {
    let label_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    Line::from(vec![
        Span::styled(format!("{:<18}", label), label_style),
        Span::raw(value),
    ])
}

fn metrics_lines(metrics: &Metrics) -> Vec<Line<'static>> {
    vec![
        field("Bakchods", format_number(metrics.bakchods_count)),
        field("Groups", format_number(metrics.groups_count)),
        field("Messages", format_number(metrics.messages_count)),
        field("Quotes", format_number(metrics.quotes_count)),
        field("Rolls", format_number(metrics.roll_count)),
        field("Jobs", format_number(metrics.jobs_count)),
        field("Active bakchods", format_number(metrics.recent_bakchods)),
        field("Recent messages", format_number(metrics.recent_messages)),
    ]
}

fn activity_lines(activity: &Activity) -> Vec<Line<'static>> {
    let bakchod = activity
        .most_active_bakchod
        .as_ref()
        .map(|b| b.display_name().to_string())
        .unwrap_or_else(|| "-".to_string());
    let group = activity
        .most_active_group
        .as_ref()
        .map(|g| g.display_name().to_string())
        .unwrap_or_else(|| "-".to_string());
    let latest = match activity.latest_message_time.as_deref() {
        Some(raw) => format_relative(Some(raw), Utc::now()),
        None => "-".to_string(),
    };
    vec![
        field("Top bakchod", bakchod),
        field("Top group", group),
        field("Last message", latest),
    ]
}

fn health_lines(health: &Health) -> Vec<Line<'static>> {
    let healthy = health.health.eq_ignore_ascii_case("ok");
    let status = if healthy {
        Span::raw(health.health.clone()).green().bold()
    } else {
        Span::raw(health.health.clone()).red().bold()
    };
    vec![Line::from(vec![
        Span::styled(
            format!("{:<18}", "Health"),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        status,
    ])]
}

fn version_lines(version: &VersionInfo) -> Vec<Line<'static>> {
    let or_dash = |value: String| if value.is_empty() { "-".to_string() } else { value };
    let mut lines = vec![
        field("Version", or_dash(version.semver.clone().unwrap_or_default())),
        field(
            "Commit",
            or_dash(
                version
                    .git_commit_id
                    .as_deref()
                    .map(short_commit)
                    .unwrap_or_default(),
            ),
        ),
        field(
            "Committed",
            or_dash(format_short_date_time(version.git_commit_time.as_deref())),
        ),
        field(
            "Started",
            or_dash(format_short_date_time(version.time_service_started.as_deref())),
        ),
        field("Uptime", or_dash(version.pretty_uptime.clone().unwrap_or_default())),
    ];
    if let Some(message) = version.git_commit_message.as_deref() {
        lines.push(Line::from(message.trim().to_string()).italic().dark_gray());
    }
    lines
}

fn quote_lines(quote: &Quote) -> Vec<Line<'static>> {
    let text = quote.text.clone().unwrap_or_default();
    let mut attribution = format!("- {}", quote.author_name());
    let group = quote.group_name();
    if !group.is_empty() {
        attribution.push_str(&format!(", in {}", group));
    }
    let created = format_date(quote.created.as_deref());
    if !created.is_empty() {
        attribution.push_str(&format!(" ({})", created));
    }
    vec![
        Line::from(format!("\"{}\"", text)).italic(),
        Line::from(""),
        Line::from(attribution).right_aligned().cyan(),
    ]
}
