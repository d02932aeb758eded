use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chaddi_console::{
    BoundedFeed, ConsoleApi, Dashboard, DeepLink, Emit, FeedItem, FetchRequest, FetchResponse,
    FetchWorker, HttpApi, LiveActivity, LiveItem, Messenger, MessengerUpdate, PushClient,
    PushEvent, Settings,
};
use chrono::Utc;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use eyre::Result;
use ratatui::{
    layout::{Constraint, Layout},
    widgets::TableState,
    DefaultTerminal, Frame,
};
use tracing::{info, warn};

use super::state::{Focus, Inspected, Tab};
use super::views::bottom_bar::render_bottom_bar;
use super::views::main_view::{render_main_view, ViewState};

#[derive(Debug, Parser)]
pub struct ConsoleArgs {
    /// Open this group as soon as it shows up in the group list
    #[arg(long, allow_hyphen_values = true)]
    pub group_id: Option<String>,

    /// Number of background fetch threads
    #[arg(long, default_value_t = 4)]
    pub workers: usize,
}

impl Default for ConsoleArgs {
    fn default() -> Self {
        Self {
            group_id: None,
            workers: 4,
        }
    }
}

pub(crate) struct App {
    settings: Settings,
    tab: Tab,
    focus: Focus,
    exit: bool,
    dashboard: Dashboard,
    messenger: Messenger,
    live: LiveActivity,
    worker: FetchWorker,
    push: PushClient,
    groups_state: TableState,
    messages_state: TableState,
    live_state: TableState,
    inspected: Option<Inspected>,
    notice: Option<String>,
    last_render_duration: Duration,
}

impl ConsoleArgs {
    pub fn run(&self, settings: &Settings) -> Result<()> {
        let api: Arc<dyn ConsoleApi> =
            Arc::new(HttpApi::new(&settings.base_url, settings.timeout));
        let worker = FetchWorker::spawn(api, self.workers)?;
        let push = PushClient::connect(settings.push_config())?;
        info!(base_url = %settings.base_url, "console starting");

        let deep_link = DeepLink::new(self.group_id.clone());
        let tab = if deep_link.pending().is_some() {
            Tab::Groups
        } else {
            Tab::Dashboard
        };

        let mut app = App {
            settings: settings.clone(),
            tab,
            focus: Focus::Groups,
            exit: false,
            dashboard: Dashboard::new(),
            messenger: Messenger::new(settings.feed_limit, deep_link),
            live: LiveActivity::new(settings.feed_limit),
            worker,
            push,
            groups_state: TableState::default(),
            messages_state: TableState::default(),
            live_state: TableState::default(),
            inspected: None,
            notice: None,
            last_render_duration: Duration::from_millis(0),
        };
        app.start();

        let mut terminal = ratatui::init();
        let app_result = app.run(&mut terminal);
        ratatui::restore();
        app.shutdown();
        app_result.map_err(|e| eyre::eyre!("TUI error: {}", e))
    }
}

impl App {
    fn start(&mut self) {
        let requests = self.dashboard.refresh();
        self.submit_all(requests);
        if let Some(request) = self.messenger.load_groups() {
            self.submit(request);
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        while !self.exit {
            self.drain_responses();
            self.drain_push();

            let render_start = Instant::now();
            terminal.draw(|frame| self.draw(frame))?;
            self.last_render_duration = render_start.elapsed();

            self.handle_events()?;
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        let emits = self.live.shutdown();
        self.emit_all(emits);
        self.push.disconnect();
        info!("console stopped");
    }

    fn submit(&mut self, request: FetchRequest) {
        if let Err(e) = self.worker.submit(request) {
            self.notice = Some(format!("Fetch worker unavailable: {}", e));
        }
    }

    fn submit_all(&mut self, requests: impl IntoIterator<Item = FetchRequest>) {
        for request in requests {
            self.submit(request);
        }
    }

    fn emit_all(&mut self, emits: Vec<Emit>) {
        for emit in emits {
            if let Err(e) = self.push.emit(emit) {
                warn!(error = %e, "push client gone");
            }
        }
    }

    fn drain_responses(&mut self) {
        for response in self.worker.drain() {
            match response {
                FetchResponse::Groups { .. } | FetchResponse::Messages { .. } => {
                    let update = self.messenger.apply(response);
                    self.on_messenger_update(update);
                }
                other => {
                    self.dashboard.apply(other);
                }
            }
        }
    }

    fn on_messenger_update(&mut self, update: MessengerUpdate) {
        if self.groups_state.selected().is_none() && !self.messenger.groups().items().is_empty()
        {
            self.groups_state.select(Some(0));
        }

        if update.selected_changed {
            self.sync_group_cursor();
            self.focus = Focus::Messages;
        }

        if update.prepended > 0 {
            // keep the same message under the cursor
            let anchored = self.messages_state.selected().unwrap_or(0) + update.prepended;
            self.messages_state.select(Some(anchored));
        }

        if update.scroll_to_latest {
            let count = self.messenger.messages().len();
            self.messages_state.select(count.checked_sub(1));
        }

        if let Some(missed) = update.missed_deep_link {
            self.notice = Some(format!("Group {} not found", missed));
        }

        self.submit_all(update.follow_ups);
    }

    fn sync_group_cursor(&mut self) {
        let Some(selected) = self.messenger.selected() else {
            return;
        };
        let index = self
            .messenger
            .groups()
            .items()
            .iter()
            .position(|g| g.group_id == selected.group_id);
        if index.is_some() {
            self.groups_state.select(index);
        }
    }

    fn drain_push(&mut self) {
        let now = Utc::now();
        for event in self.push.drain() {
            if let PushEvent::Message(message) = &event {
                let follow = self.follows_latest_message();
                let anchor = selected_item(self.messenger.messages(), &self.messages_state);
                if self.messenger.on_live_message(message) {
                    if follow {
                        let count = self.messenger.messages().len();
                        self.messages_state.select(count.checked_sub(1));
                    } else {
                        reanchor(self.messenger.messages(), &mut self.messages_state, anchor);
                    }
                }
            }

            let anchor = selected_item(self.live.feed(), &self.live_state);
            let emits = self.live.on_event(event, now);
            self.emit_all(emits);

            if self.live.auto_scroll() {
                let visible = self.live.feed().visible_count();
                self.live_state.select(visible.checked_sub(1));
            } else {
                reanchor(self.live.feed(), &mut self.live_state, anchor);
            }
        }
    }

    fn follows_latest_message(&self) -> bool {
        let count = self.messenger.messages().len();
        match self.messages_state.selected() {
            Some(i) => i + 1 >= count,
            None => true,
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let [main_area, bottom_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(frame.area());

        let mut view = ViewState {
            tab: self.tab,
            focus: self.focus,
            base_url: &self.settings.base_url,
            dashboard: &self.dashboard,
            messenger: &self.messenger,
            live: &self.live,
            groups_state: &mut self.groups_state,
            messages_state: &mut self.messages_state,
            live_state: &mut self.live_state,
            inspected: self.inspected.as_ref(),
            notice: self.notice.as_deref(),
            last_render_duration: self.last_render_duration,
        };
        render_main_view(frame, main_area, &mut view);
        render_bottom_bar(frame, bottom_area, self.tab, self.focus, self.live.is_paused());
    }

    fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press {
                    self.handle_key_event(key_event);
                }
            }
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.exit = true,
            KeyCode::Esc => self.close_inspect(),
            KeyCode::Tab => self.switch_tab(self.tab.next()),
            KeyCode::BackTab => self.switch_tab(self.tab.previous()),
            KeyCode::Char('1') => self.switch_tab(Tab::Dashboard),
            KeyCode::Char('2') => self.switch_tab(Tab::Groups),
            KeyCode::Char('3') => self.switch_tab(Tab::Live),
            KeyCode::Char('r') | KeyCode::Char('R') => self.refresh(),
            KeyCode::Char('i') | KeyCode::Char('I') => self.toggle_inspect(),
            KeyCode::Up | KeyCode::Char('k') => self.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Left | KeyCode::Char('h') => {
                if self.focus == Focus::Inspect {
                    self.close_inspect();
                } else if self.tab == Tab::Groups {
                    self.focus = Focus::Groups;
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if self.tab == Tab::Groups && self.messenger.selected().is_some() {
                    self.focus = Focus::Messages;
                }
            }
            KeyCode::Enter => {
                if self.tab == Tab::Groups && self.focus == Focus::Groups {
                    self.open_selected_group();
                }
            }
            KeyCode::Char('p') | KeyCode::Char('P') if self.tab == Tab::Live => {
                let emits = self.live.toggle_pause();
                self.emit_all(emits);
            }
            KeyCode::Char('c') | KeyCode::Char('C') if self.tab == Tab::Live => {
                self.live.clear();
                self.live_state.select(None);
            }
            KeyCode::Char('f') | KeyCode::Char('F') if self.tab == Tab::Live => {
                self.live.cycle_filter();
                let visible = self.live.feed().visible_count();
                self.live_state.select(visible.checked_sub(1));
            }
            KeyCode::Char('a') | KeyCode::Char('A') if self.tab == Tab::Live => {
                self.live.toggle_auto_scroll();
            }
            _ => {}
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.inspected = None;
        self.tab = tab;
        self.focus = match tab {
            Tab::Dashboard | Tab::Groups => {
                if self.messenger.selected().is_some() && tab == Tab::Groups {
                    Focus::Messages
                } else {
                    Focus::Groups
                }
            }
            Tab::Live => Focus::Live,
        };
    }

    fn refresh(&mut self) {
        self.notice = None;
        match self.tab {
            Tab::Dashboard => {
                let requests = self.dashboard.refresh();
                self.submit_all(requests);
            }
            Tab::Groups => {
                if let Some(request) = self.messenger.reload_groups() {
                    self.groups_state.select(None);
                    self.submit(request);
                }
            }
            Tab::Live => {}
        }
    }

    fn open_selected_group(&mut self) {
        let Some(index) = self.groups_state.selected() else {
            return;
        };
        let Some(group_id) = self
            .messenger
            .groups()
            .items()
            .get(index)
            .map(|g| g.group_id.clone())
        else {
            return;
        };
        self.messages_state.select(None);
        if let Some(request) = self.messenger.select_group(&group_id) {
            self.submit(request);
        }
        self.focus = Focus::Messages;
    }

    fn select_previous(&mut self) {
        match self.focus {
            Focus::Groups => {
                if self.tab == Tab::Groups {
                    let i = self.groups_state.selected().map_or(0, |i| i.saturating_sub(1));
                    self.groups_state.select(Some(i));
                }
            }
            Focus::Messages => match self.messages_state.selected() {
                Some(0) | None => {
                    // top of the conversation: fetch older history
                    if let Some(request) = self.messenger.load_messages() {
                        self.submit(request);
                    }
                    if !self.messenger.messages().is_empty() {
                        self.messages_state.select(Some(0));
                    }
                }
                Some(i) => self.messages_state.select(Some(i - 1)),
            },
            Focus::Live => {
                let i = self.live_state.selected().map_or(0, |i| i.saturating_sub(1));
                self.live_state.select(Some(i));
            }
            Focus::Inspect => {
                self.close_inspect();
                self.select_previous();
                self.toggle_inspect();
            }
        }
    }

    fn select_next(&mut self) {
        match self.focus {
            Focus::Groups => {
                if self.tab != Tab::Groups {
                    return;
                }
                let count = self.messenger.groups().items().len();
                if count == 0 {
                    return;
                }
                let i = self
                    .groups_state
                    .selected()
                    .map_or(0, |i| (i + 1).min(count - 1));
                self.groups_state.select(Some(i));
                if let Some(request) = self.messenger.near_end_of_groups(i) {
                    self.submit(request);
                }
            }
            Focus::Messages => {
                let count = self.messenger.messages().len();
                if count > 0 {
                    let i = self
                        .messages_state
                        .selected()
                        .map_or(0, |i| (i + 1).min(count - 1));
                    self.messages_state.select(Some(i));
                }
            }
            Focus::Live => {
                let count = self.live.feed().visible_count();
                if count > 0 {
                    let i = self
                        .live_state
                        .selected()
                        .map_or(0, |i| (i + 1).min(count - 1));
                    self.live_state.select(Some(i));
                }
            }
            Focus::Inspect => {
                self.close_inspect();
                self.select_next();
                self.toggle_inspect();
            }
        }
    }

    fn toggle_inspect(&mut self) {
        if self.focus == Focus::Inspect {
            self.close_inspect();
            return;
        }
        let inspected = match self.focus {
            Focus::Messages => self
                .messages_state
                .selected()
                .and_then(|i| self.messenger.messages().get(i))
                .map(|m| Inspected {
                    title: format!(" Message #{} ", m.message_id),
                    body: format!(
                        "From: {}\nChat: {}\nSent: {}\n\n{}",
                        m.author_name(),
                        m.chat_title(),
                        m.time_sent.as_deref().unwrap_or("-"),
                        m.text_or_placeholder()
                    ),
                    return_to: Focus::Messages,
                }),
            Focus::Live => self
                .live_state
                .selected()
                .and_then(|i| self.live.feed().visible_get(i))
                .map(|item| Inspected {
                    title: match item {
                        LiveItem::Message(m) => format!(" Message #{} ", m.message_id),
                        LiveItem::Log(_) => " Log Line ".to_string(),
                        LiveItem::StreamError { .. } => " Stream Error ".to_string(),
                    },
                    body: item.text(),
                    return_to: Focus::Live,
                }),
            _ => None,
        };
        if let Some(inspected) = inspected {
            self.inspected = Some(inspected);
            self.focus = Focus::Inspect;
        }
    }

    fn close_inspect(&mut self) {
        if let Some(inspected) = self.inspected.take() {
            self.focus = inspected.return_to;
        }
    }
}

/// The row under a table's selection, to find it again after the feed changes.
fn selected_item<T: FeedItem + Clone>(feed: &BoundedFeed<T>, state: &TableState) -> Option<T> {
    state.selected().and_then(|i| feed.visible_get(i)).cloned()
}

/// Keeps the selection on `anchor` when head evictions shift the rows. If the
/// row itself was evicted the oldest row takes the selection.
fn reanchor<T: FeedItem + PartialEq>(
    feed: &BoundedFeed<T>,
    state: &mut TableState,
    anchor: Option<T>,
) {
    let Some(anchor) = anchor else {
        return;
    };
    let index = feed.visible_position(&anchor).unwrap_or(0);
    state.select(Some(index));
}
