//! Live activity: pushed chat messages and the server log tail in one feed.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::feed::{BoundedFeed, Category, FeedItem, Filter};
use crate::logline::LogLine;
use crate::models::Message;
use crate::push::{Emit, PushEvent};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Disconnected,
    Paused,
    Error(String),
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Connecting => write!(f, "Connecting"),
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Paused => write!(f, "Paused"),
            ConnectionStatus::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiveItem {
    Message(Box<Message>),
    Log(LogLine),
    /// Injected when the server reports a log stream failure.
    StreamError {
        message: String,
        received_at: DateTime<Utc>,
    },
}

impl LiveItem {
    /// Single-line text for inspection and plain output.
    pub fn text(&self) -> String {
        match self {
            LiveItem::Message(m) => format!("{}: {}", m.author_name(), m.text_or_placeholder()),
            LiveItem::Log(line) => line.content(),
            LiveItem::StreamError { message, .. } => format!("ERROR: {}", message),
        }
    }
}

impl FeedItem for LiveItem {
    fn category(&self) -> Category {
        match self {
            LiveItem::Message(_) => Category::Message,
            LiveItem::Log(_) | LiveItem::StreamError { .. } => Category::Log,
        }
    }
}

pub struct LiveActivity {
    feed: BoundedFeed<LiveItem>,
    status: ConnectionStatus,
    connected: bool,
    auto_scroll: bool,
    show_welcome: bool,
    stream_notice: Option<String>,
    messages_received: u64,
    dropped_while_paused: u64,
}

impl LiveActivity {
    pub fn new(feed_limit: usize) -> Self {
        Self {
            feed: BoundedFeed::new(feed_limit),
            status: ConnectionStatus::Connecting,
            connected: false,
            auto_scroll: true,
            show_welcome: true,
            stream_notice: None,
            messages_received: 0,
            dropped_while_paused: 0,
        }
    }

    pub fn feed(&self) -> &BoundedFeed<LiveItem> {
        &self.feed
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_paused(&self) -> bool {
        self.feed.is_paused()
    }

    pub fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    pub fn toggle_auto_scroll(&mut self) {
        self.auto_scroll = !self.auto_scroll;
    }

    /// True until the first log stream acknowledgement or pushed item.
    pub fn show_welcome(&self) -> bool {
        self.show_welcome
    }

    /// Message sent by the server with `log_connected`.
    pub fn stream_notice(&self) -> Option<&str> {
        self.stream_notice.as_deref()
    }

    /// Chat messages accepted since start, including evicted ones.
    pub fn messages_received(&self) -> u64 {
        self.messages_received
    }

    pub fn dropped_while_paused(&self) -> u64 {
        self.dropped_while_paused
    }

    /// Applies one push event and returns what must be emitted in response.
    pub fn on_event(&mut self, event: PushEvent, now: DateTime<Utc>) -> Vec<Emit> {
        match event {
            PushEvent::Connected => self.on_connect(),
            PushEvent::Disconnected => {
                self.connected = false;
                self.status = ConnectionStatus::Disconnected;
                Vec::new()
            }
            PushEvent::Message(message) => {
                if self.offer(LiveItem::Message(message)) {
                    self.messages_received += 1;
                }
                Vec::new()
            }
            PushEvent::LogLine { content } => {
                self.offer(LiveItem::Log(LogLine::parse(&content, now)));
                Vec::new()
            }
            PushEvent::LogConnected { message } => {
                debug!(?message, "log stream acknowledged");
                self.stream_notice = message;
                self.show_welcome = false;
                Vec::new()
            }
            PushEvent::LogError { message } => self.on_log_error(message, now),
            PushEvent::Other { name, .. } => {
                debug!(%name, "ignoring push event");
                Vec::new()
            }
        }
    }

    fn on_connect(&mut self) -> Vec<Emit> {
        self.connected = true;
        if self.is_paused() {
            self.status = ConnectionStatus::Paused;
            vec![Emit::hello()]
        } else {
            self.status = ConnectionStatus::Connected;
            vec![Emit::hello(), Emit::StartLogStream]
        }
    }

    fn on_log_error(&mut self, message: String, now: DateTime<Utc>) -> Vec<Emit> {
        warn!(%message, "log stream error");
        self.status = ConnectionStatus::Error(message.clone());
        self.show_welcome = false;
        self.feed.append_live(LiveItem::StreamError {
            message,
            received_at: now,
        });
        Vec::new()
    }

    fn offer(&mut self, item: LiveItem) -> bool {
        if self.feed.offer_live(item) {
            self.show_welcome = false;
            true
        } else {
            self.dropped_while_paused += 1;
            debug!("dropped live item while paused");
            false
        }
    }

    /// Stops or restarts the log stream. Events arriving while paused are lost.
    pub fn toggle_pause(&mut self) -> Vec<Emit> {
        let paused = !self.is_paused();
        self.feed.set_paused(paused);
        if paused {
            self.status = ConnectionStatus::Paused;
            if self.connected {
                return vec![Emit::StopLogStream];
            }
        } else if self.connected {
            self.status = ConnectionStatus::Connected;
            return vec![Emit::StartLogStream];
        } else {
            self.status = ConnectionStatus::Disconnected;
        }
        Vec::new()
    }

    pub fn clear(&mut self) {
        self.feed.clear();
    }

    pub fn filter(&self) -> Filter {
        self.feed.filter()
    }

    pub fn cycle_filter(&mut self) -> Filter {
        let next = self.feed.filter().next();
        self.feed.set_filter(next);
        next
    }

    /// Emits to send before the connection is closed.
    pub fn shutdown(&mut self) -> Vec<Emit> {
        if self.connected {
            vec![Emit::StopLogStream]
        } else {
            Vec::new()
        }
    }
}
