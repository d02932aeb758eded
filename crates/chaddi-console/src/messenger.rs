//! Group browser and conversation view state.

use tracing::{debug, info};

use crate::deeplink::{DeepLink, Resolution};
use crate::feed::BoundedFeed;
use crate::models::{Group, Message};
use crate::paging::{Completion, PageOrder, PagedList};
use crate::worker::{FetchRequest, FetchResponse};

/// Selecting a group this close to the end of the loaded list fetches the next page.
pub const DEFAULT_SCROLL_THRESHOLD: usize = 5;

/// What applying a response changed, for the view to react to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessengerUpdate {
    /// Requests to submit next (deep-link paging, history of a newly selected group).
    pub follow_ups: Vec<FetchRequest>,
    /// Older messages inserted before the head; the view shifts its selection by this much.
    pub prepended: usize,
    pub scroll_to_latest: bool,
    pub selected_changed: bool,
    /// Deep-link target that was not found after every page was searched.
    pub missed_deep_link: Option<String>,
}

pub struct Messenger {
    groups: PagedList<Group>,
    total_groups: Option<u64>,
    conversation: PagedList<Message, BoundedFeed<Message>>,
    selected: Option<Group>,
    /// Live messages for the open group that arrived before its newest page.
    held_live: Vec<Message>,
    deep_link: DeepLink,
    scroll_threshold: usize,
}

impl Messenger {
    pub fn new(feed_limit: usize, deep_link: DeepLink) -> Self {
        Self {
            groups: PagedList::new(PageOrder::Forward),
            total_groups: None,
            conversation: PagedList::with_sink(
                BoundedFeed::new(feed_limit),
                PageOrder::ReverseChronological,
            ),
            selected: None,
            held_live: Vec::new(),
            deep_link,
            scroll_threshold: DEFAULT_SCROLL_THRESHOLD,
        }
    }

    pub fn with_scroll_threshold(mut self, threshold: usize) -> Self {
        self.scroll_threshold = threshold;
        self
    }

    pub fn groups(&self) -> &PagedList<Group> {
        &self.groups
    }

    pub fn total_groups(&self) -> Option<u64> {
        self.total_groups
    }

    pub fn conversation(&self) -> &PagedList<Message, BoundedFeed<Message>> {
        &self.conversation
    }

    pub fn messages(&self) -> &BoundedFeed<Message> {
        self.conversation.items()
    }

    pub fn selected(&self) -> Option<&Group> {
        self.selected.as_ref()
    }

    pub fn pending_deep_link(&self) -> Option<&str> {
        self.deep_link.pending()
    }

    /// Next groups page, if one is due.
    pub fn load_groups(&mut self) -> Option<FetchRequest> {
        let ticket = self.groups.begin()?;
        debug!(page = ticket.page, "loading groups");
        Some(FetchRequest::Groups { ticket })
    }

    /// Starts the group list over from page 1.
    pub fn reload_groups(&mut self) -> Option<FetchRequest> {
        self.groups.reset();
        self.total_groups = None;
        self.load_groups()
    }

    /// Infinite scroll over the group list.
    pub fn near_end_of_groups(&mut self, index: usize) -> Option<FetchRequest> {
        if index + self.scroll_threshold >= self.groups.items().len() {
            self.load_groups()
        } else {
            None
        }
    }

    /// Selects a loaded group, dropping the previous conversation. Returns the
    /// request for the newest history page.
    pub fn select_group(&mut self, group_id: &str) -> Option<FetchRequest> {
        let group = self
            .groups
            .items()
            .iter()
            .find(|g| g.group_id == group_id)?
            .clone();
        self.select(group)
    }

    fn select(&mut self, group: Group) -> Option<FetchRequest> {
        info!(group_id = %group.group_id, name = group.display_name(), "group selected");
        self.selected = Some(group);
        self.held_live.clear();
        self.conversation.reset();
        self.load_messages()
    }

    /// Next (older) page of the open conversation.
    pub fn load_messages(&mut self) -> Option<FetchRequest> {
        let group_id = self.selected.as_ref()?.group_id.clone();
        let ticket = self.conversation.begin()?;
        debug!(%group_id, page = ticket.page, "loading messages");
        Some(FetchRequest::Messages { group_id, ticket })
    }

    /// Appends a pushed message when it belongs to the open conversation.
    /// Until the newest page has landed the message is held back, since that
    /// page replaces the conversation.
    pub fn on_live_message(&mut self, message: &Message) -> bool {
        let Some(selected) = self.selected.as_ref() else {
            return false;
        };
        if message.chat_id().as_deref() != Some(selected.group_id.as_str()) {
            return false;
        }
        if self.conversation.loaded_pages() == 0 {
            self.held_live.push(message.clone());
        } else {
            self.conversation.items_mut().append_live(message.clone());
        }
        true
    }

    fn release_held_live(&mut self) {
        for message in std::mem::take(&mut self.held_live) {
            let feed = self.conversation.items_mut();
            if !feed.iter().any(|m| m.message_id == message.message_id) {
                feed.append_live(message);
            }
        }
    }

    /// Merges a worker response. Responses for other controllers are ignored.
    pub fn apply(&mut self, response: FetchResponse) -> MessengerUpdate {
        let mut update = MessengerUpdate::default();
        match response {
            FetchResponse::Groups { ticket, result } => {
                let total_groups = result.as_ref().ok().and_then(|f| f.total_groups);
                let completion = self.groups.complete(ticket, result.map(|f| f.page));
                if !matches!(completion, Completion::Replaced { .. } | Completion::Merged { .. })
                {
                    return update;
                }
                if total_groups.is_some() {
                    self.total_groups = total_groups;
                }
                self.resolve_deep_link(&mut update);
            }
            FetchResponse::Messages {
                group_id,
                ticket,
                result,
            } => {
                if self.selected.as_ref().map(|g| g.group_id.as_str()) != Some(group_id.as_str()) {
                    return update;
                }
                match self.conversation.complete(ticket, result) {
                    Completion::Merged { count } => update.prepended = count,
                    Completion::Replaced { .. } => self.release_held_live(),
                    Completion::Failed | Completion::Stale => {}
                }
                update.scroll_to_latest = self.conversation.take_scroll_to_latest();
            }
            _ => {}
        }
        update
    }

    fn resolve_deep_link(&mut self, update: &mut MessengerUpdate) {
        let target = self.deep_link.pending().map(str::to_string);
        match self.deep_link.resolve(&self.groups) {
            Resolution::Idle => {}
            Resolution::Found(group) => {
                update.selected_changed = true;
                update.follow_ups.extend(self.select(group));
            }
            Resolution::FetchMore => update.follow_ups.extend(self.load_groups()),
            Resolution::NotFound => {
                info!(group_id = ?target, "deep-linked group not found");
                update.missed_deep_link = target;
            }
        }
    }
}
