//! Client-side state for a page-fetched collection.
//!
//! A fetch is split in two halves so the network call can run on another
//! thread: [`PagedList::begin`] hands out a [`PageTicket`] and marks the list
//! as loading, [`PagedList::complete`] merges the result. Tickets issued
//! before a [`PagedList::reset`] are rejected on completion.

use std::fmt::Display;
use std::marker::PhantomData;

/// Pagination cursor for one REST-paginated collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub current_page: u32,
    pub total_pages: u32,
    pub loading: bool,
    pub has_more: bool,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 0,
            loading: false,
            has_more: true,
        }
    }
}

/// One fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: u32,
}

/// Receipt for an in-flight page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    pub page: u32,
    generation: u64,
}

impl PageTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// How the server orders items within a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOrder {
    /// Pages extend the list at the tail (group list).
    Forward,
    /// Pages arrive newest first and extend the list at the head once reversed
    /// (message history).
    ReverseChronological,
}

/// Storage that accumulated pages are merged into.
pub trait PageSink<T> {
    fn clear_items(&mut self);
    fn extend_tail(&mut self, items: Vec<T>);
    /// Inserts `items` before the current head, keeping their order.
    fn extend_head(&mut self, items: Vec<T>);
    fn item_count(&self) -> usize;
}

impl<T> PageSink<T> for Vec<T> {
    fn clear_items(&mut self) {
        self.clear();
    }

    fn extend_tail(&mut self, items: Vec<T>) {
        self.extend(items);
    }

    fn extend_head(&mut self, items: Vec<T>) {
        self.splice(0..0, items);
    }

    fn item_count(&self) -> usize {
        self.len()
    }
}

/// What a completion did to the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Page 1 replaced the accumulated items.
    Replaced { count: usize },
    /// A later page was merged; `count` items were added.
    Merged { count: usize },
    /// The fetch failed; the cursor did not advance.
    Failed,
    /// The ticket belonged to an earlier generation or page and was ignored.
    Stale,
}

#[derive(Debug, Clone)]
pub struct PagedList<T, S = Vec<T>> {
    items: S,
    cursor: PageCursor,
    order: PageOrder,
    generation: u64,
    error: Option<String>,
    scroll_to_latest: bool,
    _item: PhantomData<T>,
}

impl<T> PagedList<T> {
    pub fn new(order: PageOrder) -> Self {
        Self::with_sink(Vec::new(), order)
    }
}

impl<T, S: PageSink<T>> PagedList<T, S> {
    pub fn with_sink(items: S, order: PageOrder) -> Self {
        Self {
            items,
            cursor: PageCursor::default(),
            order,
            generation: 0,
            error: None,
            scroll_to_latest: false,
            _item: PhantomData,
        }
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    pub fn items(&self) -> &S {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut S {
        &mut self.items
    }

    pub fn is_loading(&self) -> bool {
        self.cursor.loading
    }

    pub fn has_more(&self) -> bool {
        self.cursor.has_more
    }

    /// Message of the last failed fetch, cleared by the next success or reset.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Pages loaded so far.
    pub fn loaded_pages(&self) -> u32 {
        self.cursor.current_page - 1
    }

    /// Starts fetching `current_page`. Returns `None` without touching any
    /// state when a fetch is already in flight or every page is loaded.
    pub fn begin(&mut self) -> Option<PageTicket> {
        if self.cursor.loading || !self.cursor.has_more {
            return None;
        }
        self.cursor.loading = true;
        Some(PageTicket {
            page: self.cursor.current_page,
            generation: self.generation,
        })
    }

    pub fn complete(&mut self, ticket: PageTicket, result: Result<Page<T>, String>) -> Completion {
        if ticket.generation != self.generation
            || ticket.page != self.cursor.current_page
            || !self.cursor.loading
        {
            return Completion::Stale;
        }
        self.cursor.loading = false;

        let page = match result {
            Ok(page) => page,
            Err(message) => {
                self.error = Some(message);
                return Completion::Failed;
            }
        };

        let mut items = page.items;
        if self.order == PageOrder::ReverseChronological {
            items.reverse();
        }

        let completion = if ticket.page == 1 {
            self.items.clear_items();
            self.items.extend_tail(items);
            if self.order == PageOrder::ReverseChronological {
                self.scroll_to_latest = true;
            }
            Completion::Replaced {
                count: self.items.item_count(),
            }
        } else {
            let before = self.items.item_count();
            match self.order {
                PageOrder::Forward => self.items.extend_tail(items),
                PageOrder::ReverseChronological => self.items.extend_head(items),
            }
            Completion::Merged {
                count: self.items.item_count().saturating_sub(before),
            }
        };

        self.error = None;
        self.cursor.total_pages = page.total_pages;
        self.cursor.current_page += 1;
        self.cursor.has_more = self.cursor.current_page <= self.cursor.total_pages;
        completion
    }

    /// Runs one fetch synchronously through `fetch`. Returns `None` when the
    /// request was a no-op (already loading or exhausted).
    pub fn request_next_page<E, F>(&mut self, fetch: F) -> Option<Completion>
    where
        E: Display,
        F: FnOnce(u32) -> Result<Page<T>, E>,
    {
        let ticket = self.begin()?;
        let result = fetch(ticket.page).map_err(|e| e.to_string());
        Some(self.complete(ticket, result))
    }

    /// Drops all items and starts over from page 1. In-flight tickets become stale.
    pub fn reset(&mut self) {
        self.items.clear_items();
        self.cursor = PageCursor::default();
        self.generation += 1;
        self.error = None;
        self.scroll_to_latest = false;
    }

    /// True once after page 1 of a reverse-chronological list landed.
    pub fn take_scroll_to_latest(&mut self) -> bool {
        std::mem::take(&mut self.scroll_to_latest)
    }
}
