//! Capped, ordered display list fed by history backfill and live pushes.
//!
//! Live items enter at the tail, history pages at the head. The two ends are
//! disjoint, so a backfill and a live push never reorder each other. Once
//! `max_size` is reached the oldest items (the head) are evicted.

use std::collections::VecDeque;

use crate::paging::PageSink;

pub const DEFAULT_FEED_LIMIT: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Message,
    Log,
}

/// Visibility filter over feed categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Messages,
    Logs,
}

impl Filter {
    pub fn admits(self, category: Category) -> bool {
        match self {
            Filter::All => true,
            Filter::Messages => category == Category::Message,
            Filter::Logs => category == Category::Log,
        }
    }

    /// All -> Messages -> Logs -> All.
    pub fn next(self) -> Self {
        match self {
            Filter::All => Filter::Messages,
            Filter::Messages => Filter::Logs,
            Filter::Logs => Filter::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Messages => "messages",
            Filter::Logs => "logs",
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub trait FeedItem {
    fn category(&self) -> Category;
}

impl FeedItem for crate::models::Message {
    fn category(&self) -> Category {
        Category::Message
    }
}

#[derive(Debug, Clone)]
pub struct BoundedFeed<T> {
    items: VecDeque<T>,
    max_size: usize,
    filter: Filter,
    paused: bool,
    evicted: u64,
}

impl<T> BoundedFeed<T> {
    /// `max_size` is clamped to at least one item.
    pub fn new(max_size: usize) -> Self {
        Self {
            items: VecDeque::new(),
            max_size: max_size.max(1),
            filter: Filter::All,
            paused: false,
            evicted: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Total number of items evicted from the head since creation.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    /// Appends at the tail regardless of pause state, then evicts from the head.
    /// Returns the evicted item, if any.
    pub fn append_live(&mut self, item: T) -> Option<T> {
        self.items.push_back(item);
        if self.items.len() > self.max_size {
            self.evicted += 1;
            return self.items.pop_front();
        }
        None
    }

    /// Appends unless the feed is paused; paused events are dropped, not queued.
    pub fn offer_live(&mut self, item: T) -> bool {
        if self.paused {
            return false;
        }
        self.append_live(item);
        true
    }

    /// Inserts a chronologically ordered page before the head. Items that would
    /// push the feed past its cap are dropped oldest-first. Returns how many
    /// items were inserted.
    pub fn prepend_history(&mut self, items: Vec<T>) -> usize {
        let room = self.max_size.saturating_sub(self.items.len());
        let skip = items.len().saturating_sub(room);
        self.evicted += skip as u64;
        let mut inserted = 0;
        for item in items.into_iter().skip(skip).rev() {
            self.items.push_front(item);
            inserted += 1;
        }
        inserted
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// Changes visibility only; the underlying sequence is untouched.
    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }
}

impl<T: FeedItem> BoundedFeed<T> {
    pub fn visible(&self) -> impl Iterator<Item = &T> {
        let filter = self.filter;
        self.items
            .iter()
            .filter(move |item| filter.admits(item.category()))
    }

    pub fn visible_count(&self) -> usize {
        self.visible().count()
    }

    /// The `index`-th visible item.
    pub fn visible_get(&self, index: usize) -> Option<&T> {
        self.visible().nth(index)
    }

    /// Visible index of the first item equal to `item`; `None` once it was evicted
    /// or filtered out.
    pub fn visible_position(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.visible().position(|candidate| candidate == item)
    }
}

impl<T> PageSink<T> for BoundedFeed<T> {
    fn clear_items(&mut self) {
        self.clear();
    }

    fn extend_tail(&mut self, items: Vec<T>) {
        for item in items {
            self.append_live(item);
        }
    }

    fn extend_head(&mut self, items: Vec<T>) {
        self.prepend_history(items);
    }

    fn item_count(&self) -> usize {
        self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(u32, Category);

    impl FeedItem for Item {
        fn category(&self) -> Category {
            self.1
        }
    }

    fn msg(n: u32) -> Item {
        Item(n, Category::Message)
    }

    fn log(n: u32) -> Item {
        Item(n, Category::Log)
    }

    fn ids(feed: &BoundedFeed<Item>) -> Vec<u32> {
        feed.iter().map(|i| i.0).collect()
    }

    #[test]
    fn test_append_evicts_oldest_first() {
        let mut feed = BoundedFeed::new(3);
        for n in 1..=3 {
            assert_eq!(feed.append_live(msg(n)), None);
        }
        assert_eq!(feed.append_live(msg(4)), Some(msg(1)));
        assert_eq!(ids(&feed), vec![2, 3, 4]);
        assert_eq!(feed.evicted(), 1);
    }

    #[test]
    fn test_visible_position_follows_item_through_eviction() {
        let mut feed = BoundedFeed::new(4);
        for item in [msg(1), log(2), msg(3), msg(4)] {
            feed.append_live(item);
        }
        feed.set_filter(Filter::Messages);
        let selected = feed.visible_get(1).cloned().unwrap();
        assert_eq!(selected, msg(3));

        feed.append_live(msg(5));
        assert_eq!(feed.visible_position(&selected), Some(0));
        feed.append_live(msg(6));
        assert_eq!(feed.visible_position(&selected), Some(0));
        feed.append_live(msg(7));
        assert_eq!(feed.visible_position(&selected), None);
    }

    #[test]
    fn test_default_limit_holds_after_many_appends() {
        let mut feed = BoundedFeed::new(DEFAULT_FEED_LIMIT);
        for n in 0..1200 {
            feed.append_live(msg(n));
        }
        assert_eq!(feed.len(), 500);
        assert_eq!(feed.iter().next().map(|i| i.0), Some(700));
        assert_eq!(feed.last().map(|i| i.0), Some(1199));
    }

    #[test]
    fn test_prepend_keeps_page_order() {
        let mut feed = BoundedFeed::new(10);
        feed.append_live(msg(10));
        feed.append_live(msg(11));
        assert_eq!(feed.prepend_history(vec![msg(7), msg(8), msg(9)]), 3);
        assert_eq!(ids(&feed), vec![7, 8, 9, 10, 11]);
    }

    #[test]
    fn test_prepend_respects_cap() {
        let mut feed = BoundedFeed::new(4);
        feed.append_live(msg(10));
        feed.append_live(msg(11));
        assert_eq!(feed.prepend_history(vec![msg(6), msg(7), msg(8), msg(9)]), 2);
        assert_eq!(ids(&feed), vec![8, 9, 10, 11]);
        assert_eq!(feed.prepend_history(vec![msg(1)]), 0);
    }

    #[test]
    fn test_paused_feed_drops_live_items() {
        let mut feed = BoundedFeed::new(10);
        feed.set_paused(true);
        assert!(!feed.offer_live(msg(1)));
        feed.set_paused(false);
        assert!(feed.offer_live(msg(2)));
        assert_eq!(ids(&feed), vec![2]);
    }

    #[test]
    fn test_filter_changes_visibility_only() {
        let mut feed = BoundedFeed::new(10);
        feed.append_live(msg(1));
        feed.append_live(log(2));
        feed.append_live(msg(3));

        feed.set_filter(Filter::Logs);
        assert_eq!(feed.visible_count(), 1);
        assert_eq!(feed.visible_get(0), Some(&log(2)));
        assert_eq!(feed.len(), 3);

        feed.set_filter(Filter::Messages);
        assert_eq!(feed.visible().map(|i| i.0).collect::<Vec<_>>(), vec![1, 3]);

        feed.set_filter(Filter::All);
        assert_eq!(feed.visible_count(), 3);
        assert_eq!(ids(&feed), vec![1, 2, 3]);
    }

    #[test]
    fn test_filter_cycle() {
        assert_eq!(Filter::All.next(), Filter::Messages);
        assert_eq!(Filter::Messages.next(), Filter::Logs);
        assert_eq!(Filter::Logs.next(), Filter::All);
    }

    proptest! {
        #[test]
        fn prop_len_never_exceeds_cap(cap in 1usize..50, ops in proptest::collection::vec((any::<bool>(), 0usize..8), 0..200)) {
            let mut feed = BoundedFeed::new(cap);
            let mut next = 0u32;
            let mut newest = None;
            for (live, n) in ops {
                if live {
                    feed.append_live(msg(next));
                    newest = Some(next);
                    next += 1;
                } else {
                    let page = (0..n as u32).map(|k| log(10_000 + k)).collect();
                    feed.prepend_history(page);
                }
                prop_assert!(feed.len() <= cap);
            }
            if let Some(newest) = newest {
                prop_assert_eq!(feed.last().map(|i| i.0), Some(newest));
            }
        }

        #[test]
        fn prop_filter_never_mutates(kinds in proptest::collection::vec(any::<bool>(), 0..60), picks in proptest::collection::vec(0u8..3, 1..10)) {
            let mut feed = BoundedFeed::new(100);
            for (n, is_log) in kinds.iter().enumerate() {
                feed.append_live(if *is_log { log(n as u32) } else { msg(n as u32) });
            }
            let before = ids(&feed);
            for pick in picks {
                let filter = match pick { 0 => Filter::All, 1 => Filter::Messages, _ => Filter::Logs };
                feed.set_filter(filter);
                prop_assert_eq!(ids(&feed), before.clone());
            }
            feed.set_filter(Filter::All);
            prop_assert_eq!(feed.visible_count(), before.len());
        }
    }
}
