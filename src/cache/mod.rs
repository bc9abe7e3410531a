use std::collections::HashMap;

use crate::domain::FeedItem;

/// Retries per page are capped at one cycle; the simulator guarantees
/// the second attempt succeeds, a real backend would not.
const MAX_RETRIES_PER_PAGE: u32 = 1;

/// Last-successful page results plus per-page retry counters.
///
/// No concurrency control of its own: the cache is owned by the
/// controller and mutated only between its suspension points.
#[derive(Debug, Default)]
pub struct PageCache {
    pages: HashMap<u32, Vec<FeedItem>>,
    retries: HashMap<u32, u32>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, page: u32) -> Option<&Vec<FeedItem>> {
        self.pages.get(&page)
    }

    pub fn put(&mut self, page: u32, items: Vec<FeedItem>) {
        self.pages.insert(page, items);
    }

    pub fn retry_count(&self, page: u32) -> u32 {
        self.retries.get(&page).copied().unwrap_or(0)
    }

    pub fn increment_retry(&mut self, page: u32) {
        let count = self.retries.entry(page).or_insert(0);
        *count = (*count + 1).min(MAX_RETRIES_PER_PAGE);
    }

    pub fn clear_retry(&mut self, page: u32) {
        self.retries.remove(&page);
    }

    /// Drop every cached page and every retry counter.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.retries.clear();
    }
}

/// Single-slot fallback holding the last successful refresh batch.
/// Overwritten on every success, read-only on failure.
#[derive(Debug, Default)]
pub struct RefreshCache {
    batch: Option<Vec<FeedItem>>,
}

impl RefreshCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&Vec<FeedItem>> {
        self.batch.as_ref()
    }

    pub fn set(&mut self, items: Vec<FeedItem>) {
        self.batch = Some(items);
    }

    pub fn clear(&mut self) {
        self.batch = None;
    }
}
