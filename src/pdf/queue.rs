//! Ordered queue of pages waiting to be rendered
//!
//! The sequential pass enqueues every page in document order. On-demand
//! requests jump to the front. A page is queued at most once.

use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct RenderQueue {
    pending: VecDeque<usize>,
}

impl RenderQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append pages in order, skipping any already queued
    pub fn extend_in_order(&mut self, pages: impl IntoIterator<Item = usize>) {
        for page in pages {
            if !self.contains(page) {
                self.pending.push_back(page);
            }
        }
    }

    /// Move (or insert) a page to the front
    pub fn prioritize(&mut self, page: usize) {
        self.remove(page);
        self.pending.push_front(page);
    }

    pub fn pop_next(&mut self) -> Option<usize> {
        self.pending.pop_front()
    }

    #[must_use]
    pub fn peek_next(&self) -> Option<usize> {
        self.pending.front().copied()
    }

    #[must_use]
    pub fn contains(&self, page: usize) -> bool {
        self.pending.contains(&page)
    }

    pub fn remove(&mut self, page: usize) {
        self.pending.retain(|&p| p != page);
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
