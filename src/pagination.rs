// Copyright (c) 2025 - Cowboy AI, Inc.
//! Page-at-a-time iteration
//!
//! [`PaginatedIterator`] walks an unbounded collection one page at a time.
//! It is parameterized by:
//! - a page size,
//! - a function deriving a resumption cursor from the last item of a page,
//! - a function fetching the next page given `(page_size, cursor)`.
//!
//! # Protocol
//!
//! ```text
//! buffer empty? ──yes──▶ last page seen? ──yes──▶ exhausted
//!      │no                      │no
//!      ▼                        ▼
//!  pop item           fetch(page_size, cursor)
//!                     len < page_size ⇒ last page
//!                     cursor = cursor_of(last item)
//! ```
//!
//! A page exactly `page_size` long is not proof the data ended, so one more
//! fetch (possibly empty) confirms it.
//!
//! The iterator owns its position. Concurrent consumers each build their own.

use std::collections::VecDeque;
use std::future::Future;

use crate::errors::StoreResult;

/// Lazily fetching, cursor-driven iterator
pub struct PaginatedIterator<T, C, F, K> {
    page_size: usize,
    cursor_of: K,
    fetch: F,
    buffer: VecDeque<T>,
    cursor: Option<C>,
    last_page: bool,
    pages_fetched: usize,
}

impl<T, C, F, Fut, K> PaginatedIterator<T, C, F, K>
where
    C: Clone,
    F: FnMut(usize, Option<C>) -> Fut,
    Fut: Future<Output = StoreResult<Vec<T>>>,
    K: Fn(&T) -> C,
{
    /// Create an iterator; a zero page size is treated as 1
    pub fn new(page_size: usize, cursor_of: K, fetch: F) -> Self {
        Self {
            page_size: page_size.max(1),
            cursor_of,
            fetch,
            buffer: VecDeque::new(),
            cursor: None,
            last_page: false,
            pages_fetched: 0,
        }
    }

    /// Whether another item is available, fetching a page if needed
    pub async fn has_next(&mut self) -> StoreResult<bool> {
        if self.buffer.is_empty() && !self.last_page {
            self.fetch_page().await?;
        }
        Ok(!self.buffer.is_empty())
    }

    /// Next item, or `None` once exhausted
    pub async fn next(&mut self) -> StoreResult<Option<T>> {
        if !self.has_next().await? {
            return Ok(None);
        }
        Ok(self.buffer.pop_front())
    }

    /// Whether the most recent fetch returned a short page
    pub fn is_last_page(&self) -> bool {
        self.last_page
    }

    /// Number of fetches issued so far
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Drain every remaining item
    pub async fn try_collect(mut self) -> StoreResult<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await? {
            items.push(item);
        }
        Ok(items)
    }

    async fn fetch_page(&mut self) -> StoreResult<()> {
        let page = (self.fetch)(self.page_size, self.cursor.clone()).await?;
        self.pages_fetched += 1;

        if page.len() < self.page_size {
            self.last_page = true;
        }
        if let Some(last) = page.last() {
            self.cursor = Some((self.cursor_of)(last));
        }

        self.buffer.extend(page);
        Ok(())
    }
}
