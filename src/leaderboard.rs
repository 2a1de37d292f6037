use crate::matrix::ConfusionMatrix;
use crate::ranked_store::RankedStore;
use crate::util::page_count;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One row on the shared board. Entries are append-only: a client creates
/// them on submission and nobody ever mutates them afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: i64,
    pub username: String,
    pub accuracy: f64,
    pub total_correct: u32,
    pub total_attempted: u32,
    #[serde(rename = "confusionMatrix")]
    pub matrix: ConfusionMatrix,
    pub created_at: DateTime<Utc>,
}

/// Payload for a submission; `id` and `created_at` are assigned by the
/// store, never by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub username: String,
    pub accuracy: f64,
    pub total_correct: u32,
    pub total_attempted: u32,
    pub matrix: ConfusionMatrix,
}

/// Position of one entry under the board's fixed ordering (accuracy
/// descending, then insertion order ascending). A cursor is only
/// meaningful against that ordering; changing the ordering key would
/// invalidate every cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageCursor {
    pub accuracy: f64,
    pub id: i64,
}

impl From<&LeaderboardEntry> for PageCursor {
    fn from(entry: &LeaderboardEntry) -> Self {
        Self {
            accuracy: entry.accuracy,
            id: entry.id,
        }
    }
}

/// One fetched page, already in display order (best rank first).
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub entries: Vec<LeaderboardEntry>,
}

impl Page {
    /// Cursor of the best-ranked entry on this page.
    pub fn first_cursor(&self) -> Option<PageCursor> {
        self.entries.first().map(PageCursor::from)
    }

    /// Cursor of the worst-ranked entry on this page.
    pub fn last_cursor(&self) -> Option<PageCursor> {
        self.entries.last().map(PageCursor::from)
    }
}

/// A leaderboard operation that did not go through. Always recoverable:
/// the user repeats the action, nothing local is lost.
#[derive(Debug)]
pub enum LeaderboardError {
    Store(rusqlite::Error),
    Encoding(serde_json::Error),
}

impl fmt::Display for LeaderboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaderboardError::Store(e) => write!(f, "could not reach the leaderboard: {e}"),
            LeaderboardError::Encoding(e) => write!(f, "malformed leaderboard record: {e}"),
        }
    }
}

impl std::error::Error for LeaderboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LeaderboardError::Store(e) => Some(e),
            LeaderboardError::Encoding(e) => Some(e),
        }
    }
}

impl From<rusqlite::Error> for LeaderboardError {
    fn from(err: rusqlite::Error) -> Self {
        LeaderboardError::Store(err)
    }
}

impl From<serde_json::Error> for LeaderboardError {
    fn from(err: serde_json::Error) -> Self {
        LeaderboardError::Encoding(err)
    }
}

/// Pages through the ranked store, keeping the cursors of the page on
/// display. Only adjacent moves exist; jumping to an arbitrary page is
/// not expressible with cursors and deliberately has no method here.
pub struct LeaderboardClient {
    store: Box<dyn RankedStore>,
    page_size: usize,
    // 1-based; 0 means nothing fetched yet
    page_index: usize,
    current: Page,
    total: usize,
}

impl LeaderboardClient {
    pub fn new(store: Box<dyn RankedStore>, page_size: usize) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
            page_index: 0,
            current: Page::default(),
            total: 0,
        }
    }

    /// Re-fetch the entry count and the first page. Called on first view
    /// and after every confirmed submission, since a submitted entry is
    /// not assumed visible until re-fetched.
    pub fn refresh(&mut self) -> Result<(), LeaderboardError> {
        self.total = self.store.count()?;
        self.current = self.store.first_page(self.page_size)?;
        self.page_index = if self.current.entries.is_empty() { 0 } else { 1 };
        Ok(())
    }

    /// Move one page down the ranking. `Ok(false)` when already on the
    /// last page (the displayed page is left alone).
    pub fn next_page(&mut self) -> Result<bool, LeaderboardError> {
        if self.page_index == 0 {
            self.refresh()?;
            return Ok(self.page_index != 0);
        }
        if self.page_index >= self.total_pages() {
            return Ok(false);
        }
        let cursor = match self.current.last_cursor() {
            Some(c) => c,
            None => return Ok(false),
        };
        let page = self.store.page_after(&cursor, self.page_size)?;
        if page.entries.is_empty() {
            return Ok(false);
        }
        self.current = page;
        self.page_index += 1;
        Ok(true)
    }

    /// Move one page up the ranking. `Ok(false)` when already on the
    /// first page.
    pub fn previous_page(&mut self) -> Result<bool, LeaderboardError> {
        if self.page_index <= 1 {
            return Ok(false);
        }
        let cursor = match self.current.first_cursor() {
            Some(c) => c,
            None => return Ok(false),
        };
        let page = self.store.page_before(&cursor, self.page_size)?;
        if page.entries.is_empty() {
            return Ok(false);
        }
        self.current = page;
        self.page_index -= 1;
        Ok(true)
    }

    /// Write handle for the submission workflow; reads keep going through
    /// the paging methods above.
    pub fn store_mut(&mut self) -> &mut dyn RankedStore {
        self.store.as_mut()
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.current.entries
    }

    /// 1-based index of the currently displayed page; 0 before the first
    /// fetch or when the board is empty.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Overall rank of the entry at `offset` within the current page.
    pub fn rank_of(&self, offset: usize) -> usize {
        (self.page_index.saturating_sub(1)) * self.page_size + offset + 1
    }

    pub fn total_entries(&self) -> usize {
        self.total
    }

    pub fn total_pages(&self) -> usize {
        page_count(self.total, self.page_size)
    }
}
