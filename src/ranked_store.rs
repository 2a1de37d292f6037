use crate::leaderboard::{LeaderboardEntry, LeaderboardError, NewEntry, Page, PageCursor};
use crate::matrix::ConfusionMatrix;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::cmp::Ordering;
use std::path::Path;

/// Ranked, append-only collection of leaderboard entries.
///
/// The ordering is fixed: accuracy descending, then id ascending (ids are
/// assigned in insertion order, which makes them the tie-break). Page
/// queries are keyset-based relative to that ordering; implementations
/// assign id and timestamp on submit, the client never does.
pub trait RankedStore {
    /// Append a new entry; returns it with store-assigned id/timestamp.
    fn submit(&mut self, entry: &NewEntry) -> Result<LeaderboardEntry, LeaderboardError>;

    /// Up to `limit` entries starting at rank 1.
    fn first_page(&self, limit: usize) -> Result<Page, LeaderboardError>;

    /// Up to `limit` entries strictly after `cursor` in rank order.
    fn page_after(&self, cursor: &PageCursor, limit: usize) -> Result<Page, LeaderboardError>;

    /// Up to `limit` entries strictly before `cursor`, returned in rank
    /// order (the natural reverse scan is re-reversed before returning).
    fn page_before(&self, cursor: &PageCursor, limit: usize) -> Result<Page, LeaderboardError>;

    /// Total number of entries on the board.
    fn count(&self) -> Result<usize, LeaderboardError>;
}

/// Shared SQLite database backend. This is the deployment shape the
/// benchmark ships with; a network transport would implement the same
/// trait.
#[derive(Debug)]
pub struct SqliteRankedStore {
    conn: Connection,
}

impl SqliteRankedStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, LeaderboardError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LeaderboardError::Store(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                ))
            })?;
        }
        let conn = Connection::open(path)?;
        Self::init(&conn)?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self, LeaderboardError> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self { conn })
    }

    fn init(conn: &Connection) -> Result<(), LeaderboardError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                accuracy REAL NOT NULL,
                total_correct INTEGER NOT NULL,
                total_attempted INTEGER NOT NULL,
                matrix TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_entries_rank ON entries(accuracy DESC, id ASC)",
            [],
        )?;
        Ok(())
    }

    fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<LeaderboardEntry> {
        let matrix_json: String = row.get(5)?;
        let matrix: ConfusionMatrix = serde_json::from_str(&matrix_json).map_err(|_| {
            rusqlite::Error::InvalidColumnType(5, "matrix".to_string(), rusqlite::types::Type::Text)
        })?;
        let created_str: String = row.get(6)?;
        let created_at = DateTime::parse_from_rfc3339(&created_str)
            .map_err(|_| {
                rusqlite::Error::InvalidColumnType(
                    6,
                    "created_at".to_string(),
                    rusqlite::types::Type::Text,
                )
            })?
            .with_timezone(&Utc);

        Ok(LeaderboardEntry {
            id: row.get(0)?,
            username: row.get(1)?,
            accuracy: row.get(2)?,
            total_correct: row.get(3)?,
            total_attempted: row.get(4)?,
            matrix,
            created_at,
        })
    }

    fn select_page(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, Self::row_to_entry)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

const ENTRY_COLUMNS: &str =
    "id, username, accuracy, total_correct, total_attempted, matrix, created_at";

impl RankedStore for SqliteRankedStore {
    fn submit(&mut self, entry: &NewEntry) -> Result<LeaderboardEntry, LeaderboardError> {
        let matrix_json = serde_json::to_string(&entry.matrix)?;
        let created_at = Utc::now();
        self.conn.execute(
            r#"
            INSERT INTO entries (username, accuracy, total_correct, total_attempted, matrix, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                entry.username,
                entry.accuracy,
                entry.total_correct,
                entry.total_attempted,
                matrix_json,
                created_at.to_rfc3339(),
            ],
        )?;

        Ok(LeaderboardEntry {
            id: self.conn.last_insert_rowid(),
            username: entry.username.clone(),
            accuracy: entry.accuracy,
            total_correct: entry.total_correct,
            total_attempted: entry.total_attempted,
            matrix: entry.matrix,
            created_at,
        })
    }

    fn first_page(&self, limit: usize) -> Result<Page, LeaderboardError> {
        let entries = self.select_page(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM entries ORDER BY accuracy DESC, id ASC LIMIT ?1"
            ),
            params![limit as i64],
        )?;
        Ok(Page { entries })
    }

    fn page_after(&self, cursor: &PageCursor, limit: usize) -> Result<Page, LeaderboardError> {
        let entries = self.select_page(
            &format!(
                r#"
                SELECT {ENTRY_COLUMNS} FROM entries
                WHERE accuracy < ?1 OR (accuracy = ?1 AND id > ?2)
                ORDER BY accuracy DESC, id ASC
                LIMIT ?3
                "#
            ),
            params![cursor.accuracy, cursor.id, limit as i64],
        )?;
        Ok(Page { entries })
    }

    fn page_before(&self, cursor: &PageCursor, limit: usize) -> Result<Page, LeaderboardError> {
        // Scanning toward rank 1 walks the ordering backwards, so the
        // rows come out worst-first and need re-reversing.
        let mut entries = self.select_page(
            &format!(
                r#"
                SELECT {ENTRY_COLUMNS} FROM entries
                WHERE accuracy > ?1 OR (accuracy = ?1 AND id < ?2)
                ORDER BY accuracy ASC, id DESC
                LIMIT ?3
                "#
            ),
            params![cursor.accuracy, cursor.id, limit as i64],
        )?;
        entries.reverse();
        Ok(Page { entries })
    }

    fn count(&self) -> Result<usize, LeaderboardError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// In-memory backend with the same ordering semantics, for tests and
/// offline use.
#[derive(Debug, Default)]
pub struct MemoryRankedStore {
    entries: Vec<LeaderboardEntry>,
    next_id: i64,
}

impl MemoryRankedStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ranked(&self) -> Vec<LeaderboardEntry> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| {
            b.accuracy
                .partial_cmp(&a.accuracy)
                .unwrap_or(Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        entries
    }
}

fn after_cursor(entry: &LeaderboardEntry, cursor: &PageCursor) -> bool {
    entry.accuracy < cursor.accuracy || (entry.accuracy == cursor.accuracy && entry.id > cursor.id)
}

fn before_cursor(entry: &LeaderboardEntry, cursor: &PageCursor) -> bool {
    entry.accuracy > cursor.accuracy || (entry.accuracy == cursor.accuracy && entry.id < cursor.id)
}

impl RankedStore for MemoryRankedStore {
    fn submit(&mut self, entry: &NewEntry) -> Result<LeaderboardEntry, LeaderboardError> {
        self.next_id += 1;
        let stored = LeaderboardEntry {
            id: self.next_id,
            username: entry.username.clone(),
            accuracy: entry.accuracy,
            total_correct: entry.total_correct,
            total_attempted: entry.total_attempted,
            matrix: entry.matrix,
            created_at: Utc::now(),
        };
        self.entries.push(stored.clone());
        Ok(stored)
    }

    fn first_page(&self, limit: usize) -> Result<Page, LeaderboardError> {
        Ok(Page {
            entries: self.ranked().into_iter().take(limit).collect(),
        })
    }

    fn page_after(&self, cursor: &PageCursor, limit: usize) -> Result<Page, LeaderboardError> {
        Ok(Page {
            entries: self
                .ranked()
                .into_iter()
                .filter(|e| after_cursor(e, cursor))
                .take(limit)
                .collect(),
        })
    }

    fn page_before(&self, cursor: &PageCursor, limit: usize) -> Result<Page, LeaderboardError> {
        let preceding: Vec<LeaderboardEntry> = self
            .ranked()
            .into_iter()
            .filter(|e| before_cursor(e, cursor))
            .collect();
        let skip = preceding.len().saturating_sub(limit);
        Ok(Page {
            entries: preceding.into_iter().skip(skip).collect(),
        })
    }

    fn count(&self) -> Result<usize, LeaderboardError> {
        Ok(self.entries.len())
    }
}
