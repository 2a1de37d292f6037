use crate::app_dirs::AppDirs;
use crate::category::Category;
use chrono::{DateTime, Local};
use itertools::Itertools;
use rusqlite::{params, Connection, Result};
use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

/// One answered question as stored in the history log
#[derive(Debug, Clone)]
pub struct AnswerRecord {
    pub guess: Category,
    pub actual: Category,
    pub was_correct: bool,
    pub response_ms: u64,
    pub image: String,
    pub timestamp: DateTime<Local>,
}

/// Per-category aggregate derived from the history log.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub category: Category,
    pub attempts: i64,
    pub miss_rate: f64,
    pub avg_response_ms: f64,
}

/// One finished session, as appended to the results log.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub when: DateTime<Local>,
    pub questions: u32,
    pub correct: u32,
    pub accuracy_pct: f64,
    pub mean_response_ms: f64,
}

/// History operations that cross more than one failure domain.
#[derive(Debug)]
pub enum HistoryError {
    Db(rusqlite::Error),
    Io(io::Error),
    Csv(csv::Error),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::Db(e) => write!(f, "history database error: {e}"),
            HistoryError::Io(e) => write!(f, "history file error: {e}"),
            HistoryError::Csv(e) => write!(f, "csv error: {e}"),
        }
    }
}

impl std::error::Error for HistoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HistoryError::Db(e) => Some(e),
            HistoryError::Io(e) => Some(e),
            HistoryError::Csv(e) => Some(e),
        }
    }
}

impl From<rusqlite::Error> for HistoryError {
    fn from(err: rusqlite::Error) -> Self {
        HistoryError::Db(err)
    }
}

impl From<io::Error> for HistoryError {
    fn from(err: io::Error) -> Self {
        HistoryError::Io(err)
    }
}

impl From<csv::Error> for HistoryError {
    fn from(err: csv::Error) -> Self {
        HistoryError::Csv(err)
    }
}

/// Database manager for the per-answer history log
#[derive(Debug)]
pub struct AnswerDb {
    conn: Connection,
}

impl AnswerDb {
    /// Initialize the database connection and create tables if needed
    pub fn new() -> Result<Self> {
        let db_path =
            AppDirs::answers_db_path().unwrap_or_else(|| PathBuf::from("sweepbench_answers.db"));
        Self::with_path(&db_path)
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }
        let conn = Connection::open(path)?;
        Self::init(&conn)?;
        Ok(AnswerDb { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(AnswerDb { conn })
    }

    fn init(conn: &Connection) -> Result<()> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS answers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                guess TEXT NOT NULL,
                actual TEXT NOT NULL,
                was_correct BOOLEAN NOT NULL,
                response_ms INTEGER NOT NULL,
                image TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_answers_actual ON answers(actual)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_answers_timestamp ON answers(timestamp)",
            [],
        )?;
        Ok(())
    }

    /// Record one answered question
    pub fn record_answer(&self, record: &AnswerRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO answers (guess, actual, was_correct, response_ms, image, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.guess.to_string(),
                record.actual.to_string(),
                record.was_correct,
                record.response_ms,
                record.image,
                record.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Aggregate miss rate and response time per actual category, in the
    /// fixed category order.
    pub fn category_summary(&self) -> Result<Vec<CategorySummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                actual,
                COUNT(*) as attempts,
                (SUM(CASE WHEN was_correct = 0 THEN 1 ELSE 0 END) * 100.0 / COUNT(*)) as miss_rate,
                AVG(response_ms) as avg_response
            FROM answers
            GROUP BY actual
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let actual_str: String = row.get(0)?;
            let category = Category::from_token(&actual_str).ok_or_else(|| {
                rusqlite::Error::InvalidColumnType(
                    0,
                    "actual".to_string(),
                    rusqlite::types::Type::Text,
                )
            })?;
            Ok(CategorySummary {
                category,
                attempts: row.get(1)?,
                miss_rate: row.get(2)?,
                avg_response_ms: row.get(3)?,
            })
        })?;

        let mut summary = Vec::new();
        for row in rows {
            summary.push(row?);
        }
        Ok(summary
            .into_iter()
            .sorted_by_key(|s| s.category.index())
            .collect())
    }

    /// All recorded response times, oldest first.
    pub fn response_times(&self) -> Result<Vec<f64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT response_ms FROM answers ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, f64>(0))?;
        let mut times = Vec::new();
        for row in rows {
            times.push(row?);
        }
        Ok(times)
    }

    pub fn count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM answers", [], |row| row.get(0))
    }

    /// Clear the whole log (user reset)
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM answers", [])?;
        Ok(())
    }

    /// Dump the raw log to a CSV file; returns the number of rows written.
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> std::result::Result<u64, HistoryError> {
        let mut stmt = self.conn.prepare(
            "SELECT guess, actual, was_correct, response_ms, image, timestamp FROM answers ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
                row.get::<_, u64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut writer = csv::Writer::from_path(path.as_ref())?;
        writer.write_record(["guess", "actual", "correct", "response_ms", "image", "timestamp"])?;
        let mut written = 0;
        for row in rows {
            let (guess, actual, correct, response_ms, image, timestamp) = row?;
            writer.write_record([
                guess,
                actual,
                correct.to_string(),
                response_ms.to_string(),
                image,
                timestamp,
            ])?;
            written += 1;
        }
        writer.flush()?;
        Ok(written)
    }
}

/// Appends one CSV row per finished session.
#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: PathBuf,
}

impl ResultsLog {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path =
            AppDirs::results_log_path().unwrap_or_else(|| PathBuf::from("sweepbench_results.csv"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn append(&self, summary: &SessionSummary) -> std::result::Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Emit the header only on first creation.
        let needs_header = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(["date", "questions", "correct", "accuracy", "mean_response_ms"])?;
        }
        writer.write_record([
            summary.when.format("%c").to_string(),
            summary.questions.to_string(),
            summary.correct.to_string(),
            format!("{:.1}", summary.accuracy_pct),
            format!("{:.0}", summary.mean_response_ms),
        ])?;
        writer.flush()?;
        Ok(())
    }
}
