// Storage schema and database management

use lemoteur::{GradeAverage, RecommendationStatus, Track};
use rusqlite::types::Type;
use rusqlite::{Connection, Result as SqliteResult, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Whether to enable WAL mode
    pub wal_enabled: bool,

    /// Cache size in pages
    pub cache_size_pages: Option<usize>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            wal_enabled: true,
            cache_size_pages: Some(10000),
        }
    }
}

/// Main storage interface
pub struct Storage {
    conn: Connection,
    config: StorageConfig,
}

impl Storage {
    /// Open storage with default config
    pub fn open<P: AsRef<Path>>(path: P) -> SqliteResult<Self> {
        Self::open_with_config(path, StorageConfig::default())
    }

    /// Open storage with custom config
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: StorageConfig) -> SqliteResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, config)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> SqliteResult<Self> {
        let config = StorageConfig {
            wal_enabled: false,
            ..StorageConfig::default()
        };
        Self::from_connection(Connection::open_in_memory()?, config)
    }

    fn from_connection(conn: Connection, config: StorageConfig) -> SqliteResult<Self> {
        // Cascading deletes rely on this
        conn.pragma_update(None, "foreign_keys", "ON")?;

        if config.wal_enabled {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }

        if let Some(cache_size) = config.cache_size_pages {
            conn.pragma_update(None, "cache_size", cache_size)?;
        }

        let storage = Self { conn, config };
        storage.initialize_schema()?;

        Ok(storage)
    }

    /// Initialize database schema
    fn initialize_schema(&self) -> SqliteResult<()> {
        self.conn.execute_batch(
            r#"
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL,
    strand TEXT NOT NULL,
    gwa REAL NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS courses (
    course_id INTEGER PRIMARY KEY AUTOINCREMENT,
    course_name TEXT NOT NULL,
    description TEXT,
    required_strand TEXT NOT NULL,
    minimum_gwa REAL NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS tests (
    test_id INTEGER PRIMARY KEY AUTOINCREMENT,
    test_name TEXT NOT NULL,
    description TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS questions (
    question_id INTEGER PRIMARY KEY AUTOINCREMENT,
    test_id INTEGER NOT NULL,
    question_text TEXT NOT NULL,
    trait_tag TEXT NOT NULL,
    question_order INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    FOREIGN KEY (test_id) REFERENCES tests(test_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS options (
    option_id INTEGER PRIMARY KEY AUTOINCREMENT,
    question_id INTEGER NOT NULL,
    option_text TEXT NOT NULL,
    trait_impact REAL NOT NULL,
    option_order INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    FOREIGN KEY (question_id) REFERENCES questions(question_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS recommendations (
    recommendation_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    course_id INTEGER NOT NULL,
    confidence_score REAL NOT NULL CHECK (confidence_score >= 0 AND confidence_score <= 100),
    reasoning TEXT,
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'accepted', 'rejected')),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(user_id) ON DELETE CASCADE,
    FOREIGN KEY (course_id) REFERENCES courses(course_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_users_strand ON users(strand);
CREATE INDEX IF NOT EXISTS idx_courses_strand ON courses(required_strand);
CREATE INDEX IF NOT EXISTS idx_questions_test ON questions(test_id);
CREATE INDEX IF NOT EXISTS idx_options_question ON options(question_id);
CREATE INDEX IF NOT EXISTS idx_recommendations_user ON recommendations(user_id);
CREATE INDEX IF NOT EXISTS idx_recommendations_course ON recommendations(course_id);
CREATE INDEX IF NOT EXISTS idx_recommendations_status ON recommendations(status);
"#,
        )?;

        debug!("Schema initialized");
        Ok(())
    }

    /// Get the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Get mutable connection
    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Checkpoint the WAL into the main database file
    pub fn close(&mut self) -> SqliteResult<()> {
        if self.config.wal_enabled {
            self.conn
                .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        }
        Ok(())
    }
}

/// Current time as unix seconds
pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Read a track column
pub(crate) fn track_at(row: &Row<'_>, idx: usize) -> SqliteResult<Track> {
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a grade average column
pub(crate) fn grade_at(row: &Row<'_>, idx: usize) -> SqliteResult<GradeAverage> {
    let value: f64 = row.get(idx)?;
    GradeAverage::new(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Real, Box::new(e)))
}

/// Read a recommendation status column
pub(crate) fn status_at(row: &Row<'_>, idx: usize) -> SqliteResult<RecommendationStatus> {
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_storage_creation() {
        let temp_file = NamedTempFile::new().unwrap();
        let storage = Storage::open(temp_file.path());
        assert!(storage.is_ok());
    }

    #[test]
    fn test_schema_initialization() {
        let storage = Storage::open_in_memory().unwrap();

        let table_count: i64 = storage
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('users', 'courses', 'tests', 'questions', 'options', 'recommendations')",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(table_count, 6);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let storage = Storage::open_in_memory().unwrap();
        let enabled: i64 = storage
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_reopen_keeps_schema() {
        let temp_file = NamedTempFile::new().unwrap();
        {
            let mut storage = Storage::open(temp_file.path()).unwrap();
            storage
                .conn()
                .execute(
                    "INSERT INTO tests (test_name, description, created_at, updated_at) VALUES ('Aptitude', 'd', 0, 0)",
                    [],
                )
                .unwrap();
            storage.close().unwrap();
        }
        let storage = Storage::open(temp_file.path()).unwrap();
        let count: i64 = storage
            .conn()
            .query_row("SELECT COUNT(*) FROM tests", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
