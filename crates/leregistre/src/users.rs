//! User (learner) records.
//!
//! Users carry the track and grade average the engine reads as a
//! [`lemoteur::LearnerProfile`].

use std::collections::BTreeMap;

use lemoteur::{GradeAverage, LearnerProfile, Track, UserId};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StorageError};
use crate::filters::Conditions;
use crate::pagination::{Page, PageRequest, Pagination};
use crate::schema::{grade_at, now, track_at, Storage};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// GWA at or above which a learner counts as a high achiever
pub const HIGH_ACHIEVER_GWA: f64 = 95.0;

const USER_COLUMNS: &str = "user_id, full_name, email, strand, gwa, created_at, updated_at";

/// Stored user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Database ID
    pub user_id: UserId,
    /// Full name
    pub full_name: String,
    /// Unique email address
    pub email: String,
    /// Academic track
    pub strand: Track,
    /// Grade average
    pub gwa: GradeAverage,
    /// Creation time (unix seconds)
    pub created_at: i64,
    /// Last update time (unix seconds)
    pub updated_at: i64,
}

impl UserRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            full_name: row.get(1)?,
            email: row.get(2)?,
            strand: track_at(row, 3)?,
            gwa: grade_at(row, 4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    /// The attributes the engine scores on
    pub fn profile(&self) -> LearnerProfile {
        LearnerProfile {
            id: self.user_id,
            track: self.strand,
            grade_average: self.gwa,
        }
    }
}

/// Input for creating a user
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    /// Full name
    pub full_name: String,
    /// Email address
    pub email: String,
    /// Academic track
    pub strand: Track,
    /// Grade average
    pub gwa: GradeAverage,
}

impl NewUser {
    /// Check text fields
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if self.full_name.trim().is_empty() {
            errors.push("Full name is required".to_string());
        }
        if !EMAIL_PATTERN.is_match(self.email.trim()) {
            errors.push("Valid email is required".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(StorageError::Validation(errors))
        }
    }
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    /// New full name
    pub full_name: Option<String>,
    /// New email address
    pub email: Option<String>,
    /// New track
    pub strand: Option<Track>,
    /// New grade average
    pub gwa: Option<GradeAverage>,
}

impl UserUpdate {
    /// Check present text fields
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if matches!(&self.full_name, Some(name) if name.trim().is_empty()) {
            errors.push("Full name cannot be empty".to_string());
        }
        if matches!(&self.email, Some(email) if !EMAIL_PATTERN.is_match(email.trim())) {
            errors.push("Valid email is required".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(StorageError::Validation(errors))
        }
    }
}

/// List filters
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Substring of name or email (case-insensitive)
    pub search: Option<String>,
    /// Exact track
    pub strand: Option<Track>,
}

/// GWA statistics over all users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GwaStatistics {
    /// Mean GWA, two decimals
    pub average_gwa: Option<f64>,
    /// Lowest GWA
    pub min_gwa: Option<f64>,
    /// Highest GWA
    pub max_gwa: Option<f64>,
    /// Users at or above 95
    pub high_achievers: i64,
}

/// User overview statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    /// Number of users
    pub total_users: i64,
    /// Users per track
    pub strand_distribution: BTreeMap<String, i64>,
    /// GWA statistics
    pub gwa_statistics: GwaStatistics,
    /// Five most recently created users
    pub recent_users: Vec<UserRecord>,
}

/// User store for CRUD operations
pub struct UserStore<'a> {
    storage: &'a mut Storage,
}

impl<'a> UserStore<'a> {
    /// Create a new user store
    pub fn new(storage: &'a mut Storage) -> Self {
        Self { storage }
    }

    /// Insert a user
    pub fn create(&mut self, user: &NewUser) -> Result<UserId> {
        user.validate()?;
        let timestamp = now();
        self.storage.conn().execute(
            "INSERT INTO users (full_name, email, strand, gwa, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.full_name.trim(),
                user.email.trim(),
                user.strand.as_str(),
                user.gwa.value(),
                timestamp,
                timestamp,
            ],
        )?;
        let id = self.storage.conn().last_insert_rowid();
        debug!("Created user {}", id);
        Ok(id)
    }

    /// Get user by ID
    pub fn get(&self, id: UserId) -> Result<UserRecord> {
        self.storage
            .conn()
            .query_row(
                &format!("SELECT {} FROM users WHERE user_id = ?1", USER_COLUMNS),
                params![id],
                UserRecord::from_row,
            )
            .optional()?
            .ok_or(StorageError::not_found("user", id))
    }

    /// Apply a partial update
    pub fn update(&mut self, id: UserId, update: &UserUpdate) -> Result<()> {
        update.validate()?;
        let changed = self.storage.conn().execute(
            "UPDATE users SET
                full_name = COALESCE(?1, full_name),
                email = COALESCE(?2, email),
                strand = COALESCE(?3, strand),
                gwa = COALESCE(?4, gwa),
                updated_at = ?5
             WHERE user_id = ?6",
            params![
                update.full_name.as_deref().map(str::trim),
                update.email.as_deref().map(str::trim),
                update.strand.map(|s| s.as_str()),
                update.gwa.map(|g| g.value()),
                now(),
                id,
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::not_found("user", id));
        }
        Ok(())
    }

    /// Delete a user and, by cascade, their recommendations
    pub fn delete(&mut self, id: UserId) -> Result<()> {
        let changed = self
            .storage
            .conn()
            .execute("DELETE FROM users WHERE user_id = ?1", params![id])?;
        if changed == 0 {
            return Err(StorageError::not_found("user", id));
        }
        Ok(())
    }

    /// List users, newest first
    pub fn list(&self, filter: &UserFilter, request: PageRequest) -> Result<Page<UserRecord>> {
        let mut conditions = Conditions::new();
        if let Some(search) = &filter.search {
            conditions.search(&["full_name", "email"], search);
        }
        if let Some(strand) = filter.strand {
            conditions.eq("strand", strand.as_str().to_string());
        }
        let where_sql = conditions.where_sql();

        let total: i64 = self.storage.conn().query_row(
            &format!("SELECT COUNT(*) FROM users{}", where_sql),
            params_from_iter(conditions.values()),
            |row| row.get(0),
        )?;

        let mut stmt = self.storage.conn().prepare(&format!(
            "SELECT {} FROM users{} ORDER BY created_at DESC, user_id DESC LIMIT ? OFFSET ?",
            USER_COLUMNS, where_sql
        ))?;
        let items = stmt
            .query_map(
                params_from_iter(conditions.paged_values(request)),
                UserRecord::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Page {
            items,
            pagination: Pagination::new(request, total as u64),
        })
    }

    /// Overview statistics
    pub fn stats(&self) -> Result<UserStats> {
        let conn = self.storage.conn();
        let total_users: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;

        let mut stmt = conn.prepare("SELECT strand, COUNT(*) FROM users GROUP BY strand")?;
        let strand_distribution = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;

        let gwa_statistics = conn.query_row(
            "SELECT
                ROUND(AVG(gwa), 2),
                MIN(gwa),
                MAX(gwa),
                COUNT(CASE WHEN gwa >= ?1 THEN 1 END)
             FROM users",
            params![HIGH_ACHIEVER_GWA],
            |row| {
                Ok(GwaStatistics {
                    average_gwa: row.get(0)?,
                    min_gwa: row.get(1)?,
                    max_gwa: row.get(2)?,
                    high_achievers: row.get(3)?,
                })
            },
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC, user_id DESC LIMIT 5",
            USER_COLUMNS
        ))?;
        let recent_users = stmt
            .query_map([], UserRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(UserStats {
            total_users,
            strand_distribution,
            gwa_statistics,
            recent_users,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str, strand: Track, gwa: f64) -> NewUser {
        NewUser {
            full_name: name.to_string(),
            email: email.to_string(),
            strand,
            gwa: GradeAverage::new(gwa).unwrap(),
        }
    }

    #[test]
    fn test_user_insert_and_get() {
        let mut storage = Storage::open_in_memory().unwrap();
        let mut store = UserStore::new(&mut storage);

        let id = store
            .create(&new_user("Ana Cruz", "ana@example.com", Track::Stem, 91.5))
            .unwrap();
        let user = store.get(id).unwrap();
        assert_eq!(user.full_name, "Ana Cruz");
        assert_eq!(user.strand, Track::Stem);
        assert_eq!(user.profile().grade_average.value(), 91.5);
    }

    #[test]
    fn test_duplicate_email_is_constraint_violation() {
        let mut storage = Storage::open_in_memory().unwrap();
        let mut store = UserStore::new(&mut storage);
        store
            .create(&new_user("Ana", "ana@example.com", Track::Stem, 90.0))
            .unwrap();
        let err = store
            .create(&new_user("Other Ana", "ana@example.com", Track::Abm, 80.0))
            .unwrap_err();
        assert!(matches!(err, StorageError::ConstraintViolation(_)));
    }

    #[test]
    fn test_invalid_email_rejected() {
        let mut storage = Storage::open_in_memory().unwrap();
        let mut store = UserStore::new(&mut storage);
        let err = store
            .create(&new_user(" ", "not-an-email", Track::Stem, 90.0))
            .unwrap_err();
        match err {
            StorageError::Validation(messages) => assert_eq!(messages.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut storage = Storage::open_in_memory().unwrap();
        let mut store = UserStore::new(&mut storage);
        let id = store
            .create(&new_user("Ben", "ben@example.com", Track::Humss, 82.0))
            .unwrap();

        store
            .update(
                id,
                &UserUpdate {
                    gwa: Some(GradeAverage::new(88.0).unwrap()),
                    ..UserUpdate::default()
                },
            )
            .unwrap();

        let user = store.get(id).unwrap();
        assert_eq!(user.gwa.value(), 88.0);
        assert_eq!(user.full_name, "Ben");
        assert_eq!(user.strand, Track::Humss);
    }

    #[test]
    fn test_missing_user_not_found() {
        let mut storage = Storage::open_in_memory().unwrap();
        let mut store = UserStore::new(&mut storage);
        assert!(matches!(store.get(42), Err(StorageError::NotFound { .. })));
        assert!(matches!(
            store.update(42, &UserUpdate::default()),
            Err(StorageError::NotFound { .. })
        ));
        assert!(matches!(store.delete(42), Err(StorageError::NotFound { .. })));
    }

    #[test]
    fn test_list_filters_and_paginates() {
        let mut storage = Storage::open_in_memory().unwrap();
        let mut store = UserStore::new(&mut storage);
        for i in 0..12 {
            let strand = if i % 3 == 0 { Track::Abm } else { Track::Stem };
            store
                .create(&new_user(
                    &format!("Learner {}", i),
                    &format!("learner{}@example.com", i),
                    strand,
                    80.0,
                ))
                .unwrap();
        }

        let page = store
            .list(&UserFilter::default(), PageRequest::new(Some(2), Some(5)).unwrap())
            .unwrap();
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.pagination.total, 12);
        assert_eq!(page.pagination.pages, 3);

        let abm = store
            .list(
                &UserFilter {
                    strand: Some(Track::Abm),
                    ..UserFilter::default()
                },
                PageRequest::default(),
            )
            .unwrap();
        assert_eq!(abm.pagination.total, 4);

        let searched = store
            .list(
                &UserFilter {
                    search: Some("LEARNER1".to_string()),
                    ..UserFilter::default()
                },
                PageRequest::default(),
            )
            .unwrap();
        // Learner 1, 10, 11
        assert_eq!(searched.pagination.total, 3);
    }

    #[test]
    fn test_stats() {
        let mut storage = Storage::open_in_memory().unwrap();
        let mut store = UserStore::new(&mut storage);
        store
            .create(&new_user("A", "a@example.com", Track::Stem, 96.0))
            .unwrap();
        store
            .create(&new_user("B", "b@example.com", Track::Stem, 80.0))
            .unwrap();
        store
            .create(&new_user("C", "c@example.com", Track::Tvl, 76.0))
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.strand_distribution.get("STEM"), Some(&2));
        assert_eq!(stats.gwa_statistics.high_achievers, 1);
        assert_eq!(stats.gwa_statistics.average_gwa, Some(84.0));
        assert_eq!(stats.gwa_statistics.max_gwa, Some(96.0));
        assert_eq!(stats.recent_users.len(), 3);
    }
}
