//! Recommendation records.
//!
//! Rows written here and rows written by the engine through
//! [`lemoteur::RecordStore`] share the same SQL helpers, so both paths
//! produce identical records.

use std::collections::BTreeMap;

use lemoteur::{
    ConfidenceScore, CourseId, GradeAverage, NewRecommendation, RecommendationId,
    RecommendationStatus, Track, UserId,
};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StorageError};
use crate::filters::Conditions;
use crate::pagination::{Page, PageRequest, Pagination};
use crate::schema::{grade_at, now, status_at, track_at, Storage};

const RECORD_COLUMNS: &str = "r.recommendation_id, r.user_id, r.course_id, r.confidence_score, \
     r.reasoning, r.status, r.created_at, r.updated_at";

/// Columns of [`RecommendationRecord`]; joined columns start here
const JOINED_START: usize = 8;

/// Stored recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    /// Database ID
    pub recommendation_id: RecommendationId,
    /// Learner
    pub user_id: UserId,
    /// Recommended course
    pub course_id: CourseId,
    /// Confidence score
    pub confidence_score: ConfidenceScore,
    /// Justification text
    pub reasoning: Option<String>,
    /// Current status
    pub status: RecommendationStatus,
    /// Creation time (unix seconds)
    pub created_at: i64,
    /// Last update time (unix seconds)
    pub updated_at: i64,
}

impl RecommendationRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            recommendation_id: row.get(0)?,
            user_id: row.get(1)?,
            course_id: row.get(2)?,
            confidence_score: score_at(row, 3)?,
            reasoning: row.get(4)?,
            status: status_at(row, 5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

/// Listed recommendation with learner and course names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationListItem {
    /// Recommendation row
    #[serde(flatten)]
    pub record: RecommendationRecord,
    /// Learner name
    pub user_name: String,
    /// Learner email
    pub user_email: String,
    /// Course name
    pub course_name: String,
    /// Course track
    pub required_strand: Track,
}

/// One recommendation with everything needed to judge it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationDetail {
    /// Recommendation row
    #[serde(flatten)]
    pub record: RecommendationRecord,
    /// Learner name
    pub user_name: String,
    /// Learner email
    pub user_email: String,
    /// Learner GWA
    pub gwa: GradeAverage,
    /// Learner track
    pub strand: Track,
    /// Course name
    pub course_name: String,
    /// Course description
    pub course_description: Option<String>,
    /// Course track
    pub required_strand: Track,
    /// Course minimum GWA
    pub minimum_gwa: GradeAverage,
}

/// A learner's recommendation with its course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecommendation {
    /// Recommendation row
    #[serde(flatten)]
    pub record: RecommendationRecord,
    /// Course name
    pub course_name: String,
    /// Course track
    pub required_strand: Track,
    /// Course minimum GWA
    pub minimum_gwa: GradeAverage,
}

/// A course's recommendation with its learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecommendation {
    /// Recommendation row
    #[serde(flatten)]
    pub record: RecommendationRecord,
    /// Learner name
    pub user_name: String,
    /// Learner email
    pub user_email: String,
    /// Learner track
    pub strand: Track,
    /// Learner GWA
    pub gwa: GradeAverage,
}

/// Input for a hand-written recommendation
#[derive(Debug, Clone, Deserialize)]
pub struct ManualRecommendation {
    /// Learner
    pub user_id: UserId,
    /// Course
    pub course_id: CourseId,
    /// Confidence score
    pub confidence_score: ConfidenceScore,
    /// Justification text
    pub reasoning: String,
}

impl ManualRecommendation {
    /// Check text fields
    pub fn validate(&self) -> Result<()> {
        if self.reasoning.trim().is_empty() {
            return Err(StorageError::invalid("Reasoning is required"));
        }
        Ok(())
    }
}

/// List filters
#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationFilter {
    /// Exact status
    pub status: Option<RecommendationStatus>,
    /// Exact learner
    pub user_id: Option<UserId>,
    /// Exact course
    pub course_id: Option<CourseId>,
}

/// Per-course recommendation rollup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRollup {
    /// Course ID
    pub course_id: CourseId,
    /// Course name
    pub course_name: String,
    /// All recommendations for the course
    pub total_recommendations: i64,
    /// Accepted
    pub accepted_count: i64,
    /// Rejected
    pub rejected_count: i64,
    /// Pending
    pub pending_count: i64,
    /// Mean confidence, two decimals
    pub avg_confidence: Option<f64>,
}

/// Confidence score statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceStats {
    /// Mean, two decimals
    pub avg_confidence: Option<f64>,
    /// Lowest score
    pub min_confidence: Option<f64>,
    /// Highest score
    pub max_confidence: Option<f64>,
    /// Sample standard deviation, two decimals
    pub std_confidence: Option<f64>,
}

/// Recent recommendation activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentRecommendation {
    /// Recommendation ID
    pub recommendation_id: RecommendationId,
    /// Learner name
    pub user_name: String,
    /// Course name
    pub course_name: String,
    /// Current status
    pub status: RecommendationStatus,
    /// Confidence score
    pub confidence_score: f64,
    /// Creation time (unix seconds)
    pub created_at: i64,
}

/// Recommendation overview statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationStats {
    /// Number of recommendations
    pub total_recommendations: i64,
    /// Recommendations per status
    pub status_distribution: BTreeMap<String, i64>,
    /// Top ten courses by recommendation count
    pub course_recommendations: Vec<CourseRollup>,
    /// Confidence statistics
    pub confidence_stats: ConfidenceStats,
    /// Ten most recent recommendations
    pub recent_activity: Vec<RecentRecommendation>,
}

/// Recommendation store for CRUD operations
pub struct RecommendationStore<'a> {
    storage: &'a mut Storage,
}

impl<'a> RecommendationStore<'a> {
    /// Create a new recommendation store
    pub fn new(storage: &'a mut Storage) -> Self {
        Self { storage }
    }

    /// Insert a pending recommendation for an existing learner and course
    pub fn create(&mut self, recommendation: &ManualRecommendation) -> Result<RecommendationId> {
        recommendation.validate()?;
        let conn = self.storage.conn();
        ensure_exists(conn, "users", "user_id", "user", recommendation.user_id)?;
        ensure_exists(conn, "courses", "course_id", "course", recommendation.course_id)?;

        let record = NewRecommendation {
            profile_id: recommendation.user_id,
            program_id: recommendation.course_id,
            score: recommendation.confidence_score,
            reasoning: recommendation.reasoning.trim().to_string(),
            status: RecommendationStatus::Pending,
        };
        let id = insert_record(conn, &record, now())?;
        debug!("Created recommendation {}", id);
        Ok(id)
    }

    /// Get a recommendation row
    pub fn get(&self, id: RecommendationId) -> Result<RecommendationRecord> {
        self.storage
            .conn()
            .query_row(
                &format!(
                    "SELECT {} FROM recommendations r WHERE r.recommendation_id = ?1",
                    RECORD_COLUMNS
                ),
                params![id],
                RecommendationRecord::from_row,
            )
            .optional()?
            .ok_or(StorageError::not_found("recommendation", id))
    }

    /// Get a recommendation joined with its learner and course
    pub fn detail(&self, id: RecommendationId) -> Result<RecommendationDetail> {
        self.storage
            .conn()
            .query_row(
                &format!(
                    "SELECT {}, u.full_name, u.email, u.gwa, u.strand,
                            c.course_name, c.description, c.required_strand, c.minimum_gwa
                     FROM recommendations r
                     JOIN users u ON r.user_id = u.user_id
                     JOIN courses c ON r.course_id = c.course_id
                     WHERE r.recommendation_id = ?1",
                    RECORD_COLUMNS
                ),
                params![id],
                |row| {
                    let j = JOINED_START;
                    Ok(RecommendationDetail {
                        record: RecommendationRecord::from_row(row)?,
                        user_name: row.get(j)?,
                        user_email: row.get(j + 1)?,
                        gwa: grade_at(row, j + 2)?,
                        strand: track_at(row, j + 3)?,
                        course_name: row.get(j + 4)?,
                        course_description: row.get(j + 5)?,
                        required_strand: track_at(row, j + 6)?,
                        minimum_gwa: grade_at(row, j + 7)?,
                    })
                },
            )
            .optional()?
            .ok_or(StorageError::not_found("recommendation", id))
    }

    /// Set the status of a recommendation
    pub fn update_status(&mut self, id: RecommendationId, status: RecommendationStatus) -> Result<()> {
        update_status(self.storage.conn(), id, status)
    }

    /// Delete a recommendation
    pub fn delete(&mut self, id: RecommendationId) -> Result<()> {
        delete_record(self.storage.conn(), id)
    }

    /// List recommendations with names, newest first
    pub fn list(
        &self,
        filter: RecommendationFilter,
        request: PageRequest,
    ) -> Result<Page<RecommendationListItem>> {
        let mut conditions = Conditions::new();
        if let Some(status) = filter.status {
            conditions.eq("r.status", status.as_str().to_string());
        }
        if let Some(user_id) = filter.user_id {
            conditions.eq("r.user_id", user_id);
        }
        if let Some(course_id) = filter.course_id {
            conditions.eq("r.course_id", course_id);
        }
        let where_sql = conditions.where_sql();

        let total: i64 = self.storage.conn().query_row(
            &format!("SELECT COUNT(*) FROM recommendations r{}", where_sql),
            params_from_iter(conditions.values()),
            |row| row.get(0),
        )?;

        let mut stmt = self.storage.conn().prepare(&format!(
            "SELECT {}, u.full_name, u.email, c.course_name, c.required_strand
             FROM recommendations r
             JOIN users u ON r.user_id = u.user_id
             JOIN courses c ON r.course_id = c.course_id{}
             ORDER BY r.created_at DESC, r.recommendation_id DESC
             LIMIT ? OFFSET ?",
            RECORD_COLUMNS, where_sql
        ))?;
        let items = stmt
            .query_map(params_from_iter(conditions.paged_values(request)), |row| {
                let j = JOINED_START;
                Ok(RecommendationListItem {
                    record: RecommendationRecord::from_row(row)?,
                    user_name: row.get(j)?,
                    user_email: row.get(j + 1)?,
                    course_name: row.get(j + 2)?,
                    required_strand: track_at(row, j + 3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Page {
            items,
            pagination: Pagination::new(request, total as u64),
        })
    }

    /// All recommendations for a learner, newest first
    pub fn for_user(&self, user_id: UserId) -> Result<Vec<UserRecommendation>> {
        let mut stmt = self.storage.conn().prepare(&format!(
            "SELECT {}, c.course_name, c.required_strand, c.minimum_gwa
             FROM recommendations r
             JOIN courses c ON r.course_id = c.course_id
             WHERE r.user_id = ?1
             ORDER BY r.created_at DESC, r.recommendation_id DESC",
            RECORD_COLUMNS
        ))?;
        let items = stmt
            .query_map(params![user_id], |row| {
                let j = JOINED_START;
                Ok(UserRecommendation {
                    record: RecommendationRecord::from_row(row)?,
                    course_name: row.get(j)?,
                    required_strand: track_at(row, j + 1)?,
                    minimum_gwa: grade_at(row, j + 2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// All recommendations for a course, newest first
    pub fn for_course(&self, course_id: CourseId) -> Result<Vec<CourseRecommendation>> {
        let mut stmt = self.storage.conn().prepare(&format!(
            "SELECT {}, u.full_name, u.email, u.strand, u.gwa
             FROM recommendations r
             JOIN users u ON r.user_id = u.user_id
             WHERE r.course_id = ?1
             ORDER BY r.created_at DESC, r.recommendation_id DESC",
            RECORD_COLUMNS
        ))?;
        let items = stmt
            .query_map(params![course_id], |row| {
                let j = JOINED_START;
                Ok(CourseRecommendation {
                    record: RecommendationRecord::from_row(row)?,
                    user_name: row.get(j)?,
                    user_email: row.get(j + 1)?,
                    strand: track_at(row, j + 2)?,
                    gwa: grade_at(row, j + 3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// Overview statistics
    pub fn stats(&self) -> Result<RecommendationStats> {
        let conn = self.storage.conn();
        let total_recommendations: i64 =
            conn.query_row("SELECT COUNT(*) FROM recommendations", [], |row| row.get(0))?;

        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM recommendations GROUP BY status")?;
        let status_distribution = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;

        let mut stmt = conn.prepare(
            "SELECT
                c.course_id,
                c.course_name,
                COUNT(r.recommendation_id) AS total_recommendations,
                COUNT(CASE WHEN r.status = 'accepted' THEN 1 END),
                COUNT(CASE WHEN r.status = 'rejected' THEN 1 END),
                COUNT(CASE WHEN r.status = 'pending' THEN 1 END),
                ROUND(AVG(r.confidence_score), 2)
             FROM courses c
             JOIN recommendations r ON c.course_id = r.course_id
             GROUP BY c.course_id
             ORDER BY total_recommendations DESC, c.course_id
             LIMIT 10",
        )?;
        let course_recommendations = stmt
            .query_map([], |row| {
                Ok(CourseRollup {
                    course_id: row.get(0)?,
                    course_name: row.get(1)?,
                    total_recommendations: row.get(2)?,
                    accepted_count: row.get(3)?,
                    rejected_count: row.get(4)?,
                    pending_count: row.get(5)?,
                    avg_confidence: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare("SELECT confidence_score FROM recommendations")?;
        let scores = stmt
            .query_map([], |row| row.get::<_, f64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let confidence_stats = confidence_stats(&scores);

        let mut stmt = conn.prepare(
            "SELECT r.recommendation_id, u.full_name, c.course_name, r.status,
                    r.confidence_score, r.created_at
             FROM recommendations r
             JOIN users u ON r.user_id = u.user_id
             JOIN courses c ON r.course_id = c.course_id
             ORDER BY r.created_at DESC, r.recommendation_id DESC
             LIMIT 10",
        )?;
        let recent_activity = stmt
            .query_map([], |row| {
                Ok(RecentRecommendation {
                    recommendation_id: row.get(0)?,
                    user_name: row.get(1)?,
                    course_name: row.get(2)?,
                    status: status_at(row, 3)?,
                    confidence_score: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(RecommendationStats {
            total_recommendations,
            status_distribution,
            course_recommendations,
            confidence_stats,
            recent_activity,
        })
    }
}

/// SQLite has no STDDEV aggregate
fn confidence_stats(scores: &[f64]) -> ConfidenceStats {
    if scores.is_empty() {
        return ConfidenceStats {
            avg_confidence: None,
            min_confidence: None,
            max_confidence: None,
            std_confidence: None,
        };
    }
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let std = (scores.len() > 1).then(|| {
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0);
        round2(variance.sqrt())
    });
    ConfidenceStats {
        avg_confidence: Some(round2(mean)),
        min_confidence: Some(min),
        max_confidence: Some(max),
        std_confidence: std,
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn score_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<ConfidenceScore> {
    let value: f64 = row.get(idx)?;
    ConfidenceScore::new(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Real, Box::new(e)))
}

fn ensure_exists(
    conn: &Connection,
    table: &str,
    key: &str,
    entity: &'static str,
    id: i64,
) -> Result<()> {
    let exists: bool = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1)", table, key),
        params![id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(StorageError::not_found(entity, id))
    }
}

/// Insert one recommendation row
pub(crate) fn insert_record(
    conn: &Connection,
    record: &NewRecommendation,
    timestamp: i64,
) -> Result<RecommendationId> {
    conn.prepare_cached(
        "INSERT INTO recommendations
            (user_id, course_id, confidence_score, reasoning, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?
    .execute(params![
        record.profile_id,
        record.program_id,
        record.score.value(),
        record.reasoning,
        record.status.as_str(),
        timestamp,
        timestamp,
    ])?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn update_status(
    conn: &Connection,
    id: RecommendationId,
    status: RecommendationStatus,
) -> Result<()> {
    let changed = conn.execute(
        "UPDATE recommendations SET status = ?1, updated_at = ?2 WHERE recommendation_id = ?3",
        params![status.as_str(), now(), id],
    )?;
    if changed == 0 {
        return Err(StorageError::not_found("recommendation", id));
    }
    Ok(())
}

pub(crate) fn delete_record(conn: &Connection, id: RecommendationId) -> Result<()> {
    let changed = conn.execute(
        "DELETE FROM recommendations WHERE recommendation_id = ?1",
        params![id],
    )?;
    if changed == 0 {
        return Err(StorageError::not_found("recommendation", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::courses::{CourseStore, NewCourse};
    use crate::users::{NewUser, UserStore};

    fn fixture() -> (Storage, UserId, CourseId) {
        let mut storage = Storage::open_in_memory().unwrap();
        let user_id = UserStore::new(&mut storage)
            .create(&NewUser {
                full_name: "Ana Cruz".to_string(),
                email: "ana@example.com".to_string(),
                strand: Track::Stem,
                gwa: GradeAverage::new(90.0).unwrap(),
            })
            .unwrap();
        let course_id = CourseStore::new(&mut storage)
            .create(&NewCourse {
                course_name: "BS Computer Science".to_string(),
                description: "Computing".to_string(),
                required_strand: Track::Stem,
                minimum_gwa: GradeAverage::new(85.0).unwrap(),
            })
            .unwrap();
        (storage, user_id, course_id)
    }

    fn manual(user_id: UserId, course_id: CourseId, score: f64) -> ManualRecommendation {
        ManualRecommendation {
            user_id,
            course_id,
            confidence_score: ConfidenceScore::new(score).unwrap(),
            reasoning: "Counselor pick".to_string(),
        }
    }

    #[test]
    fn test_manual_create_is_pending() {
        let (mut storage, user_id, course_id) = fixture();
        let mut store = RecommendationStore::new(&mut storage);
        let id = store.create(&manual(user_id, course_id, 72.5)).unwrap();

        let detail = store.detail(id).unwrap();
        assert_eq!(detail.record.status, RecommendationStatus::Pending);
        assert_eq!(detail.record.confidence_score.value(), 72.5);
        assert_eq!(detail.user_name, "Ana Cruz");
        assert_eq!(detail.course_name, "BS Computer Science");
        assert_eq!(detail.minimum_gwa.value(), 85.0);
    }

    #[test]
    fn test_manual_create_requires_existing_references() {
        let (mut storage, user_id, course_id) = fixture();
        let mut store = RecommendationStore::new(&mut storage);
        assert!(matches!(
            store.create(&manual(999, course_id, 70.0)),
            Err(StorageError::NotFound { entity: "user", .. })
        ));
        assert!(matches!(
            store.create(&manual(user_id, 999, 70.0)),
            Err(StorageError::NotFound { entity: "course", .. })
        ));
    }

    #[test]
    fn test_blank_reasoning_rejected() {
        let (mut storage, user_id, course_id) = fixture();
        let mut store = RecommendationStore::new(&mut storage);
        let mut rec = manual(user_id, course_id, 70.0);
        rec.reasoning = " ".to_string();
        assert!(matches!(store.create(&rec), Err(StorageError::Validation(_))));
    }

    #[test]
    fn test_status_update_and_filter() {
        let (mut storage, user_id, course_id) = fixture();
        let mut store = RecommendationStore::new(&mut storage);
        let first = store.create(&manual(user_id, course_id, 70.0)).unwrap();
        store.create(&manual(user_id, course_id, 80.0)).unwrap();

        store
            .update_status(first, RecommendationStatus::Accepted)
            .unwrap();

        let accepted = store
            .list(
                RecommendationFilter {
                    status: Some(RecommendationStatus::Accepted),
                    ..RecommendationFilter::default()
                },
                PageRequest::default(),
            )
            .unwrap();
        assert_eq!(accepted.pagination.total, 1);
        assert_eq!(accepted.items[0].record.recommendation_id, first);
        assert_eq!(accepted.items[0].required_strand, Track::Stem);

        let all = store
            .list(RecommendationFilter::default(), PageRequest::default())
            .unwrap();
        assert_eq!(all.pagination.total, 2);
    }

    #[test]
    fn test_missing_recommendation() {
        let (mut storage, _, _) = fixture();
        let mut store = RecommendationStore::new(&mut storage);
        assert!(matches!(store.get(5), Err(StorageError::NotFound { .. })));
        assert!(matches!(
            store.update_status(5, RecommendationStatus::Rejected),
            Err(StorageError::NotFound { .. })
        ));
        assert!(matches!(store.delete(5), Err(StorageError::NotFound { .. })));
    }

    #[test]
    fn test_by_user_and_course() {
        let (mut storage, user_id, course_id) = fixture();
        let mut store = RecommendationStore::new(&mut storage);
        store.create(&manual(user_id, course_id, 70.0)).unwrap();

        let by_user = store.for_user(user_id).unwrap();
        assert_eq!(by_user.len(), 1);
        assert_eq!(by_user[0].course_name, "BS Computer Science");

        let by_course = store.for_course(course_id).unwrap();
        assert_eq!(by_course.len(), 1);
        assert_eq!(by_course[0].user_email, "ana@example.com");

        assert!(store.for_user(404).unwrap().is_empty());
    }

    #[test]
    fn test_stats() {
        let (mut storage, user_id, course_id) = fixture();
        let mut store = RecommendationStore::new(&mut storage);
        let id = store.create(&manual(user_id, course_id, 70.0)).unwrap();
        store.create(&manual(user_id, course_id, 80.0)).unwrap();
        store.update_status(id, RecommendationStatus::Rejected).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_recommendations, 2);
        assert_eq!(stats.status_distribution.get("rejected"), Some(&1));
        assert_eq!(stats.course_recommendations.len(), 1);
        assert_eq!(stats.course_recommendations[0].rejected_count, 1);
        assert_eq!(stats.course_recommendations[0].avg_confidence, Some(75.0));
        assert_eq!(stats.confidence_stats.avg_confidence, Some(75.0));
        assert_eq!(stats.confidence_stats.std_confidence, Some(7.07));
        assert_eq!(stats.recent_activity.len(), 2);
    }

    #[test]
    fn test_confidence_stats_empty_and_single() {
        assert_eq!(confidence_stats(&[]).avg_confidence, None);
        let single = confidence_stats(&[88.0]);
        assert_eq!(single.max_confidence, Some(88.0));
        assert_eq!(single.std_confidence, None);
    }

    #[test]
    fn test_user_delete_cascades() {
        let (mut storage, user_id, course_id) = fixture();
        let id = RecommendationStore::new(&mut storage)
            .create(&manual(user_id, course_id, 70.0))
            .unwrap();
        UserStore::new(&mut storage).delete(user_id).unwrap();
        assert!(matches!(
            RecommendationStore::new(&mut storage).get(id),
            Err(StorageError::NotFound { .. })
        ));
    }
}
