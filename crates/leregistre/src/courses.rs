//! Course catalog records.

use std::collections::BTreeMap;

use lemoteur::{CourseId, GradeAverage, Program, Track};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StorageError};
use crate::filters::Conditions;
use crate::pagination::{Page, PageRequest, Pagination};
use crate::schema::{grade_at, now, track_at, Storage};

const COURSE_COLUMNS: &str =
    "course_id, course_name, description, required_strand, minimum_gwa, created_at, updated_at";

/// Stored course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    /// Database ID
    pub course_id: CourseId,
    /// Display name
    pub course_name: String,
    /// Description
    pub description: Option<String>,
    /// Track a learner must belong to
    pub required_strand: Track,
    /// Minimum qualifying GWA
    pub minimum_gwa: GradeAverage,
    /// Creation time (unix seconds)
    pub created_at: i64,
    /// Last update time (unix seconds)
    pub updated_at: i64,
}

impl CourseRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            course_id: row.get(0)?,
            course_name: row.get(1)?,
            description: row.get(2)?,
            required_strand: track_at(row, 3)?,
            minimum_gwa: grade_at(row, 4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    /// The catalog entry as the engine sees it
    pub fn program(&self) -> Program {
        Program {
            id: self.course_id,
            name: self.course_name.clone(),
            required_track: self.required_strand,
            minimum_average: self.minimum_gwa,
        }
    }
}

/// Input for creating a course
#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
    /// Display name
    pub course_name: String,
    /// Description
    pub description: String,
    /// Track a learner must belong to
    pub required_strand: Track,
    /// Minimum qualifying GWA
    pub minimum_gwa: GradeAverage,
}

impl NewCourse {
    /// Check text fields
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if self.course_name.trim().is_empty() {
            errors.push("Course name is required".to_string());
        }
        if self.description.trim().is_empty() {
            errors.push("Description is required".to_string());
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
pub struct CourseUpdate {
    /// New display name
    pub course_name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New required track
    pub required_strand: Option<Track>,
    /// New minimum GWA
    pub minimum_gwa: Option<GradeAverage>,
}

impl CourseUpdate {
    /// Check present text fields
    pub fn validate(&self) -> Result<()> {
        if matches!(&self.course_name, Some(name) if name.trim().is_empty()) {
            return Err(StorageError::invalid("Course name cannot be empty"));
        }
        Ok(())
    }
}

/// List filters
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    /// Substring of name or description (case-insensitive)
    pub search: Option<String>,
    /// Exact required track
    pub strand: Option<Track>,
}

/// Recommendation activity for one course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoursePopularity {
    /// Course ID
    pub course_id: CourseId,
    /// Course name
    pub course_name: String,
    /// Required track
    pub required_strand: String,
    /// Recommendations issued for the course
    pub recommendation_count: i64,
    /// Recommendations accepted
    pub accepted_count: i64,
    /// Accepted share in percent, two decimals
    pub acceptance_rate: Option<f64>,
    /// Mean confidence, two decimals
    pub avg_confidence: Option<f64>,
}

/// Catalog overview statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseStats {
    /// Number of courses
    pub total_courses: i64,
    /// Courses per required track
    pub strand_distribution: BTreeMap<String, i64>,
    /// Most recommended courses (up to 10)
    pub popular_courses: Vec<CoursePopularity>,
}

/// Course store for CRUD operations
pub struct CourseStore<'a> {
    storage: &'a mut Storage,
}

impl<'a> CourseStore<'a> {
    /// Create a new course store
    pub fn new(storage: &'a mut Storage) -> Self {
        Self { storage }
    }

    /// Insert a course
    pub fn create(&mut self, course: &NewCourse) -> Result<CourseId> {
        course.validate()?;
        let timestamp = now();
        self.storage.conn().execute(
            "INSERT INTO courses (course_name, description, required_strand, minimum_gwa, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                course.course_name.trim(),
                course.description.trim(),
                course.required_strand.as_str(),
                course.minimum_gwa.value(),
                timestamp,
                timestamp,
            ],
        )?;
        let id = self.storage.conn().last_insert_rowid();
        debug!("Created course {}", id);
        Ok(id)
    }

    /// Get course by ID
    pub fn get(&self, id: CourseId) -> Result<CourseRecord> {
        self.storage
            .conn()
            .query_row(
                &format!("SELECT {} FROM courses WHERE course_id = ?1", COURSE_COLUMNS),
                params![id],
                CourseRecord::from_row,
            )
            .optional()?
            .ok_or(StorageError::not_found("course", id))
    }

    /// Apply a partial update
    pub fn update(&mut self, id: CourseId, update: &CourseUpdate) -> Result<()> {
        update.validate()?;
        let changed = self.storage.conn().execute(
            "UPDATE courses SET
                course_name = COALESCE(?1, course_name),
                description = COALESCE(?2, description),
                required_strand = COALESCE(?3, required_strand),
                minimum_gwa = COALESCE(?4, minimum_gwa),
                updated_at = ?5
             WHERE course_id = ?6",
            params![
                update.course_name.as_deref().map(str::trim),
                update.description.as_deref().map(str::trim),
                update.required_strand.map(|s| s.as_str()),
                update.minimum_gwa.map(|g| g.value()),
                now(),
                id,
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::not_found("course", id));
        }
        Ok(())
    }

    /// Delete a course and, by cascade, its recommendations
    pub fn delete(&mut self, id: CourseId) -> Result<()> {
        let changed = self
            .storage
            .conn()
            .execute("DELETE FROM courses WHERE course_id = ?1", params![id])?;
        if changed == 0 {
            return Err(StorageError::not_found("course", id));
        }
        Ok(())
    }

    /// List courses, newest first
    pub fn list(&self, filter: &CourseFilter, request: PageRequest) -> Result<Page<CourseRecord>> {
        let mut conditions = Conditions::new();
        if let Some(search) = &filter.search {
            conditions.search(&["course_name", "description"], search);
        }
        if let Some(strand) = filter.strand {
            conditions.eq("required_strand", strand.as_str().to_string());
        }
        let where_sql = conditions.where_sql();

        let total: i64 = self.storage.conn().query_row(
            &format!("SELECT COUNT(*) FROM courses{}", where_sql),
            params_from_iter(conditions.values()),
            |row| row.get(0),
        )?;

        let mut stmt = self.storage.conn().prepare(&format!(
            "SELECT {} FROM courses{} ORDER BY created_at DESC, course_id DESC LIMIT ? OFFSET ?",
            COURSE_COLUMNS, where_sql
        ))?;
        let items = stmt
            .query_map(
                params_from_iter(conditions.paged_values(request)),
                CourseRecord::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Page {
            items,
            pagination: Pagination::new(request, total as u64),
        })
    }

    /// All courses requiring a track, ordered by name
    pub fn by_strand(&self, strand: Track) -> Result<Vec<CourseRecord>> {
        let mut stmt = self.storage.conn().prepare(&format!(
            "SELECT {} FROM courses WHERE required_strand = ?1 ORDER BY course_name, course_id",
            COURSE_COLUMNS
        ))?;
        let courses = stmt
            .query_map(params![strand.as_str()], CourseRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(courses)
    }

    /// Overview statistics
    pub fn stats(&self) -> Result<CourseStats> {
        let conn = self.storage.conn();
        let total_courses: i64 =
            conn.query_row("SELECT COUNT(*) FROM courses", [], |row| row.get(0))?;

        let mut stmt =
            conn.prepare("SELECT required_strand, COUNT(*) FROM courses GROUP BY required_strand")?;
        let strand_distribution = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;

        let mut stmt = conn.prepare(
            "SELECT
                c.course_id,
                c.course_name,
                c.required_strand,
                COUNT(r.recommendation_id) AS recommendation_count,
                COUNT(CASE WHEN r.status = 'accepted' THEN 1 END) AS accepted_count,
                ROUND(COUNT(CASE WHEN r.status = 'accepted' THEN 1 END) * 100.0
                      / NULLIF(COUNT(r.recommendation_id), 0), 2) AS acceptance_rate,
                ROUND(AVG(r.confidence_score), 2) AS avg_confidence
             FROM courses c
             LEFT JOIN recommendations r ON c.course_id = r.course_id
             GROUP BY c.course_id
             ORDER BY recommendation_count DESC, c.course_id
             LIMIT 10",
        )?;
        let popular_courses = stmt
            .query_map([], popularity_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(CourseStats {
            total_courses,
            strand_distribution,
            popular_courses,
        })
    }
}

/// Maps the popularity columns shared with the analytics queries
pub(crate) fn popularity_from_row(row: &Row<'_>) -> rusqlite::Result<CoursePopularity> {
    Ok(CoursePopularity {
        course_id: row.get(0)?,
        course_name: row.get(1)?,
        required_strand: row.get(2)?,
        recommendation_count: row.get(3)?,
        accepted_count: row.get(4)?,
        acceptance_rate: row.get(5)?,
        avg_confidence: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_course(name: &str, strand: Track, gwa: f64) -> NewCourse {
        NewCourse {
            course_name: name.to_string(),
            description: format!("{} program", name),
            required_strand: strand,
            minimum_gwa: GradeAverage::new(gwa).unwrap(),
        }
    }

    #[test]
    fn test_course_insert_and_get() {
        let mut storage = Storage::open_in_memory().unwrap();
        let mut store = CourseStore::new(&mut storage);
        let id = store
            .create(&new_course("BS Computer Science", Track::Stem, 85.0))
            .unwrap();

        let course = store.get(id).unwrap();
        assert_eq!(course.course_name, "BS Computer Science");
        let program = course.program();
        assert_eq!(program.id, id);
        assert_eq!(program.minimum_average.value(), 85.0);
    }

    #[test]
    fn test_missing_description_rejected() {
        let mut storage = Storage::open_in_memory().unwrap();
        let mut store = CourseStore::new(&mut storage);
        let mut course = new_course("BS Nursing", Track::Stem, 80.0);
        course.description = "  ".to_string();
        assert!(matches!(
            store.create(&course),
            Err(StorageError::Validation(_))
        ));
    }

    #[test]
    fn test_update_and_delete() {
        let mut storage = Storage::open_in_memory().unwrap();
        let mut store = CourseStore::new(&mut storage);
        let id = store
            .create(&new_course("BS Accountancy", Track::Abm, 85.0))
            .unwrap();

        store
            .update(
                id,
                &CourseUpdate {
                    minimum_gwa: Some(GradeAverage::new(88.0).unwrap()),
                    ..CourseUpdate::default()
                },
            )
            .unwrap();
        let course = store.get(id).unwrap();
        assert_eq!(course.minimum_gwa.value(), 88.0);
        assert_eq!(course.required_strand, Track::Abm);

        store.delete(id).unwrap();
        assert!(matches!(store.get(id), Err(StorageError::NotFound { .. })));
    }

    #[test]
    fn test_by_strand_orders_by_name() {
        let mut storage = Storage::open_in_memory().unwrap();
        let mut store = CourseStore::new(&mut storage);
        store.create(&new_course("BS Nursing", Track::Stem, 80.0)).unwrap();
        store.create(&new_course("BS Biology", Track::Stem, 82.0)).unwrap();
        store.create(&new_course("AB Psychology", Track::Humss, 80.0)).unwrap();

        let names: Vec<String> = store
            .by_strand(Track::Stem)
            .unwrap()
            .into_iter()
            .map(|c| c.course_name)
            .collect();
        assert_eq!(names, vec!["BS Biology", "BS Nursing"]);
    }

    #[test]
    fn test_list_search_matches_description() {
        let mut storage = Storage::open_in_memory().unwrap();
        let mut store = CourseStore::new(&mut storage);
        let mut course = new_course("BS Tourism", Track::Abm, 78.0);
        course.description = "Travel and hospitality".to_string();
        store.create(&course).unwrap();
        store.create(&new_course("BS Marketing", Track::Abm, 80.0)).unwrap();

        let page = store
            .list(
                &CourseFilter {
                    search: Some("hospitality".to_string()),
                    ..CourseFilter::default()
                },
                PageRequest::default(),
            )
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].course_name, "BS Tourism");
    }

    #[test]
    fn test_stats_without_recommendations() {
        let mut storage = Storage::open_in_memory().unwrap();
        let mut store = CourseStore::new(&mut storage);
        store.create(&new_course("BS Nursing", Track::Stem, 80.0)).unwrap();
        store.create(&new_course("BS Marketing", Track::Abm, 80.0)).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_courses, 2);
        assert_eq!(stats.strand_distribution.get("ABM"), Some(&1));
        assert_eq!(stats.popular_courses.len(), 2);
        assert_eq!(stats.popular_courses[0].recommendation_count, 0);
        assert_eq!(stats.popular_courses[0].acceptance_rate, None);
    }
}
