// Cross-table analytics for the admin dashboard

use chrono::{Months, Utc};
use rusqlite::{params, Result as SqliteResult};
use serde::{Deserialize, Serialize};

use crate::courses::{popularity_from_row, CoursePopularity};
use crate::schema::Storage;

const SECONDS_PER_DAY: i64 = 86_400;

/// Window for "recent" activity
pub const RECENT_ACTIVITY_DAYS: i64 = 30;

/// Days covered by the activity timeline when none are requested
pub const DEFAULT_TIMELINE_DAYS: u32 = 30;

/// Most entries returned by the activity timeline
pub const TIMELINE_LIMIT: i64 = 50;

/// Confidence at or above which an accepted recommendation counts as top performing
pub const TOP_PERFORMING_CONFIDENCE: f64 = 85.0;

/// Read-only analytics over the register
pub struct Analytics<'a> {
    storage: &'a Storage,
}

/// Row counts per table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTotals {
    /// Users
    pub total_users: i64,
    /// Courses
    pub total_courses: i64,
    /// Tests
    pub total_tests: i64,
    /// Recommendations
    pub total_recommendations: i64,
    /// Questions
    pub total_questions: i64,
}

/// Activity within the recent window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentActivity {
    /// Users created in the last 30 days
    pub new_users_30d: i64,
    /// Recommendations created in the last 30 days
    pub new_recommendations_30d: i64,
}

/// Recommendation outcome counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemPerformance {
    /// All recommendations
    pub total: i64,
    /// Accepted
    pub accepted: i64,
    /// Rejected
    pub rejected: i64,
    /// Pending
    pub pending: i64,
    /// Accepted share in percent; `None` without recommendations
    pub acceptance_rate: Option<f64>,
}

/// System overview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemOverview {
    /// Row counts
    pub system_overview: EntityTotals,
    /// Recent activity
    pub recent_activity: RecentActivity,
    /// Outcome counts
    pub system_performance: SystemPerformance,
}

/// Count per track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrandCount {
    /// Track name
    pub strand: String,
    /// Count
    pub count: i64,
}

/// Users per GWA band
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GwaBucket {
    /// Band label, e.g. `90-94`
    pub gwa_range: String,
    /// Users in the band
    pub count: i64,
}

/// Count per calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCount {
    /// `YYYY-MM`
    pub month: String,
    /// Count
    pub count: i64,
}

/// Learner analytics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAnalytics {
    /// Users per track, largest first
    pub strand_distribution: Vec<StrandCount>,
    /// Users per GWA band, highest band first
    pub gwa_distribution: Vec<GwaBucket>,
    /// Registrations per month over the last 12 months
    pub registration_trend: Vec<MonthCount>,
}

/// Recommendations for one course in one month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseTrend {
    /// `YYYY-MM`
    pub month: String,
    /// Course ID
    pub course_id: i64,
    /// Course name
    pub course_name: String,
    /// Recommendations created that month
    pub recommendations: i64,
}

/// Catalog analytics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseAnalytics {
    /// Top 20 courses by recommendation count
    pub course_popularity: Vec<CoursePopularity>,
    /// Courses per required track
    pub strand_distribution: Vec<StrandCount>,
    /// Per-course monthly recommendations over the last 6 months
    pub recommendation_trends: Vec<CourseTrend>,
}

/// Count per status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    /// Status
    pub status: String,
    /// Count
    pub count: i64,
}

/// Recommendations per confidence band
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceBucket {
    /// Band label, e.g. `80-89%`
    pub confidence_range: String,
    /// Recommendations in the band
    pub count: i64,
}

/// Outcome counts for one month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyOutcome {
    /// `YYYY-MM`
    pub month: String,
    /// All recommendations created that month
    pub total_recommendations: i64,
    /// Accepted
    pub accepted: i64,
    /// Rejected
    pub rejected: i64,
    /// Pending
    pub pending: i64,
}

/// An accepted high-confidence recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopRecommendation {
    /// Recommendation ID
    pub recommendation_id: i64,
    /// Learner name
    pub full_name: String,
    /// Course name
    pub course_name: String,
    /// Confidence score
    pub confidence_score: f64,
    /// Status (always `accepted`)
    pub status: String,
    /// Creation time (unix seconds)
    pub created_at: i64,
}

/// Recommendation analytics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationAnalytics {
    /// Recommendations per status
    pub status_breakdown: Vec<StatusCount>,
    /// Recommendations per confidence band, highest first
    pub confidence_distribution: Vec<ConfidenceBucket>,
    /// Outcomes per month over the last 12 months
    pub monthly_trends: Vec<MonthlyOutcome>,
    /// Up to ten accepted recommendations with confidence of at least 85
    pub top_performing: Vec<TopRecommendation>,
}

/// Question count of one test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestUsage {
    /// Test ID
    pub test_id: i64,
    /// Test name
    pub test_name: String,
    /// Questions in the test
    pub question_count: i64,
    /// Creation time (unix seconds)
    pub created_at: i64,
}

/// Questions measuring one trait
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitCount {
    /// Trait tag
    pub trait_tag: String,
    /// Questions carrying the tag
    pub count: i64,
}

/// Questions grouped by how many options they offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityBucket {
    /// "2 options", "3 options", "4 options" or "5+ options"
    pub complexity_level: String,
    /// Questions in the bucket
    pub question_count: i64,
}

/// Aptitude test analytics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestAnalytics {
    /// Tests by question count, largest first
    pub test_statistics: Vec<TestUsage>,
    /// Questions per trait tag
    pub trait_distribution: Vec<TraitCount>,
    /// Questions per option-count bucket
    pub question_complexity: Vec<ComplexityBucket>,
}

/// One registration or recommendation on the activity timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// `user_registration` or `recommendation_created`
    pub activity_type: String,
    /// Learner name, or "Recommendation for <learner> -> <course>"
    pub description: String,
    /// When it happened (unix seconds)
    pub created_at: i64,
}

/// Recent activity, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityTimeline {
    /// At most [`TIMELINE_LIMIT`] entries
    pub activities: Vec<ActivityEntry>,
    /// Window the entries were drawn from
    pub period_days: u32,
}

impl<'a> Analytics<'a> {
    /// Create a new analytics instance
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Entity totals, recent activity and acceptance rate
    pub fn system_overview(&self) -> SqliteResult<SystemOverview> {
        let conn = self.storage.conn();
        let count = |table: &str| -> SqliteResult<i64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        };
        let system_overview = EntityTotals {
            total_users: count("users")?,
            total_courses: count("courses")?,
            total_tests: count("tests")?,
            total_recommendations: count("recommendations")?,
            total_questions: count("questions")?,
        };

        let cutoff = Utc::now().timestamp() - RECENT_ACTIVITY_DAYS * SECONDS_PER_DAY;
        let recent_activity = RecentActivity {
            new_users_30d: conn.query_row(
                "SELECT COUNT(*) FROM users WHERE created_at >= ?1",
                params![cutoff],
                |row| row.get(0),
            )?,
            new_recommendations_30d: conn.query_row(
                "SELECT COUNT(*) FROM recommendations WHERE created_at >= ?1",
                params![cutoff],
                |row| row.get(0),
            )?,
        };

        let system_performance = conn.query_row(
            "SELECT
                COUNT(*),
                COUNT(CASE WHEN status = 'accepted' THEN 1 END),
                COUNT(CASE WHEN status = 'rejected' THEN 1 END),
                COUNT(CASE WHEN status = 'pending' THEN 1 END),
                ROUND(COUNT(CASE WHEN status = 'accepted' THEN 1 END) * 100.0
                      / NULLIF(COUNT(*), 0), 2)
             FROM recommendations",
            [],
            |row| {
                Ok(SystemPerformance {
                    total: row.get(0)?,
                    accepted: row.get(1)?,
                    rejected: row.get(2)?,
                    pending: row.get(3)?,
                    acceptance_rate: row.get(4)?,
                })
            },
        )?;

        Ok(SystemOverview {
            system_overview,
            recent_activity,
            system_performance,
        })
    }

    /// Track distribution, GWA bands and monthly registrations
    pub fn user_analytics(&self) -> SqliteResult<UserAnalytics> {
        let conn = self.storage.conn();

        let strand_distribution = self.strand_counts("users", "strand")?;

        let mut stmt = conn.prepare(
            "SELECT
                CASE
                    WHEN gwa >= 95 THEN '95-100'
                    WHEN gwa >= 90 THEN '90-94'
                    WHEN gwa >= 85 THEN '85-89'
                    WHEN gwa >= 80 THEN '80-84'
                    ELSE '75-79'
                END AS gwa_range,
                COUNT(*)
             FROM users
             GROUP BY gwa_range
             ORDER BY MIN(gwa) DESC",
        )?;
        let gwa_distribution = stmt
            .query_map([], |row| {
                Ok(GwaBucket {
                    gwa_range: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            "SELECT strftime('%Y-%m', created_at, 'unixepoch') AS month, COUNT(*)
             FROM users
             WHERE created_at >= ?1
             GROUP BY month
             ORDER BY month",
        )?;
        let registration_trend = stmt
            .query_map(params![months_ago(12)], |row| {
                Ok(MonthCount {
                    month: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(UserAnalytics {
            strand_distribution,
            gwa_distribution,
            registration_trend,
        })
    }

    /// Course popularity, track distribution and recent monthly trends
    pub fn course_analytics(&self) -> SqliteResult<CourseAnalytics> {
        let conn = self.storage.conn();

        let mut stmt = conn.prepare(
            "SELECT
                c.course_id,
                c.course_name,
                c.required_strand,
                COUNT(r.recommendation_id) AS recommendation_count,
                COUNT(CASE WHEN r.status = 'accepted' THEN 1 END),
                ROUND(COUNT(CASE WHEN r.status = 'accepted' THEN 1 END) * 100.0
                      / NULLIF(COUNT(r.recommendation_id), 0), 2),
                ROUND(AVG(r.confidence_score), 2)
             FROM courses c
             LEFT JOIN recommendations r ON c.course_id = r.course_id
             GROUP BY c.course_id
             ORDER BY recommendation_count DESC, c.course_id
             LIMIT 20",
        )?;
        let course_popularity = stmt
            .query_map([], popularity_from_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        let strand_distribution = self.strand_counts("courses", "required_strand")?;

        let mut stmt = conn.prepare(
            "SELECT
                strftime('%Y-%m', r.created_at, 'unixepoch') AS month,
                c.course_id,
                c.course_name,
                COUNT(*) AS recommendations
             FROM recommendations r
             JOIN courses c ON r.course_id = c.course_id
             WHERE r.created_at >= ?1
             GROUP BY month, c.course_id
             ORDER BY month, recommendations DESC, c.course_id",
        )?;
        let recommendation_trends = stmt
            .query_map(params![months_ago(6)], |row| {
                Ok(CourseTrend {
                    month: row.get(0)?,
                    course_id: row.get(1)?,
                    course_name: row.get(2)?,
                    recommendations: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(CourseAnalytics {
            course_popularity,
            strand_distribution,
            recommendation_trends,
        })
    }

    /// Status breakdown, confidence bands, monthly outcomes and top performers
    pub fn recommendation_analytics(&self) -> SqliteResult<RecommendationAnalytics> {
        let conn = self.storage.conn();

        let mut stmt = conn.prepare(
            "SELECT status, COUNT(*) FROM recommendations GROUP BY status ORDER BY status",
        )?;
        let status_breakdown = stmt
            .query_map([], |row| {
                Ok(StatusCount {
                    status: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            "SELECT
                CASE
                    WHEN confidence_score >= 90 THEN '90-100%'
                    WHEN confidence_score >= 80 THEN '80-89%'
                    WHEN confidence_score >= 70 THEN '70-79%'
                    WHEN confidence_score >= 60 THEN '60-69%'
                    ELSE 'Below 60%'
                END AS confidence_range,
                COUNT(*)
             FROM recommendations
             GROUP BY confidence_range
             ORDER BY MIN(confidence_score) DESC",
        )?;
        let confidence_distribution = stmt
            .query_map([], |row| {
                Ok(ConfidenceBucket {
                    confidence_range: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            "SELECT
                strftime('%Y-%m', created_at, 'unixepoch') AS month,
                COUNT(*),
                COUNT(CASE WHEN status = 'accepted' THEN 1 END),
                COUNT(CASE WHEN status = 'rejected' THEN 1 END),
                COUNT(CASE WHEN status = 'pending' THEN 1 END)
             FROM recommendations
             WHERE created_at >= ?1
             GROUP BY month
             ORDER BY month",
        )?;
        let monthly_trends = stmt
            .query_map(params![months_ago(12)], |row| {
                Ok(MonthlyOutcome {
                    month: row.get(0)?,
                    total_recommendations: row.get(1)?,
                    accepted: row.get(2)?,
                    rejected: row.get(3)?,
                    pending: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            "SELECT r.recommendation_id, u.full_name, c.course_name, r.confidence_score,
                    r.status, r.created_at
             FROM recommendations r
             JOIN users u ON r.user_id = u.user_id
             JOIN courses c ON r.course_id = c.course_id
             WHERE r.status = 'accepted' AND r.confidence_score >= ?1
             ORDER BY r.confidence_score DESC, r.recommendation_id
             LIMIT 10",
        )?;
        let top_performing = stmt
            .query_map(params![TOP_PERFORMING_CONFIDENCE], |row| {
                Ok(TopRecommendation {
                    recommendation_id: row.get(0)?,
                    full_name: row.get(1)?,
                    course_name: row.get(2)?,
                    confidence_score: row.get(3)?,
                    status: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(RecommendationAnalytics {
            status_breakdown,
            confidence_distribution,
            monthly_trends,
            top_performing,
        })
    }

    /// Question counts per test, trait distribution and option-count buckets
    pub fn test_analytics(&self) -> SqliteResult<TestAnalytics> {
        let conn = self.storage.conn();

        let mut stmt = conn.prepare(
            "SELECT t.test_id, t.test_name, COUNT(q.question_id) AS question_count, t.created_at
             FROM tests t
             LEFT JOIN questions q ON t.test_id = q.test_id
             GROUP BY t.test_id
             ORDER BY question_count DESC, t.test_id",
        )?;
        let test_statistics = stmt
            .query_map([], |row| {
                Ok(TestUsage {
                    test_id: row.get(0)?,
                    test_name: row.get(1)?,
                    question_count: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            "SELECT trait_tag, COUNT(*) AS count FROM questions
             GROUP BY trait_tag ORDER BY count DESC, trait_tag",
        )?;
        let trait_distribution = stmt
            .query_map([], |row| {
                Ok(TraitCount {
                    trait_tag: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            "SELECT
                CASE
                    WHEN option_count <= 2 THEN '2 options'
                    WHEN option_count = 3 THEN '3 options'
                    WHEN option_count = 4 THEN '4 options'
                    ELSE '5+ options'
                END AS complexity_level,
                COUNT(*)
             FROM (
                SELECT q.question_id, COUNT(o.option_id) AS option_count
                FROM questions q
                LEFT JOIN options o ON q.question_id = o.question_id
                GROUP BY q.question_id
             )
             GROUP BY complexity_level
             ORDER BY complexity_level",
        )?;
        let question_complexity = stmt
            .query_map([], |row| {
                Ok(ComplexityBucket {
                    complexity_level: row.get(0)?,
                    question_count: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(TestAnalytics {
            test_statistics,
            trait_distribution,
            question_complexity,
        })
    }

    /// Registrations and generated recommendations from the last `days` days
    pub fn activity_timeline(&self, days: u32) -> SqliteResult<ActivityTimeline> {
        self.activity_timeline_at(Utc::now().timestamp(), days)
    }

    fn activity_timeline_at(&self, now: i64, days: u32) -> SqliteResult<ActivityTimeline> {
        let cutoff = now - i64::from(days) * SECONDS_PER_DAY;
        let mut stmt = self.storage.conn().prepare(
            "SELECT 'user_registration' AS activity_type, full_name AS description, created_at
             FROM users
             WHERE created_at >= ?1
             UNION ALL
             SELECT 'recommendation_created', 'Recommendation for ' || u.full_name || ' -> ' || c.course_name,
                    r.created_at
             FROM recommendations r
             JOIN users u ON r.user_id = u.user_id
             JOIN courses c ON r.course_id = c.course_id
             WHERE r.created_at >= ?1
             ORDER BY created_at DESC
             LIMIT ?2",
        )?;
        let activities = stmt
            .query_map(params![cutoff, TIMELINE_LIMIT], |row| {
                Ok(ActivityEntry {
                    activity_type: row.get(0)?,
                    description: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(ActivityTimeline {
            activities,
            period_days: days,
        })
    }

    fn strand_counts(&self, table: &str, column: &str) -> SqliteResult<Vec<StrandCount>> {
        let mut stmt = self.storage.conn().prepare(&format!(
            "SELECT {column}, COUNT(*) AS count FROM {table} GROUP BY {column} ORDER BY count DESC, {column}"
        ))?;
        let counts = stmt
            .query_map([], |row| {
                Ok(StrandCount {
                    strand: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(counts)
    }
}

/// Unix timestamp `months` calendar months before now
fn months_ago(months: u32) -> i64 {
    let now = Utc::now();
    now.checked_sub_months(Months::new(months))
        .unwrap_or(now)
        .timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::courses::{CourseStore, NewCourse};
    use crate::recommendations::{ManualRecommendation, RecommendationStore};
    use crate::users::{NewUser, UserStore};
    use lemoteur::{ConfidenceScore, GradeAverage, RecommendationStatus, Track};

    fn populated() -> Storage {
        let mut storage = Storage::open_in_memory().unwrap();
        let mut users = UserStore::new(&mut storage);
        let mut user_ids = Vec::new();
        for (i, (strand, gwa)) in [(Track::Stem, 96.0), (Track::Stem, 88.0), (Track::Abm, 77.0)]
            .into_iter()
            .enumerate()
        {
            user_ids.push(
                users
                    .create(&NewUser {
                        full_name: format!("Learner {}", i),
                        email: format!("learner{}@example.com", i),
                        strand,
                        gwa: GradeAverage::new(gwa).unwrap(),
                    })
                    .unwrap(),
            );
        }
        let course_id = CourseStore::new(&mut storage)
            .create(&NewCourse {
                course_name: "BS Physics".to_string(),
                description: "Physics".to_string(),
                required_strand: Track::Stem,
                minimum_gwa: GradeAverage::new(85.0).unwrap(),
            })
            .unwrap();

        let mut recs = RecommendationStore::new(&mut storage);
        for (user_id, score) in [(user_ids[0], 95.0), (user_ids[1], 66.0)] {
            recs.create(&ManualRecommendation {
                user_id,
                course_id,
                confidence_score: ConfidenceScore::new(score).unwrap(),
                reasoning: "eligible".to_string(),
            })
            .unwrap();
        }
        let first = recs.for_user(user_ids[0]).unwrap()[0].record.recommendation_id;
        recs.update_status(first, RecommendationStatus::Accepted).unwrap();
        storage
    }

    #[test]
    fn test_system_overview() {
        let storage = populated();
        let overview = Analytics::new(&storage).system_overview().unwrap();
        assert_eq!(overview.system_overview.total_users, 3);
        assert_eq!(overview.system_overview.total_courses, 1);
        assert_eq!(overview.recent_activity.new_recommendations_30d, 2);
        assert_eq!(overview.system_performance.accepted, 1);
        assert_eq!(overview.system_performance.acceptance_rate, Some(50.0));
    }

    #[test]
    fn test_empty_overview_has_no_rate() {
        let storage = Storage::open_in_memory().unwrap();
        let overview = Analytics::new(&storage).system_overview().unwrap();
        assert_eq!(overview.system_performance.total, 0);
        assert_eq!(overview.system_performance.acceptance_rate, None);
    }

    #[test]
    fn test_user_analytics_buckets() {
        let storage = populated();
        let analytics = Analytics::new(&storage).user_analytics().unwrap();
        assert_eq!(analytics.strand_distribution[0].strand, "STEM");
        assert_eq!(analytics.strand_distribution[0].count, 2);
        let ranges: Vec<&str> = analytics
            .gwa_distribution
            .iter()
            .map(|b| b.gwa_range.as_str())
            .collect();
        assert_eq!(ranges, vec!["95-100", "85-89", "75-79"]);
        assert_eq!(analytics.registration_trend.len(), 1);
        assert_eq!(analytics.registration_trend[0].count, 3);
    }

    #[test]
    fn test_course_analytics() {
        let storage = populated();
        let analytics = Analytics::new(&storage).course_analytics().unwrap();
        let physics = &analytics.course_popularity[0];
        assert_eq!(physics.recommendation_count, 2);
        assert_eq!(physics.acceptance_rate, Some(50.0));
        assert_eq!(physics.avg_confidence, Some(80.5));
        assert_eq!(analytics.recommendation_trends[0].recommendations, 2);
    }

    #[test]
    fn test_recommendation_analytics() {
        let storage = populated();
        let analytics = Analytics::new(&storage).recommendation_analytics().unwrap();
        let ranges: Vec<&str> = analytics
            .confidence_distribution
            .iter()
            .map(|b| b.confidence_range.as_str())
            .collect();
        assert_eq!(ranges, vec!["90-100%", "60-69%"]);
        assert_eq!(analytics.monthly_trends[0].accepted, 1);
        assert_eq!(analytics.monthly_trends[0].pending, 1);
        assert_eq!(analytics.top_performing.len(), 1);
        assert_eq!(analytics.top_performing[0].full_name, "Learner 0");
    }

    #[test]
    fn test_test_analytics() {
        use crate::assessments::{AssessmentStore, NewOption, NewQuestion, NewTest};

        let question = |tag: &str, options: usize| NewQuestion {
            question_text: format!("{} question", tag),
            trait_tag: tag.to_string(),
            options: (0..options)
                .map(|i| NewOption {
                    option_text: format!("Option {}", i),
                    trait_impact: i as f64,
                })
                .collect(),
        };

        let mut storage = Storage::open_in_memory().unwrap();
        let mut store = AssessmentStore::new(&mut storage);
        store
            .create(&NewTest {
                test_name: "Interests".to_string(),
                description: "Work preferences".to_string(),
                questions: vec![question("social", 2), question("analytical", 4)],
            })
            .unwrap();
        store
            .create(&NewTest {
                test_name: "Aptitude".to_string(),
                description: "Reasoning".to_string(),
                questions: vec![
                    question("analytical", 3),
                    question("analytical", 5),
                    question("creative", 6),
                ],
            })
            .unwrap();

        let analytics = Analytics::new(&storage).test_analytics().unwrap();
        let counts: Vec<(&str, i64)> = analytics
            .test_statistics
            .iter()
            .map(|t| (t.test_name.as_str(), t.question_count))
            .collect();
        assert_eq!(counts, vec![("Aptitude", 3), ("Interests", 2)]);
        assert_eq!(
            analytics.trait_distribution[0],
            TraitCount {
                trait_tag: "analytical".to_string(),
                count: 3
            }
        );
        let buckets: Vec<(&str, i64)> = analytics
            .question_complexity
            .iter()
            .map(|b| (b.complexity_level.as_str(), b.question_count))
            .collect();
        assert_eq!(
            buckets,
            vec![("2 options", 1), ("3 options", 1), ("4 options", 1), ("5+ options", 2)]
        );
    }

    fn set_created_at(storage: &Storage, table: &str, column: &str, id: i64, at: i64) {
        storage
            .conn()
            .execute(
                &format!("UPDATE {table} SET created_at = ?1 WHERE {column} = ?2"),
                params![at, id],
            )
            .unwrap();
    }

    #[test]
    fn test_activity_timeline_window() {
        let storage = populated();
        let now = 1_700_000_000;
        let day = SECONDS_PER_DAY;
        // users 1..3, recommendations 1..2
        set_created_at(&storage, "users", "user_id", 1, now - 7 * day);
        set_created_at(&storage, "users", "user_id", 2, now - 7 * day - 1);
        set_created_at(&storage, "users", "user_id", 3, now - day);
        set_created_at(&storage, "recommendations", "recommendation_id", 1, now);
        set_created_at(&storage, "recommendations", "recommendation_id", 2, now - 30 * day);

        let timeline = Analytics::new(&storage).activity_timeline_at(now, 7).unwrap();
        assert_eq!(timeline.period_days, 7);
        let entries: Vec<(&str, i64)> = timeline
            .activities
            .iter()
            .map(|a| (a.activity_type.as_str(), a.created_at))
            .collect();
        assert_eq!(
            entries,
            vec![
                ("recommendation_created", now),
                ("user_registration", now - day),
                ("user_registration", now - 7 * day),
            ]
        );
        assert_eq!(
            timeline.activities[0].description,
            "Recommendation for Learner 0 -> BS Physics"
        );
    }

    #[test]
    fn test_activity_timeline_is_capped() {
        let mut storage = Storage::open_in_memory().unwrap();
        let mut users = UserStore::new(&mut storage);
        for i in 0..60 {
            users
                .create(&NewUser {
                    full_name: format!("Learner {}", i),
                    email: format!("cap{}@example.com", i),
                    strand: Track::Tvl,
                    gwa: GradeAverage::new(80.0).unwrap(),
                })
                .unwrap();
        }

        let timeline = Analytics::new(&storage)
            .activity_timeline(DEFAULT_TIMELINE_DAYS)
            .unwrap();
        assert_eq!(timeline.activities.len(), TIMELINE_LIMIT as usize);
    }
}
