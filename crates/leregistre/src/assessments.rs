// Aptitude tests with their ordered questions and options

use std::collections::BTreeMap;

use rusqlite::{params, params_from_iter, OptionalExtension, Row, Transaction};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StorageError};
use crate::filters::Conditions;
use crate::pagination::{Page, PageRequest, Pagination};
use crate::schema::{now, Storage};

/// Test ID
pub type TestId = i64;

/// Question ID
pub type QuestionId = i64;

/// Options every question must offer at minimum
pub const MIN_OPTIONS: usize = 2;

const TEST_COLUMNS: &str = "test_id, test_name, description, created_at, updated_at";

/// Stored test header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    /// Database ID
    pub test_id: TestId,
    /// Display name
    pub test_name: String,
    /// Description
    pub description: Option<String>,
    /// Creation time (unix seconds)
    pub created_at: i64,
    /// Last update time (unix seconds)
    pub updated_at: i64,
}

impl TestRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            test_id: row.get(0)?,
            test_name: row.get(1)?,
            description: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }
}

/// Stored question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Database ID
    pub question_id: QuestionId,
    /// Owning test
    pub test_id: TestId,
    /// Prompt
    pub question_text: String,
    /// Trait the question measures
    pub trait_tag: String,
    /// 1-based position within the test
    pub question_order: i64,
    /// Creation time (unix seconds)
    pub created_at: i64,
}

impl QuestionRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            question_id: row.get(0)?,
            test_id: row.get(1)?,
            question_text: row.get(2)?,
            trait_tag: row.get(3)?,
            question_order: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

/// Stored answer option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionRecord {
    /// Database ID
    pub option_id: i64,
    /// Owning question
    pub question_id: QuestionId,
    /// Answer text
    pub option_text: String,
    /// Weight applied to the question's trait
    pub trait_impact: f64,
    /// 1-based position within the question
    pub option_order: i64,
    /// Creation time (unix seconds)
    pub created_at: i64,
}

impl OptionRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            option_id: row.get(0)?,
            question_id: row.get(1)?,
            option_text: row.get(2)?,
            trait_impact: row.get(3)?,
            option_order: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

/// A question with its options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDetail {
    /// Question row
    #[serde(flatten)]
    pub question: QuestionRecord,
    /// Options in display order
    pub options: Vec<OptionRecord>,
}

/// A test with its full question tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDetail {
    /// Test row
    #[serde(flatten)]
    pub test: TestRecord,
    /// Questions in display order
    pub questions: Vec<QuestionDetail>,
}

/// Input option
#[derive(Debug, Clone, Deserialize)]
pub struct NewOption {
    /// Answer text
    pub option_text: String,
    /// Weight applied to the question's trait
    pub trait_impact: f64,
}

/// Input question
#[derive(Debug, Clone, Deserialize)]
pub struct NewQuestion {
    /// Prompt
    pub question_text: String,
    /// Trait the question measures
    pub trait_tag: String,
    /// Options in display order
    pub options: Vec<NewOption>,
}

impl NewQuestion {
    fn collect_errors(&self, label: &str, errors: &mut Vec<String>) {
        if self.question_text.trim().is_empty() {
            errors.push(format!("{}: question text is required", label));
        }
        if self.trait_tag.trim().is_empty() {
            errors.push(format!("{}: trait tag is required", label));
        }
        if self.options.len() < MIN_OPTIONS {
            errors.push(format!("{}: at least two options are required", label));
        }
        for (i, option) in self.options.iter().enumerate() {
            if option.option_text.trim().is_empty() {
                errors.push(format!("{} option {}: option text is required", label, i + 1));
            }
            if !option.trait_impact.is_finite() {
                errors.push(format!("{} option {}: trait impact must be a number", label, i + 1));
            }
        }
    }

    /// Check the question and its options
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        self.collect_errors("question", &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(StorageError::Validation(errors))
        }
    }
}

/// Input for creating a test with its questions
#[derive(Debug, Clone, Deserialize)]
pub struct NewTest {
    /// Display name
    pub test_name: String,
    /// Description
    pub description: String,
    /// Questions in display order
    pub questions: Vec<NewQuestion>,
}

impl NewTest {
    /// Check the whole tree
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if self.test_name.trim().is_empty() {
            errors.push("Test name is required".to_string());
        }
        if self.description.trim().is_empty() {
            errors.push("Description is required".to_string());
        }
        if self.questions.is_empty() {
            errors.push("At least one question is required".to_string());
        }
        for (i, question) in self.questions.iter().enumerate() {
            question.collect_errors(&format!("question {}", i + 1), &mut errors);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(StorageError::Validation(errors))
        }
    }
}

/// Partial update of a test header
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestUpdate {
    /// New display name
    pub test_name: Option<String>,
    /// New description
    pub description: Option<String>,
}

impl TestUpdate {
    /// Check present fields
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if matches!(&self.test_name, Some(name) if name.trim().is_empty()) {
            errors.push("Test name cannot be empty".to_string());
        }
        if matches!(&self.description, Some(d) if d.trim().is_empty()) {
            errors.push("Description cannot be empty".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(StorageError::Validation(errors))
        }
    }
}

/// Question count for one test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestQuestionCount {
    /// Test ID
    pub test_id: TestId,
    /// Test name
    pub test_name: String,
    /// Number of questions
    pub question_count: i64,
}

/// Test bank statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestStats {
    /// Number of tests
    pub total_tests: i64,
    /// Number of questions across all tests
    pub total_questions: i64,
    /// Questions per trait tag
    pub trait_distribution: BTreeMap<String, i64>,
    /// Questions per test, largest first
    pub question_stats: Vec<TestQuestionCount>,
}

/// Store for tests, questions and options
pub struct AssessmentStore<'a> {
    storage: &'a mut Storage,
}

impl<'a> AssessmentStore<'a> {
    /// Create a new assessment store
    pub fn new(storage: &'a mut Storage) -> Self {
        Self { storage }
    }

    /// Insert a test with its questions and options in one transaction
    pub fn create(&mut self, test: &NewTest) -> Result<TestId> {
        test.validate()?;
        let timestamp = now();
        let tx = self.storage.conn_mut().transaction()?;

        tx.execute(
            "INSERT INTO tests (test_name, description, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
            params![test.test_name.trim(), test.description.trim(), timestamp, timestamp],
        )?;
        let test_id = tx.last_insert_rowid();

        for (i, question) in test.questions.iter().enumerate() {
            insert_question(&tx, test_id, question, i as i64 + 1, timestamp)?;
        }

        tx.commit()?;
        debug!("Created test {} with {} questions", test_id, test.questions.len());
        Ok(test_id)
    }

    /// Get a test header
    pub fn get(&self, id: TestId) -> Result<TestRecord> {
        self.storage
            .conn()
            .query_row(
                &format!("SELECT {} FROM tests WHERE test_id = ?1", TEST_COLUMNS),
                params![id],
                TestRecord::from_row,
            )
            .optional()?
            .ok_or(StorageError::not_found("test", id))
    }

    /// Get a test with its questions and options, both in order
    pub fn detail(&self, id: TestId) -> Result<TestDetail> {
        let test = self.get(id)?;
        let questions = self
            .questions(id)?
            .into_iter()
            .map(|question| {
                let options = self.options(question.question_id)?;
                Ok(QuestionDetail { question, options })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(TestDetail { test, questions })
    }

    /// Apply a partial update to a test header
    pub fn update(&mut self, id: TestId, update: &TestUpdate) -> Result<()> {
        update.validate()?;
        let changed = self.storage.conn().execute(
            "UPDATE tests SET
                test_name = COALESCE(?1, test_name),
                description = COALESCE(?2, description),
                updated_at = ?3
             WHERE test_id = ?4",
            params![
                update.test_name.as_deref().map(str::trim),
                update.description.as_deref().map(str::trim),
                now(),
                id,
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::not_found("test", id));
        }
        Ok(())
    }

    /// Delete a test with its questions and options
    pub fn delete(&mut self, id: TestId) -> Result<()> {
        let changed = self
            .storage
            .conn()
            .execute("DELETE FROM tests WHERE test_id = ?1", params![id])?;
        if changed == 0 {
            return Err(StorageError::not_found("test", id));
        }
        Ok(())
    }

    /// List test headers, newest first
    pub fn list(&self, search: Option<&str>, request: PageRequest) -> Result<Page<TestRecord>> {
        let mut conditions = Conditions::new();
        if let Some(search) = search {
            conditions.search(&["test_name"], search);
        }
        let where_sql = conditions.where_sql();

        let total: i64 = self.storage.conn().query_row(
            &format!("SELECT COUNT(*) FROM tests{}", where_sql),
            params_from_iter(conditions.values()),
            |row| row.get(0),
        )?;

        let mut stmt = self.storage.conn().prepare(&format!(
            "SELECT {} FROM tests{} ORDER BY created_at DESC, test_id DESC LIMIT ? OFFSET ?",
            TEST_COLUMNS, where_sql
        ))?;
        let items = stmt
            .query_map(
                params_from_iter(conditions.paged_values(request)),
                TestRecord::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Page {
            items,
            pagination: Pagination::new(request, total as u64),
        })
    }

    /// Questions of a test in order
    pub fn questions(&self, test_id: TestId) -> Result<Vec<QuestionRecord>> {
        self.ensure_test(test_id)?;
        let mut stmt = self.storage.conn().prepare(
            "SELECT question_id, test_id, question_text, trait_tag, question_order, created_at
             FROM questions WHERE test_id = ?1 ORDER BY question_order, question_id",
        )?;
        let questions = stmt
            .query_map(params![test_id], QuestionRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(questions)
    }

    fn options(&self, question_id: QuestionId) -> Result<Vec<OptionRecord>> {
        let mut stmt = self.storage.conn().prepare(
            "SELECT option_id, question_id, option_text, trait_impact, option_order, created_at
             FROM options WHERE question_id = ?1 ORDER BY option_order, option_id",
        )?;
        let options = stmt
            .query_map(params![question_id], OptionRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(options)
    }

    /// Append a question after the test's current last question
    pub fn add_question(&mut self, test_id: TestId, question: &NewQuestion) -> Result<QuestionId> {
        question.validate()?;
        self.ensure_test(test_id)?;
        let timestamp = now();
        let tx = self.storage.conn_mut().transaction()?;

        let next_order: i64 = tx.query_row(
            "SELECT COALESCE(MAX(question_order), 0) + 1 FROM questions WHERE test_id = ?1",
            params![test_id],
            |row| row.get(0),
        )?;
        let question_id = insert_question(&tx, test_id, question, next_order, timestamp)?;

        tx.commit()?;
        debug!("Added question {} to test {} at position {}", question_id, test_id, next_order);
        Ok(question_id)
    }

    /// Delete a question and its options
    pub fn delete_question(&mut self, question_id: QuestionId) -> Result<()> {
        let changed = self.storage.conn().execute(
            "DELETE FROM questions WHERE question_id = ?1",
            params![question_id],
        )?;
        if changed == 0 {
            return Err(StorageError::not_found("question", question_id));
        }
        Ok(())
    }

    /// Test bank statistics
    pub fn stats(&self) -> Result<TestStats> {
        let conn = self.storage.conn();
        let total_tests: i64 = conn.query_row("SELECT COUNT(*) FROM tests", [], |row| row.get(0))?;
        let total_questions: i64 =
            conn.query_row("SELECT COUNT(*) FROM questions", [], |row| row.get(0))?;

        let mut stmt = conn.prepare("SELECT trait_tag, COUNT(*) FROM questions GROUP BY trait_tag")?;
        let trait_distribution = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;

        let mut stmt = conn.prepare(
            "SELECT t.test_id, t.test_name, COUNT(q.question_id) AS question_count
             FROM tests t
             LEFT JOIN questions q ON t.test_id = q.test_id
             GROUP BY t.test_id
             ORDER BY question_count DESC, t.test_id",
        )?;
        let question_stats = stmt
            .query_map([], |row| {
                Ok(TestQuestionCount {
                    test_id: row.get(0)?,
                    test_name: row.get(1)?,
                    question_count: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(TestStats {
            total_tests,
            total_questions,
            trait_distribution,
            question_stats,
        })
    }

    fn ensure_test(&self, test_id: TestId) -> Result<()> {
        let exists: bool = self.storage.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM tests WHERE test_id = ?1)",
            params![test_id],
            |row| row.get(0),
        )?;
        if exists {
            Ok(())
        } else {
            Err(StorageError::not_found("test", test_id))
        }
    }
}

fn insert_question(
    tx: &Transaction<'_>,
    test_id: TestId,
    question: &NewQuestion,
    order: i64,
    timestamp: i64,
) -> Result<QuestionId> {
    tx.execute(
        "INSERT INTO questions (test_id, question_text, trait_tag, question_order, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            test_id,
            question.question_text.trim(),
            question.trait_tag.trim(),
            order,
            timestamp,
        ],
    )?;
    let question_id = tx.last_insert_rowid();

    let mut stmt = tx.prepare_cached(
        "INSERT INTO options (question_id, option_text, trait_impact, option_order, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (j, option) in question.options.iter().enumerate() {
        stmt.execute(params![
            question_id,
            option.option_text.trim(),
            option.trait_impact,
            j as i64 + 1,
            timestamp,
        ])?;
    }
    Ok(question_id)
}
