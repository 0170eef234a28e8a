// WHERE-clause builder for filtered list queries

use rusqlite::types::Value;

use crate::pagination::PageRequest;

/// Accumulates AND-ed conditions with their positional parameters.
#[derive(Debug, Default)]
pub(crate) struct Conditions {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl Conditions {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// `column = ?`
    pub(crate) fn eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.clauses.push(format!("{} = ?", column));
        self.values.push(value.into());
        self
    }

    /// `(a LIKE ? OR b LIKE ?)` with `%term%`; blank terms are ignored.
    /// Wildcards in `term` match literally.
    pub(crate) fn search(&mut self, columns: &[&str], term: &str) -> &mut Self {
        let term = term.trim();
        if term.is_empty() || columns.is_empty() {
            return self;
        }
        let pattern = format!("%{}%", escape_like(term));
        let ors: Vec<String> = columns
            .iter()
            .map(|c| format!("{} LIKE ? ESCAPE '\\'", c))
            .collect();
        self.clauses.push(format!("({})", ors.join(" OR ")));
        for _ in columns {
            self.values.push(Value::Text(pattern.clone()));
        }
        self
    }

    /// ` WHERE ...` or an empty string
    pub(crate) fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    /// Parameters for the count query
    pub(crate) fn values(&self) -> &[Value] {
        &self.values
    }

    /// Parameters for the page query (`LIMIT ? OFFSET ?` appended)
    pub(crate) fn paged_values(&self, request: PageRequest) -> Vec<Value> {
        let mut values = self.values.clone();
        values.push(Value::Integer(i64::from(request.limit())));
        values.push(Value::Integer(request.offset() as i64));
        values
    }
}

/// Escape `\`, `%` and `_` for a `LIKE ... ESCAPE '\'` pattern
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_conditions() {
        let conditions = Conditions::new();
        assert_eq!(conditions.where_sql(), "");
        assert!(conditions.values().is_empty());
    }

    #[test]
    fn test_search_and_eq() {
        let mut conditions = Conditions::new();
        conditions
            .search(&["full_name", "email"], " ana ")
            .eq("strand", "STEM".to_string());
        assert_eq!(
            conditions.where_sql(),
            " WHERE (full_name LIKE ? ESCAPE '\\' OR email LIKE ? ESCAPE '\\') AND strand = ?"
        );
        assert_eq!(conditions.values().len(), 3);
        assert_eq!(conditions.values()[0], Value::Text("%ana%".to_string()));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let mut conditions = Conditions::new();
        conditions.search(&["course_name"], "   ");
        assert_eq!(conditions.where_sql(), "");
    }

    #[test]
    fn test_search_escapes_wildcards() {
        let mut conditions = Conditions::new();
        conditions.search(&["email"], r"50%_off\");
        assert_eq!(
            conditions.values()[0],
            Value::Text(r"%50\%\_off\\%".to_string())
        );
    }

    #[test]
    fn test_escaped_pattern_matches_literally() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let mut conditions = Conditions::new();
        conditions.search(&["name"], "a_c");
        let sql = format!(
            "SELECT COUNT(*) FROM (SELECT 'abc' AS name UNION ALL SELECT 'a_c'){}",
            conditions.where_sql()
        );
        let count: i64 = conn
            .query_row(&sql, rusqlite::params_from_iter(conditions.values()), |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);
    }
}
