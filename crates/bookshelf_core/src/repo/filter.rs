//! Dynamic `WHERE` clause builder for list/count queries.
//!
//! Substring matches go through the catalog `catalog_contains` function,
//! so they fold case for any script and treat `%`/`_` literally.

use crate::db::CONTAINS_FN;
use rusqlite::types::Value;

#[derive(Debug)]
pub(super) struct WhereClause {
    sql: String,
    values: Vec<Value>,
}

impl WhereClause {
    pub(super) fn new() -> Self {
        Self {
            sql: String::from(" WHERE 1 = 1"),
            values: Vec::new(),
        }
    }

    /// Case-insensitive substring match; empty needles are ignored.
    pub(super) fn contains(&mut self, column: &'static str, needle: Option<&str>) -> &mut Self {
        if let Some(needle) = needle.filter(|value| !value.is_empty()) {
            self.sql
                .push_str(&format!(" AND {CONTAINS_FN}({column}, ?)"));
            self.values.push(Value::Text(needle.to_string()));
        }
        self
    }

    pub(super) fn equals(&mut self, column: &'static str, value: Option<String>) -> &mut Self {
        if let Some(value) = value {
            self.sql.push_str(&format!(" AND {column} = ?"));
            self.values.push(Value::Text(value));
        }
        self
    }

    /// Half-open `[start, end)` range.
    pub(super) fn within(&mut self, column: &'static str, bounds: Option<(i64, i64)>) -> &mut Self {
        if let Some((start, end)) = bounds {
            self.sql
                .push_str(&format!(" AND {column} >= ? AND {column} < ?"));
            self.values.push(Value::Integer(start));
            self.values.push(Value::Integer(end));
        }
        self
    }

    pub(super) fn sql(&self) -> &str {
        &self.sql
    }

    pub(super) fn values(&self) -> Vec<Value> {
        self.values.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::WhereClause;
    use rusqlite::types::Value;

    #[test]
    fn needles_bind_verbatim() {
        let mut clause = WhereClause::new();
        clause.contains("last_name", Some("50%_off"));
        assert_eq!(clause.values(), vec![Value::Text("50%_off".to_string())]);
    }

    #[test]
    fn empty_needles_add_no_clause() {
        let mut clause = WhereClause::new();
        clause.contains("title", Some("")).contains("isbn", None);
        assert_eq!(clause.sql(), " WHERE 1 = 1");
        assert!(clause.values().is_empty());
    }

    #[test]
    fn clauses_bind_in_order() {
        let mut clause = WhereClause::new();
        clause
            .contains("title", Some("dune"))
            .within("published_date", Some((10, 20)));
        assert_eq!(
            clause.sql(),
            " WHERE 1 = 1 AND catalog_contains(title, ?) AND published_date >= ? AND published_date < ?"
        );
        assert_eq!(clause.values().len(), 3);
    }
}
