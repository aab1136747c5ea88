//! Catalog SQL functions registered on every connection.
//!
//! # Invariants
//! - `catalog_contains(haystack, needle)` folds both sides with Unicode
//!   lowercase rules; `LIKE` would only fold ASCII.
//! - A NULL haystack never matches.

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

/// SQL name of the case-insensitive substring predicate.
pub(crate) const CONTAINS_FN: &str = "catalog_contains";

pub(super) fn register_catalog_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        CONTAINS_FN,
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let haystack = ctx.get::<Option<String>>(0)?;
            let needle = ctx.get::<String>(1)?;
            Ok(haystack.is_some_and(|value| contains_folded(&value, &needle)))
        },
    )
}

/// Case-insensitive substring test over full Unicode.
pub(crate) fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::{contains_folded, register_catalog_functions, CONTAINS_FN};
    use rusqlite::Connection;

    #[test]
    fn folds_non_ascii_letters() {
        assert!(contains_folded("Émile Zola", "émile"));
        assert!(contains_folded("Ødegård", "ØDEGÅRD"));
        assert!(contains_folded("Καζαντζάκης", "καζαν"));
        assert!(!contains_folded("Jane Smith", "john"));
    }

    #[test]
    fn wildcard_characters_match_literally() {
        assert!(contains_folded("O_Brien", "o_b"));
        assert!(!contains_folded("OxBrien", "o_b"));
        assert!(!contains_folded("anything", "%"));
    }

    #[test]
    fn registered_function_handles_null_and_text() {
        let conn = Connection::open_in_memory().unwrap();
        register_catalog_functions(&conn).unwrap();

        let matched: bool = conn
            .query_row(
                &format!("SELECT {CONTAINS_FN}('Ödön von Horváth', 'HORVÁTH');"),
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(matched);

        let null_case: bool = conn
            .query_row(&format!("SELECT {CONTAINS_FN}(NULL, 'x');"), [], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(!null_case);
    }
}
