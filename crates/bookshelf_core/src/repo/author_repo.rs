//! Author repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and filtered listing over the `authors` table.
//! - Enforce the "no dependent books" rule atomically on delete.
//!
//! # Invariants
//! - Write paths call `Author::validate()` before SQL mutations.
//! - `delete_author` re-counts dependent books inside the same `IMMEDIATE`
//!   transaction as the delete.
//! - List ordering is `created_at ASC, rowid ASC`.

use super::filter::WhereClause;
use super::{
    count_books_for_author, ensure_catalog_ready, now_epoch_ms, parse_uuid, RepoError,
    RepoResult,
};
use crate::model::author::{Author, AuthorId};
use crate::model::validation::{from_epoch_ms, to_epoch_ms};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const AUTHOR_SELECT_SQL: &str = "SELECT
    id,
    first_name,
    last_name,
    bio,
    birth_date,
    created_at,
    updated_at
FROM authors";

/// Author list filters. Name filters are case-insensitive substrings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Filter plus pagination window for author listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorListQuery {
    pub filter: AuthorFilter,
    pub limit: Option<u32>,
    pub offset: u64,
}

/// Repository interface for author operations.
pub trait AuthorRepository {
    fn create_author(&self, author: &Author) -> RepoResult<AuthorId>;
    fn get_author(&self, id: AuthorId) -> RepoResult<Option<Author>>;
    fn list_authors(&self, query: &AuthorListQuery) -> RepoResult<Vec<Author>>;
    fn count_authors(&self, filter: &AuthorFilter) -> RepoResult<u64>;
    fn update_author(&self, author: &Author) -> RepoResult<()>;
    /// Deletes an author with no dependent books.
    ///
    /// Fails with `AuthorHasBooks` when any book references the author at
    /// commit time and `AuthorNotFound` when the row is absent.
    fn delete_author(&self, id: AuthorId) -> RepoResult<()>;
}

/// SQLite-backed author repository.
pub struct SqliteAuthorRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAuthorRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_catalog_ready(conn)?;
        Ok(Self { conn })
    }
}

impl AuthorRepository for SqliteAuthorRepository<'_> {
    fn create_author(&self, author: &Author) -> RepoResult<AuthorId> {
        author.validate()?;

        self.conn.execute(
            "INSERT INTO authors (
                id,
                first_name,
                last_name,
                bio,
                birth_date,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                author.id.to_string(),
                author.first_name.as_str(),
                author.last_name.as_str(),
                author.bio.as_deref(),
                author.birth_date.as_ref().map(to_epoch_ms),
                author.created_at,
                author.updated_at,
            ],
        )?;

        Ok(author.id)
    }

    fn get_author(&self, id: AuthorId) -> RepoResult<Option<Author>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{AUTHOR_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_author_row(row)?));
        }
        Ok(None)
    }

    fn list_authors(&self, query: &AuthorListQuery) -> RepoResult<Vec<Author>> {
        let clause = author_where(&query.filter);
        let mut sql = format!("{AUTHOR_SELECT_SQL}{}", clause.sql());
        let mut bind_values = clause.values();

        sql.push_str(" ORDER BY created_at ASC, rowid ASC");
        sql.push_str(" LIMIT ? OFFSET ?");
        bind_values.push(Value::Integer(query.limit.map_or(-1, i64::from)));
        bind_values.push(Value::Integer(query.offset as i64));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut authors = Vec::new();
        while let Some(row) = rows.next()? {
            authors.push(parse_author_row(row)?);
        }
        Ok(authors)
    }

    fn count_authors(&self, filter: &AuthorFilter) -> RepoResult<u64> {
        let clause = author_where(filter);
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM authors{};", clause.sql()),
            params_from_iter(clause.values()),
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn update_author(&self, author: &Author) -> RepoResult<()> {
        author.validate()?;

        let changed = self.conn.execute(
            "UPDATE authors
             SET
                first_name = ?1,
                last_name = ?2,
                bio = ?3,
                birth_date = ?4,
                updated_at = ?5
             WHERE id = ?6;",
            params![
                author.first_name.as_str(),
                author.last_name.as_str(),
                author.bio.as_deref(),
                author.birth_date.as_ref().map(to_epoch_ms),
                now_epoch_ms(),
                author.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::AuthorNotFound(author.id));
        }
        Ok(())
    }

    fn delete_author(&self, id: AuthorId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let book_count = count_books_for_author(&tx, id)?;
        if book_count > 0 {
            return Err(RepoError::AuthorHasBooks {
                author_id: id,
                book_count,
            });
        }

        let changed = tx.execute("DELETE FROM authors WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::AuthorNotFound(id));
        }

        tx.commit()?;
        Ok(())
    }
}

fn author_where(filter: &AuthorFilter) -> WhereClause {
    let mut clause = WhereClause::new();
    clause
        .contains("first_name", filter.first_name.as_deref())
        .contains("last_name", filter.last_name.as_deref());
    clause
}

fn parse_author_row(row: &Row<'_>) -> RepoResult<Author> {
    let id_text: String = row.get("id")?;
    let birth_date = match row.get::<_, Option<i64>>("birth_date")? {
        Some(value) => Some(from_epoch_ms(value).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid birth_date `{value}` in authors.birth_date"))
        })?),
        None => None,
    };

    let author = Author {
        id: parse_uuid(&id_text, "authors.id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        bio: row.get("bio")?,
        birth_date,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    author.validate()?;
    Ok(author)
}
