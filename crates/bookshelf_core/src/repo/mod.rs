//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for authors and books.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes call `validate()` before SQL mutations.
//! - Repository APIs return semantic errors (`AuthorNotFound`,
//!   `AuthorHasBooks`, `DuplicateIsbn`) in addition to DB transport errors.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::author::AuthorId;
use crate::model::book::BookId;
use crate::model::validation::ValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod author_repo;
pub mod book_repo;
mod filter;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for catalog persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    AuthorNotFound(AuthorId),
    BookNotFound(BookId),
    /// Author delete refused inside the write transaction.
    AuthorHasBooks {
        author_id: AuthorId,
        book_count: u64,
    },
    /// `books.isbn` UNIQUE constraint rejected the write.
    DuplicateIsbn(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::AuthorNotFound(id) => write!(f, "author not found: {id}"),
            Self::BookNotFound(id) => write!(f, "book not found: {id}"),
            Self::AuthorHasBooks {
                author_id,
                book_count,
            } => write!(f, "author {author_id} is referenced by {book_count} book(s)"),
            Self::DuplicateIsbn(isbn) => write!(f, "duplicate isbn: {isbn}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "catalog repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "catalog repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "catalog repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

const AUTHOR_COLUMNS: [&str; 7] = [
    "id",
    "first_name",
    "last_name",
    "bio",
    "birth_date",
    "created_at",
    "updated_at",
];

const BOOK_COLUMNS: [&str; 8] = [
    "id",
    "title",
    "isbn",
    "published_date",
    "genre",
    "author_id",
    "created_at",
    "updated_at",
];

/// Rejects connections that were not opened through `db::open_db*`.
fn ensure_catalog_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for (table, columns) in [
        ("authors", &AUTHOR_COLUMNS[..]),
        ("books", &BOOK_COLUMNS[..]),
    ] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn author_exists(conn: &Connection, author_id: AuthorId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM authors WHERE id = ?1);",
        [author_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn count_books_for_author(conn: &Connection, author_id: AuthorId) -> RepoResult<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM books WHERE author_id = ?1;",
        [author_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
