//! Book repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, filtered listing and per-author counts over `books`.
//! - Map UNIQUE/foreign-key violations to semantic repository errors.
//!
//! # Invariants
//! - Create/update check the referenced author inside the same `IMMEDIATE`
//!   transaction as the write.
//! - `isbn` is stored verbatim.

use super::filter::WhereClause;
use super::{
    author_exists, count_books_for_author, ensure_catalog_ready, now_epoch_ms, parse_uuid,
    RepoError, RepoResult,
};
use crate::model::author::AuthorId;
use crate::model::book::{Book, BookId, Genre};
use crate::model::validation::{day_bounds_ms, from_epoch_ms, to_epoch_ms};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, ErrorCode, Row, Transaction, TransactionBehavior,
};

const BOOK_SELECT_SQL: &str = "SELECT
    id,
    title,
    isbn,
    published_date,
    genre,
    author_id,
    created_at,
    updated_at
FROM books";

/// Book list filters.
///
/// `title`, `isbn` and `genre` are case-insensitive substrings; `author_id`
/// is exact; `published_on` selects one UTC calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub author_id: Option<AuthorId>,
    pub genre: Option<String>,
    pub published_on: Option<NaiveDate>,
}

/// Filter plus pagination window for book listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookListQuery {
    pub filter: BookFilter,
    pub limit: Option<u32>,
    pub offset: u64,
}

/// Repository interface for book operations.
pub trait BookRepository {
    /// Inserts a book; fails with `AuthorNotFound` or `DuplicateIsbn`.
    fn create_book(&self, book: &Book) -> RepoResult<BookId>;
    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>>;
    fn list_books(&self, query: &BookListQuery) -> RepoResult<Vec<Book>>;
    fn count_books(&self, filter: &BookFilter) -> RepoResult<u64>;
    /// Number of books whose author reference equals `author_id`.
    fn count_books_by_author(&self, author_id: AuthorId) -> RepoResult<u64>;
    fn update_book(&self, book: &Book) -> RepoResult<()>;
    fn delete_book(&self, id: BookId) -> RepoResult<()>;
}

/// SQLite-backed book repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_catalog_ready(conn)?;
        Ok(Self { conn })
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn create_book(&self, book: &Book) -> RepoResult<BookId> {
        book.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !author_exists(&tx, book.author_id)? {
            return Err(RepoError::AuthorNotFound(book.author_id));
        }

        tx.execute(
            "INSERT INTO books (
                id,
                title,
                isbn,
                published_date,
                genre,
                author_id,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                book.id.to_string(),
                book.title.as_str(),
                book.isbn.as_str(),
                book.published_date.as_ref().map(to_epoch_ms),
                book.genre.map(Genre::label),
                book.author_id.to_string(),
                book.created_at,
                book.updated_at,
            ],
        )
        .map_err(|err| map_write_error(err, book))?;

        tx.commit()?;
        Ok(book.id)
    }

    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BOOK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_book_row(row)?));
        }
        Ok(None)
    }

    fn list_books(&self, query: &BookListQuery) -> RepoResult<Vec<Book>> {
        let clause = book_where(&query.filter);
        let mut sql = format!("{BOOK_SELECT_SQL}{}", clause.sql());
        let mut bind_values = clause.values();

        sql.push_str(" ORDER BY created_at ASC, rowid ASC");
        sql.push_str(" LIMIT ? OFFSET ?");
        bind_values.push(Value::Integer(query.limit.map_or(-1, i64::from)));
        bind_values.push(Value::Integer(query.offset as i64));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut books = Vec::new();
        while let Some(row) = rows.next()? {
            books.push(parse_book_row(row)?);
        }
        Ok(books)
    }

    fn count_books(&self, filter: &BookFilter) -> RepoResult<u64> {
        let clause = book_where(filter);
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM books{};", clause.sql()),
            params_from_iter(clause.values()),
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_books_by_author(&self, author_id: AuthorId) -> RepoResult<u64> {
        count_books_for_author(self.conn, author_id)
    }

    fn update_book(&self, book: &Book) -> RepoResult<()> {
        book.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !author_exists(&tx, book.author_id)? {
            return Err(RepoError::AuthorNotFound(book.author_id));
        }

        let changed = tx
            .execute(
                "UPDATE books
                 SET
                    title = ?1,
                    isbn = ?2,
                    published_date = ?3,
                    genre = ?4,
                    author_id = ?5,
                    updated_at = ?6
                 WHERE id = ?7;",
                params![
                    book.title.as_str(),
                    book.isbn.as_str(),
                    book.published_date.as_ref().map(to_epoch_ms),
                    book.genre.map(Genre::label),
                    book.author_id.to_string(),
                    now_epoch_ms(),
                    book.id.to_string(),
                ],
            )
            .map_err(|err| map_write_error(err, book))?;
        if changed == 0 {
            return Err(RepoError::BookNotFound(book.id));
        }

        tx.commit()?;
        Ok(())
    }

    fn delete_book(&self, id: BookId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM books WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::BookNotFound(id));
        }
        Ok(())
    }
}

fn book_where(filter: &BookFilter) -> WhereClause {
    let mut clause = WhereClause::new();
    clause
        .contains("title", filter.title.as_deref())
        .contains("isbn", filter.isbn.as_deref())
        .equals("author_id", filter.author_id.map(|id| id.to_string()))
        .contains("genre", filter.genre.as_deref())
        .within("published_date", filter.published_on.map(day_bounds_ms));
    clause
}

fn map_write_error(err: rusqlite::Error, book: &Book) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            let message = message.as_deref().unwrap_or_default();
            if message.contains("books.isbn") {
                return RepoError::DuplicateIsbn(book.isbn.clone());
            }
            if message.contains("FOREIGN KEY") {
                return RepoError::AuthorNotFound(book.author_id);
            }
        }
    }
    err.into()
}

fn parse_book_row(row: &Row<'_>) -> RepoResult<Book> {
    let id_text: String = row.get("id")?;
    let author_text: String = row.get("author_id")?;

    let published_date = match row.get::<_, Option<i64>>("published_date")? {
        Some(value) => Some(from_epoch_ms(value).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid published_date `{value}` in books.published_date"
            ))
        })?),
        None => None,
    };

    let genre = match row.get::<_, Option<String>>("genre")? {
        Some(value) => Some(value.parse::<Genre>().map_err(|_| {
            RepoError::InvalidData(format!("invalid genre `{value}` in books.genre"))
        })?),
        None => None,
    };

    let book = Book {
        id: parse_uuid(&id_text, "books.id")?,
        title: row.get("title")?,
        isbn: row.get("isbn")?,
        published_date,
        genre,
        author_id: parse_uuid(&author_text, "books.author_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    book.validate()?;
    Ok(book)
}
